//! Filesystem skill discovery and import.
//!
//! A skills directory holds one folder per skill, each containing
//! `SKILL.md`. Imports copy a whole skill folder (supporting files included)
//! into a staging directory next to the destination and only then swap it
//! into place.

use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, bail};
use serde_yaml_ng::Value;
use walkdir::WalkDir;

use skillforge_core::validator::read_frontmatter;
use skillforge_types::skill::{SKILL_FILE, SkillSummary};

/// Result of importing one skill into one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Copied to the contained path.
    Imported(PathBuf),
    /// The destination existed and the overwrite was declined.
    Skipped(PathBuf),
}

/// List the skills in `dir`, sorted case-insensitively by folder name.
///
/// A missing directory yields an empty list. Unreadable skill files are
/// skipped with a warning.
pub fn discover_skills(dir: &Path) -> anyhow::Result<Vec<SkillSummary>> {
    let mut folders = list_subdirs(dir)?;
    folders.retain(|path| path.join(SKILL_FILE).is_file());

    let mut skills = Vec::with_capacity(folders.len());
    for folder in folders {
        let skill_file = folder.join(SKILL_FILE);
        match std::fs::read_to_string(&skill_file) {
            Ok(content) => skills.push(summarize(&folder, &content)),
            Err(e) => {
                tracing::warn!(path = %skill_file.display(), error = %e, "Skipping unreadable skill");
            }
        }
    }
    Ok(skills)
}

/// Non-hidden direct subdirectories of `root`, sorted case-insensitively.
pub fn discover_projects(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut projects = list_subdirs(root)?;
    projects.retain(|path| !folder_name(path).starts_with('.'));
    Ok(projects)
}

/// Build a [`SkillSummary`] from a skill folder and its `SKILL.md` content.
pub fn summarize(folder: &Path, content: &str) -> SkillSummary {
    let fm = read_frontmatter(content).unwrap_or_default();
    let text = |key: &str| {
        fm.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let allowed_tools = match fm.get("allowed-tools") {
        Some(Value::Sequence(items)) => Some(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Some(Value::String(s)) => Some(s.trim().to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty());

    SkillSummary {
        name: text("name").unwrap_or_else(|| folder_name(folder)),
        path: folder.to_path_buf(),
        description: text("description").unwrap_or_default(),
        user_invocable: fm
            .get("user-invocable")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        allowed_tools,
    }
}

/// Copy `skill` into `dest_root/<name>`.
///
/// When the destination already exists `confirm_overwrite` decides; a
/// declined overwrite leaves it untouched.
pub fn import_skill(
    skill: &SkillSummary,
    dest_root: &Path,
    mut confirm_overwrite: impl FnMut(&Path) -> io::Result<bool>,
) -> anyhow::Result<ImportOutcome> {
    let dest = dest_root.join(dest_folder_name(skill));

    if same_dir(&skill.path, &dest) {
        bail!(
            "'{}' is already located at {}",
            skill.name,
            dest.display()
        );
    }

    let exists = dest.exists();
    if exists && !confirm_overwrite(&dest)? {
        tracing::info!(skill = %skill.name, dest = %dest.display(), "Import skipped");
        return Ok(ImportOutcome::Skipped(dest));
    }

    std::fs::create_dir_all(dest_root)
        .with_context(|| format!("Failed to create {}", dest_root.display()))?;

    let staging = dest_root.join(format!(".{}.importing", dest_folder_name(skill)));
    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear {}", staging.display()))?;
    }
    if let Err(e) = copy_tree(&skill.path, &staging) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }

    if exists {
        std::fs::remove_dir_all(&dest)
            .with_context(|| format!("Failed to remove {}", dest.display()))?;
    }
    std::fs::rename(&staging, &dest)
        .with_context(|| format!("Failed to move {} into place", dest.display()))?;

    tracing::info!(skill = %skill.name, dest = %dest.display(), "Skill imported");
    Ok(ImportOutcome::Imported(dest))
}

/// Recursively copy `src` to `dst`. `dst` must not exist.
fn copy_tree(src: &Path, dst: &Path) -> anyhow::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .context("walkdir yielded a path outside the source")?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

fn list_subdirs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort_by_key(|p| folder_name(p).to_lowercase());
    Ok(dirs)
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The declared name when it is a single plain path component, else the
/// source folder's name.
fn dest_folder_name(skill: &SkillSummary) -> String {
    let mut components = Path::new(&skill.name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => skill.name.clone(),
        _ => folder_name(&skill.path),
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn write_skill(root: &Path, folder: &str, content: &str) -> PathBuf {
        let dir = root.join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SKILL_FILE), content).unwrap();
        dir
    }

    const LINTER: &str = "---\nname: commit-linter\ndescription: Lints commit messages before pushing\nallowed-tools:\n  - Bash\n  - Read\nuser-invocable: false\n---\n# Commit linter\n";

    #[test]
    fn discover_skills_reads_frontmatter() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "zeta", LINTER);
        write_skill(tmp.path(), "Alpha", "no frontmatter here");
        std::fs::create_dir_all(tmp.path().join("not-a-skill")).unwrap();

        let skills = discover_skills(tmp.path()).unwrap();
        assert_eq!(skills.len(), 2);

        assert_eq!(skills[0].name, "Alpha");
        assert_eq!(skills[0].description, "");
        assert!(skills[0].user_invocable);

        assert_eq!(skills[1].name, "commit-linter");
        assert_eq!(skills[1].allowed_tools.as_deref(), Some("Bash, Read"));
        assert!(!skills[1].user_invocable);
    }

    #[test]
    fn discover_skills_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover_skills(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn discover_projects_skips_hidden_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["web", ".git", "Api"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();

        let names: Vec<String> = discover_projects(tmp.path())
            .unwrap()
            .iter()
            .map(|p| folder_name(p))
            .collect();
        assert_eq!(names, vec!["Api", "web"]);
    }

    #[test]
    fn import_copies_supporting_files() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let dir = write_skill(src.path(), "linter", LINTER);
        std::fs::create_dir_all(dir.join("examples")).unwrap();
        std::fs::write(dir.join("examples/examples.md"), "# Examples").unwrap();

        let skill = summarize(&dir, LINTER);
        let dest_root = dst.path().join(".claude/skills");
        let outcome = import_skill(&skill, &dest_root, |_| Ok(true)).unwrap();

        let dest = dest_root.join("commit-linter");
        assert_eq!(outcome, ImportOutcome::Imported(dest.clone()));
        assert!(dest.join(SKILL_FILE).is_file());
        assert!(dest.join("examples/examples.md").is_file());
        assert!(!dest_root.join(".commit-linter.importing").exists());
    }

    #[test]
    fn import_existing_asks_before_overwrite() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let dir = write_skill(src.path(), "linter", LINTER);
        let skill = summarize(&dir, LINTER);
        write_skill(dst.path(), "commit-linter", "old");
        std::fs::write(dst.path().join("commit-linter/stale.txt"), "stale").unwrap();

        let asked = Cell::new(0);
        let outcome = import_skill(&skill, dst.path(), |_| {
            asked.set(asked.get() + 1);
            Ok(false)
        })
        .unwrap();
        assert!(matches!(outcome, ImportOutcome::Skipped(_)));
        assert_eq!(asked.get(), 1);
        assert_eq!(
            std::fs::read_to_string(dst.path().join("commit-linter").join(SKILL_FILE)).unwrap(),
            "old"
        );

        import_skill(&skill, dst.path(), |_| Ok(true)).unwrap();
        let dest = dst.path().join("commit-linter");
        assert_eq!(std::fs::read_to_string(dest.join(SKILL_FILE)).unwrap(), LINTER);
        assert!(!dest.join("stale.txt").exists());
    }

    #[test]
    fn import_onto_itself_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill(tmp.path(), "commit-linter", LINTER);
        let skill = summarize(&dir, LINTER);
        assert!(import_skill(&skill, tmp.path(), |_| Ok(true)).is_err());
        assert!(dir.join(SKILL_FILE).is_file());
    }

    #[test]
    fn unsafe_names_fall_back_to_folder() {
        let skill = summarize(Path::new("/tmp/skills/real"), "---\nname: ../escape\n---\n");
        assert_eq!(dest_folder_name(&skill), "real");
    }
}
