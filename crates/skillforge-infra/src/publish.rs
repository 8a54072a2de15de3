//! Writing generated skills to disk.
//!
//! Layout:
//! ```text
//! {skills_root}/{skill-name}/
//!   SKILL.md
//!   README.md              (optional)
//!   examples/examples.md   (optional)
//! ```

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, bail};

use skillforge_types::config::OutputConfig;
use skillforge_types::skill::{OutputLocation, SKILL_FILE, SkillSummary};

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(trimmed));
    }
    match (trimmed.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(trimmed),
    }
}

/// Directory that receives skill folders for `location`.
pub fn skills_root(location: &OutputLocation, output: &OutputConfig) -> PathBuf {
    match location {
        OutputLocation::Personal => expand_home(&output.personal_path),
        OutputLocation::Project => PathBuf::from(&output.project_path),
        OutputLocation::Custom(path) => expand_home(&path.to_string_lossy()),
    }
}

/// `root/<name>`, rejecting names that are not a single path component.
pub fn skill_dir(root: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(name)),
        _ => bail!("skill name '{name}' cannot be used as a directory name"),
    }
}

/// Write `content` to `dir/SKILL.md`.
///
/// The file is written to a temporary file in `dir` and renamed into place,
/// so an interrupted write never leaves a partial SKILL.md.
pub fn write_skill_file(dir: &Path, content: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create skill directory: {}", dir.display()))?;

    let path = dir.join(SKILL_FILE);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .context("Failed to write skill content")?;
    tmp.persist(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), "Skill written");
    Ok(path)
}

/// Create `README.md` and `examples/examples.md` next to SKILL.md.
pub fn write_supporting_files(dir: &Path, skill: &SkillSummary) -> anyhow::Result<Vec<PathBuf>> {
    let readme = dir.join("README.md");
    std::fs::write(&readme, render_readme(skill))
        .with_context(|| format!("Failed to write {}", readme.display()))?;

    let examples_dir = dir.join("examples");
    std::fs::create_dir_all(&examples_dir)
        .with_context(|| format!("Failed to create {}", examples_dir.display()))?;
    let examples = examples_dir.join("examples.md");
    std::fs::write(&examples, render_examples(&skill.name))
        .with_context(|| format!("Failed to write {}", examples.display()))?;

    Ok(vec![readme, examples])
}

fn render_readme(skill: &SkillSummary) -> String {
    let name = &skill.name;
    let description = skill.description.trim();
    let shown = if description.is_empty() {
        "No description provided"
    } else {
        description
    };

    let mut readme = format!(
        "# {name}\n\n\
         {shown}\n\n\
         ## Usage\n\n\
         This skill is automatically discovered by Claude when relevant to your conversation.\n\n\
         To test it, ask Claude to perform tasks related to: {description}\n\n\
         ## Files\n\n\
         - `SKILL.md` - Main skill file with instructions\n\n\
         ## Configuration\n\n\
         - **Name**: {name}\n\
         - **Description**: {description}\n"
    );
    if let Some(tools) = &skill.allowed_tools {
        readme.push_str(&format!("- **Allowed Tools**: {tools}\n"));
    }
    readme
}

fn render_examples(name: &str) -> String {
    format!(
        "# Examples for {name}\n\n\
         Add example usage scenarios here to help users understand how to use this skill.\n\n\
         ## Example 1\n\n\
         [Describe a scenario]\n\n\
         ## Example 2\n\n\
         [Describe another scenario]\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(dir: &Path) -> SkillSummary {
        SkillSummary {
            name: "commit-linter".to_string(),
            path: dir.to_path_buf(),
            description: "Lints commit messages before pushing".to_string(),
            user_invocable: true,
            allowed_tools: Some("Bash, Read".to_string()),
        }
    }

    #[test]
    fn skills_root_per_location() {
        let output = OutputConfig::default();
        assert_eq!(
            skills_root(&OutputLocation::Project, &output),
            PathBuf::from(".claude/skills")
        );
        assert_eq!(
            skills_root(&OutputLocation::Custom(PathBuf::from("/srv/skills")), &output),
            PathBuf::from("/srv/skills")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                skills_root(&OutputLocation::Personal, &output),
                home.join(".claude/skills")
            );
        }
    }

    #[test]
    fn expand_home_leaves_other_paths() {
        assert_eq!(expand_home("relative/dir"), PathBuf::from("relative/dir"));
        assert_eq!(expand_home("/abs/~/dir"), PathBuf::from("/abs/~/dir"));
    }

    #[test]
    fn skill_dir_rejects_paths() {
        let root = Path::new("/skills");
        assert_eq!(skill_dir(root, "my-skill").unwrap(), root.join("my-skill"));
        assert!(skill_dir(root, "../up").is_err());
        assert!(skill_dir(root, "a/b").is_err());
        assert!(skill_dir(root, "").is_err());
    }

    #[test]
    fn write_skill_file_creates_and_replaces() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("commit-linter");

        let path = write_skill_file(&dir, "first").unwrap();
        assert_eq!(path, dir.join(SKILL_FILE));
        write_skill_file(&dir, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let entries = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 1, "temporary file left behind");
    }

    #[test]
    fn supporting_files_render_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let files = write_supporting_files(tmp.path(), &summary(tmp.path())).unwrap();
        assert_eq!(files.len(), 2);

        let readme = std::fs::read_to_string(tmp.path().join("README.md")).unwrap();
        assert!(readme.starts_with("# commit-linter\n\nLints commit messages"));
        assert!(readme.contains("- **Allowed Tools**: Bash, Read"));

        let examples =
            std::fs::read_to_string(tmp.path().join("examples").join("examples.md")).unwrap();
        assert!(examples.starts_with("# Examples for commit-linter"));
    }
}
