//! Skill directory and output location types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// File name of a skill definition inside its directory.
pub const SKILL_FILE: &str = "SKILL.md";

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// A skill directory found on disk (a folder containing `SKILL.md`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSummary {
    /// Declared `name`, or the directory name when the frontmatter has none.
    pub name: String,
    pub path: PathBuf,
    pub description: String,
    pub user_invocable: bool,
    /// `allowed-tools` rendered as a comma-separated list.
    pub allowed_tools: Option<String>,
}

impl SkillSummary {
    /// Single-line label for pickers: name plus a shortened description.
    pub fn display(&self) -> String {
        let desc = self.description.trim().replace('\n', " ");
        if desc.is_empty() {
            return self.name.clone();
        }
        let short = if desc.chars().count() > 80 {
            let cut: String = desc.chars().take(77).collect();
            format!("{cut}...")
        } else {
            desc
        };
        format!("{} - {short}", self.name)
    }
}

// ---------------------------------------------------------------------------
// Output location
// ---------------------------------------------------------------------------

/// Where a generated skill is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLocation {
    /// The user's personal skills directory (`[output] personal_path`).
    Personal,
    /// The current project's skills directory (`[output] project_path`).
    Project,
    /// An explicit directory.
    Custom(PathBuf),
}

impl fmt::Display for OutputLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputLocation::Personal => write!(f, "personal"),
            OutputLocation::Project => write!(f, "project"),
            OutputLocation::Custom(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for OutputLocation {
    type Err = String;

    /// `personal` and `project` are keywords; anything else is a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("output location cannot be empty".to_string()),
            "personal" => Ok(OutputLocation::Personal),
            "project" => Ok(OutputLocation::Project),
            other => Ok(OutputLocation::Custom(PathBuf::from(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(description: &str) -> SkillSummary {
        SkillSummary {
            name: "commit-helper".to_string(),
            path: PathBuf::from("/tmp/commit-helper"),
            description: description.to_string(),
            user_invocable: true,
            allowed_tools: None,
        }
    }

    #[test]
    fn test_display_without_description() {
        assert_eq!(summary("  ").display(), "commit-helper");
    }

    #[test]
    fn test_display_truncates_long_description() {
        let s = summary(&"x".repeat(100));
        let label = s.display();
        assert!(label.ends_with("..."));
        assert_eq!(label.len(), "commit-helper - ".len() + 80);
    }

    #[test]
    fn test_output_location_parse() {
        assert_eq!("personal".parse::<OutputLocation>().unwrap(), OutputLocation::Personal);
        assert_eq!("project".parse::<OutputLocation>().unwrap(), OutputLocation::Project);
        assert_eq!(
            "./out".parse::<OutputLocation>().unwrap(),
            OutputLocation::Custom(PathBuf::from("./out"))
        );
        assert!("".parse::<OutputLocation>().is_err());
    }
}
