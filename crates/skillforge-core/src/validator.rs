//! SKILL.md validation.
//!
//! A skill file is a `---` line, a YAML mapping, a second `---` line, then a
//! markdown body. Structural problems (no opening delimiter, no closing
//! delimiter, unparseable YAML) short-circuit with a single error; once the
//! frontmatter parses, every field and body rule runs and all failures are
//! reported together.

use regex::Regex;
use serde_yaml_ng::{Mapping, Value};
use std::sync::LazyLock;

use skillforge_types::error::ConfigError;
use skillforge_types::validation::{ValidationResult, ValidationRules};

const DELIMITER: &str = "---";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+\S").expect("valid regex"));

/// Split a skill file into its frontmatter and body.
///
/// The opening delimiter is the first line; the frontmatter ends at the next
/// line that is exactly `---` (trailing whitespace ignored).
pub fn split_frontmatter(content: &str) -> Result<(&str, &str), String> {
    if !content.starts_with(DELIMITER) {
        return Err("File must start with YAML frontmatter (---)".to_string());
    }

    let after_open = match content.find('\n') {
        Some(pos) => &content[pos + 1..],
        None => "",
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err("Failed to parse frontmatter: missing closing delimiter (---)".to_string())
}

/// Parse frontmatter YAML into a mapping.
fn parse_mapping(yaml: &str) -> Result<Mapping, String> {
    match serde_yaml_ng::from_str::<Value>(yaml) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(_) => Err("Failed to parse frontmatter: expected a key/value mapping".to_string()),
        Err(e) => Err(format!("Failed to parse frontmatter: {e}")),
    }
}

/// Parsed frontmatter of a skill file, or `None` if it has none or it does
/// not parse to a mapping.
pub fn read_frontmatter(content: &str) -> Option<Mapping> {
    let (yaml, _) = split_frontmatter(content).ok()?;
    parse_mapping(yaml).ok()
}

/// Validates generated skill files against a configurable rule set.
#[derive(Debug, Clone)]
pub struct SkillValidator {
    rules: ValidationRules,
    name_pattern: Regex,
}

impl SkillValidator {
    /// Build a validator. Fails if the configured name pattern is not a
    /// valid regular expression.
    pub fn new(rules: ValidationRules) -> Result<Self, ConfigError> {
        let name_pattern =
            Regex::new(&rules.name_pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: rules.name_pattern.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            rules,
            name_pattern,
        })
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Validate a complete skill file.
    pub fn validate(&self, content: &str) -> ValidationResult {
        let (yaml, body) = match split_frontmatter(content) {
            Ok(parts) => parts,
            Err(e) => return ValidationResult::from_errors(vec![e]),
        };

        let frontmatter = match parse_mapping(yaml) {
            Ok(map) => map,
            Err(e) => return ValidationResult::from_errors(vec![e]),
        };

        let mut errors = self.check_frontmatter(&frontmatter);
        errors.extend(self.check_body(body));
        ValidationResult::from_errors(errors)
    }

    /// See [`read_frontmatter`].
    pub fn frontmatter(&self, content: &str) -> Option<Mapping> {
        read_frontmatter(content)
    }

    /// The declared `name`, independent of full validation.
    pub fn skill_name(&self, content: &str) -> Option<String> {
        self.frontmatter(content)?
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    fn check_frontmatter(&self, fm: &Mapping) -> Vec<String> {
        let mut errors = Vec::new();
        let rules = &self.rules;

        match fm.get("name") {
            None => errors.push("Missing required field: 'name'".to_string()),
            Some(Value::String(name)) => {
                if name.chars().count() > rules.max_name_length {
                    errors.push(format!(
                        "Name exceeds maximum length of {} characters",
                        rules.max_name_length
                    ));
                }
                if !self.name_pattern.is_match(name) {
                    errors.push(format!(
                        "Name must contain only lowercase letters, numbers, and hyphens. Got: '{name}'"
                    ));
                }
            }
            Some(_) => errors.push("'name' must be a string".to_string()),
        }

        match fm.get("description") {
            None => errors.push("Missing required field: 'description'".to_string()),
            Some(Value::String(description)) => {
                let len = description.chars().count();
                if len < rules.min_description_length {
                    errors.push(format!(
                        "Description too short (minimum {} characters). A good description helps Claude know when to use the skill.",
                        rules.min_description_length
                    ));
                }
                if len > rules.max_description_length {
                    errors.push(format!(
                        "Description exceeds maximum length of {} characters",
                        rules.max_description_length
                    ));
                }
            }
            Some(_) => errors.push("'description' must be a string".to_string()),
        }

        if let Some(tools) = fm.get("allowed-tools") {
            let ok = match tools {
                Value::String(_) => true,
                Value::Sequence(items) => items.iter().all(Value::is_string),
                _ => false,
            };
            if !ok {
                errors.push("'allowed-tools' must be a string or list".to_string());
            }
        }

        if let Some(context) = fm.get("context") {
            if context.as_str() != Some("fork") {
                errors.push("'context' must be 'fork' if specified".to_string());
            }
        }

        if let Some(invocable) = fm.get("user-invocable") {
            if !invocable.is_bool() {
                errors.push("'user-invocable' must be a boolean (true/false)".to_string());
            }
        }

        errors
    }

    fn check_body(&self, body: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let body = body.trim();

        if body.chars().count() < self.rules.min_body_length {
            errors.push(
                "Markdown content is too short. Skills should include clear instructions and examples."
                    .to_string(),
            );
        }
        if !HEADING_RE.is_match(body) {
            errors.push(
                "Markdown should include at least one heading to structure the content".to_string(),
            );
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "# Commit Helper\n\nUse this skill to write conventional commit messages for staged changes.\n";

    fn validator() -> SkillValidator {
        SkillValidator::new(ValidationRules::default()).unwrap()
    }

    fn skill(frontmatter: &str, body: &str) -> String {
        format!("---\n{frontmatter}\n---\n{body}")
    }

    #[test]
    fn test_valid_skill_has_no_errors() {
        let content = skill(
            "name: commit-helper\ndescription: Writes conventional commit messages from staged diffs\nallowed-tools:\n  - Bash\n  - Read\ncontext: fork\nuser-invocable: true",
            BODY,
        );
        let result = validator().validate(&content);
        assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_folded_description_is_accepted() {
        let content = skill(
            "name: commit-helper\ndescription: >\n  Writes conventional commit messages\n  from staged diffs.",
            BODY,
        );
        assert!(validator().validate(&content).is_valid);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let content = skill("name: a_b\ndescription: short", "tiny");
        let v = validator();
        assert_eq!(v.validate(&content), v.validate(&content));
    }

    #[test]
    fn test_missing_opening_delimiter_is_single_error() {
        let result = validator().validate("name: x\n---\n# Body");
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["File must start with YAML frontmatter (---)"]);
    }

    #[test]
    fn test_missing_closing_delimiter_is_single_error() {
        let result = validator().validate("---\nname: x\ndescription: y\n# Body");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Failed to parse frontmatter"));
    }

    #[test]
    fn test_unparseable_yaml_is_single_error() {
        let content = skill("name: [unclosed\ndescription: x", "");
        let result = validator().validate(&content);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Failed to parse frontmatter"));
    }

    #[test]
    fn test_non_mapping_frontmatter_is_single_error() {
        let content = skill("- just\n- a list", BODY);
        let result = validator().validate(&content);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("mapping"));
    }

    #[test]
    fn test_bad_name_and_short_description() {
        let content = skill("name: a_b\ndescription: short", BODY);
        let result = validator().validate(&content);
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
        assert_eq!(
            result.errors[0],
            "Name must contain only lowercase letters, numbers, and hyphens. Got: 'a_b'"
        );
        assert!(result.errors[1].starts_with("Description too short (minimum 20 characters)"));
    }

    #[test]
    fn test_name_length_boundary() {
        let v = validator();
        let desc = "description: Writes conventional commit messages";

        let at_max = skill(&format!("name: {}\n{desc}", "a".repeat(64)), BODY);
        assert!(v.validate(&at_max).is_valid);

        let over = skill(&format!("name: {}\n{desc}", "a".repeat(65)), BODY);
        let result = v.validate(&over);
        assert_eq!(
            result.errors,
            vec!["Name exceeds maximum length of 64 characters"]
        );
    }

    #[test]
    fn test_length_error_is_independent_of_pattern_error() {
        let content = skill(
            &format!("name: {}\ndescription: short", "A".repeat(65)),
            BODY,
        );
        let result = validator().validate(&content);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors[0].starts_with("Name exceeds maximum length"));
        assert!(result.errors[1].starts_with("Name must contain only"));
        assert!(result.errors[2].starts_with("Description too short"));
    }

    #[test]
    fn test_missing_required_fields() {
        let content = skill("context: fork", BODY);
        let result = validator().validate(&content);
        assert_eq!(
            result.errors,
            vec![
                "Missing required field: 'name'",
                "Missing required field: 'description'"
            ]
        );
    }

    #[test]
    fn test_description_too_long() {
        let content = skill(
            &format!("name: ok\ndescription: {}", "d".repeat(1025)),
            BODY,
        );
        let result = validator().validate(&content);
        assert_eq!(
            result.errors,
            vec!["Description exceeds maximum length of 1024 characters"]
        );
    }

    #[test]
    fn test_optional_field_types() {
        let content = skill(
            "name: ok\ndescription: Writes conventional commit messages\nallowed-tools: 5\ncontext: main\nuser-invocable: \"yes\"",
            BODY,
        );
        let result = validator().validate(&content);
        assert_eq!(
            result.errors,
            vec![
                "'allowed-tools' must be a string or list",
                "'context' must be 'fork' if specified",
                "'user-invocable' must be a boolean (true/false)",
            ]
        );
    }

    #[test]
    fn test_allowed_tools_string_form() {
        let content = skill(
            "name: ok\ndescription: Writes conventional commit messages\nallowed-tools: Bash, Read",
            BODY,
        );
        assert!(validator().validate(&content).is_valid);
    }

    #[test]
    fn test_body_rules() {
        let content = skill(
            "name: ok\ndescription: Writes conventional commit messages",
            "short body without heading",
        );
        let result = validator().validate(&content);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].starts_with("Markdown content is too short"));
        assert!(result.errors[1].starts_with("Markdown should include at least one heading"));
    }

    #[test]
    fn test_heading_requires_text_on_same_line() {
        let body = format!("#\n{}", "x".repeat(60));
        let content = skill("name: ok\ndescription: Writes conventional commit messages", &body);
        let result = validator().validate(&content);
        assert_eq!(
            result.errors,
            vec!["Markdown should include at least one heading to structure the content"]
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = ValidationRules {
            max_name_length: 8,
            name_pattern: "^[a-z]+$".to_string(),
            ..Default::default()
        };
        let v = SkillValidator::new(rules).unwrap();
        let content = skill("name: toolong-name\ndescription: Writes conventional commit messages", BODY);
        assert_eq!(v.validate(&content).errors.len(), 2);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let rules = ValidationRules {
            name_pattern: "([".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            SkillValidator::new(rules),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_frontmatter_and_name_accessors() {
        let v = validator();
        let content = skill("name: commit-helper\ndescription: x", "");
        let fm = v.frontmatter(&content).unwrap();
        assert_eq!(fm.get("description").and_then(Value::as_str), Some("x"));
        assert_eq!(v.skill_name(&content).as_deref(), Some("commit-helper"));

        assert!(v.frontmatter("no frontmatter").is_none());
        assert!(v.skill_name(&skill("description: x", "")).is_none());
    }

    #[test]
    fn test_split_keeps_body_after_closing_delimiter() {
        let (yaml, body) = split_frontmatter("---\nname: x\n---  \n# Title\ntext").unwrap();
        assert_eq!(yaml, "name: x\n");
        assert_eq!(body, "# Title\ntext");
    }
}
