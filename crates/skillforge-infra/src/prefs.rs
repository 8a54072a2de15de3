//! Remembered answers to the generator's setup questions.
//!
//! Stored as a flat JSON object in the working directory. Preferences are
//! not critical: an unreadable file loads as empty and failed writes are
//! only logged.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use skillforge_types::skill::OutputLocation;

/// Default preferences file, relative to the working directory.
pub const PREFS_FILE: &str = ".skillforge-prefs.json";

const OUTPUT_LOCATION: &str = "output_location";
const WANTS_HOOKS: &str = "wants_hooks";

#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Preferences {
    /// Load preferences from `path`; missing or corrupt files load empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    tracing::warn!(path = %path.display(), "Ignoring unreadable preferences file");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a value and save immediately.
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
        self.save();
    }

    pub fn output_location(&self) -> Option<OutputLocation> {
        self.get(OUTPUT_LOCATION)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn set_output_location(&mut self, location: &OutputLocation) {
        self.set(OUTPUT_LOCATION, Value::String(location.to_string()));
    }

    pub fn wants_hooks(&self) -> Option<bool> {
        self.get(WANTS_HOOKS).and_then(Value::as_bool)
    }

    pub fn set_wants_hooks(&mut self, wants_hooks: bool) {
        self.set(WANTS_HOOKS, Value::Bool(wants_hooks));
    }

    fn save(&self) {
        let result = serde_json::to_string_pretty(&self.values)
            .map_err(std::io::Error::other)
            .and_then(|text| std::fs::write(&self.path, text));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to save preferences");
        }
    }
}
