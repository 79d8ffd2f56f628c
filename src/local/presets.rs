use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

pub const PRESETS_FILE: &str = "activities.json";

/// Labels offered by the prompt chooser before the user has customized
/// anything.
pub const DEFAULT_ACTIVITIES: [&str; 7] = [
    "Office Work",
    "Personal",
    "Workout",
    "Meditation",
    "Break",
    "Lunch",
    "College time",
];

/// User-editable list of activity labels, stored as a plain JSON array with
/// no schema versioning.
#[derive(Debug, Clone)]
pub struct ActivityPresets {
    path: PathBuf,
}

impl ActivityPresets {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(PRESETS_FILE),
        }
    }

    pub fn load(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("preset file {:?} is not valid", self.path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Ok(DEFAULT_ACTIVITIES.iter().map(|v| v.to_string()).collect())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, activities: &[String]) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(activities)?)?;
        Ok(())
    }

    /// Adds a label unless it is already present. Returns whether the list
    /// changed.
    pub fn add(&self, label: &str) -> Result<bool> {
        let label = label.trim();
        let mut activities = self.load()?;
        if label.is_empty() || activities.iter().any(|v| v == label) {
            return Ok(false);
        }
        activities.push(label.to_string());
        self.save(&activities)?;
        Ok(true)
    }

    /// Removes a label. Returns whether it was present.
    pub fn remove(&self, label: &str) -> Result<bool> {
        let mut activities = self.load()?;
        let before = activities.len();
        activities.retain(|v| v != label);
        if activities.len() == before {
            return Ok(false);
        }
        self.save(&activities)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{ActivityPresets, DEFAULT_ACTIVITIES};

    #[test]
    fn defaults_apply_until_saved() {
        let dir = tempdir().unwrap();
        let presets = ActivityPresets::in_dir(dir.path());
        assert_eq!(presets.load().unwrap(), DEFAULT_ACTIVITIES.to_vec());
    }

    #[test]
    fn add_and_remove_roundtrip() {
        let dir = tempdir().unwrap();
        let presets = ActivityPresets::in_dir(dir.path());

        assert!(presets.add("Reading").unwrap());
        assert!(!presets.add("Reading").unwrap());
        assert!(presets.load().unwrap().contains(&"Reading".to_string()));

        assert!(presets.remove("Reading").unwrap());
        assert!(!presets.remove("Reading").unwrap());
        assert!(!presets.load().unwrap().contains(&"Reading".to_string()));
    }

    #[test]
    fn removing_a_default_persists_the_rest() {
        let dir = tempdir().unwrap();
        let presets = ActivityPresets::in_dir(dir.path());

        assert!(presets.remove("Lunch").unwrap());
        let loaded = presets.load().unwrap();
        assert_eq!(loaded.len(), DEFAULT_ACTIVITIES.len() - 1);
        assert!(!loaded.contains(&"Lunch".to_string()));
    }
}
