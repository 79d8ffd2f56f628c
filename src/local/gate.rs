use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;

pub const GATE_FILE: &str = "last_notified";

/// The last slot key (`HH:MM` in reference time) a prompt was raised for.
/// Comparing against it is the only thing keeping repeated ticks inside one
/// slot from prompting twice, so the marker is written before the prompt is
/// surfaced. Cleared on logout.
#[derive(Debug, Clone)]
pub struct NotificationGate {
    path: PathBuf,
}

impl NotificationGate {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(GATE_FILE),
        }
    }

    pub fn last(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn record(&self, slot_key: &str) -> Result<()> {
        std::fs::write(&self.path, slot_key)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::NotificationGate;

    #[test]
    fn missing_marker_reads_as_none() {
        let dir = tempdir().unwrap();
        let gate = NotificationGate::in_dir(dir.path());
        assert_eq!(gate.last().unwrap(), None);
    }

    #[test]
    fn marker_survives_reopening() {
        let dir = tempdir().unwrap();
        let gate = NotificationGate::in_dir(dir.path());
        gate.record("14:30").unwrap();

        // A fresh handle sees the same marker, like a process restart would.
        let reopened = NotificationGate::in_dir(dir.path());
        assert_eq!(reopened.last().unwrap().as_deref(), Some("14:30"));

        reopened.record("15:00").unwrap();
        assert_eq!(gate.last().unwrap().as_deref(), Some("15:00"));
    }

    #[test]
    fn clear_removes_the_marker() {
        let dir = tempdir().unwrap();
        let gate = NotificationGate::in_dir(dir.path());
        gate.record("09:00").unwrap();
        gate.clear().unwrap();
        assert_eq!(gate.last().unwrap(), None);
        // Clearing twice is fine.
        gate.clear().unwrap();
    }
}
