use std::{io::ErrorKind, path::Path, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const SESSION_FILE: &str = "session.json";

/// Credentials for the hosted backend, stored next to the rest of the local
/// state. Obtaining the access token is outside this tool; `session set`
/// writes the file and `logout` deletes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub base_url: String,
    pub api_key: String,
    pub access_token: String,
    pub user_id: Arc<str>,
}

impl SessionConfig {
    pub fn load(app_dir: &Path) -> Result<Self> {
        let path = app_dir.join(SESSION_FILE);
        let raw = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "no session configured at {path:?}; run `slotwise session set` first"
            )
        })?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("session file {path:?} is not valid"))?;
        Ok(session)
    }

    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let path = app_dir.join(SESSION_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write session file {path:?}"))?;
        Ok(())
    }

    /// Removes the session file. Returns whether a file was present.
    pub fn clear(app_dir: &Path) -> Result<bool> {
        match std::fs::remove_file(app_dir.join(SESSION_FILE)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// REST endpoint of the `time_logs` table.
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/time_logs", self.base_url.trim_end_matches('/'))
    }

    /// WebSocket endpoint of the realtime channel service, derived from the
    /// base url.
    pub fn realtime_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("wss://{base}")
        };
        format!("{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0", self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::SessionConfig;

    fn test_session() -> SessionConfig {
        SessionConfig {
            base_url: "https://example.supabase.co/".into(),
            api_key: "anon-key".into(),
            access_token: "token".into(),
            user_id: Arc::from("user-1"),
        }
    }

    #[test]
    fn save_load_clear_roundtrip() {
        let dir = tempdir().unwrap();
        let session = test_session();
        session.save(dir.path()).unwrap();

        let loaded = SessionConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, session);

        assert!(SessionConfig::clear(dir.path()).unwrap());
        assert!(!SessionConfig::clear(dir.path()).unwrap());
        assert!(SessionConfig::load(dir.path()).is_err());
    }

    #[test]
    fn derives_endpoints_from_base_url() {
        let session = test_session();
        assert_eq!(
            session.table_url(),
            "https://example.supabase.co/rest/v1/time_logs"
        );
        assert_eq!(
            session.realtime_url(),
            "wss://example.supabase.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }
}
