use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use veille_client::{ClientConfig, CredentialStore, StoreError};
use veille_core::{PollPolicy, POLL_CEILING, POLL_INTERVAL};
use veille_logging::{veille_debug, veille_info};

const CREDENTIALS_FILENAME: &str = ".veille_credentials.ron";
pub const DEFAULT_CONFIG_FILENAME: &str = "veille.ron";

/// Settings read from `veille.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_root: String,
    pub auth_root: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub poll_ceiling: u32,
    pub state_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url,
            api_root: client.api_root,
            auth_root: client.auth_root,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
            poll_ceiling: POLL_CEILING,
            state_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_root: self.api_root.clone(),
            auth_root: self.auth_root.clone(),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            ceiling: self.poll_ceiling,
        }
    }
}

/// Reads the config file.
///
/// A missing file yields the defaults unless the path was given explicitly.
pub fn load_config(path: &Path, explicit: bool) -> anyhow::Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
            veille_debug!("No config file at {:?}; using defaults", path);
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };
    let config = ron::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    veille_info!("Loaded config from {:?}", path);
    Ok(config)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedCredentials {
    entries: BTreeMap<String, String>,
}

/// Credential entries kept in `<dir>/.veille_credentials.ron`.
///
/// Writes go through a temp file in the same directory and a rename, so a
/// crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileCredentialStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILENAME)
    }

    fn read(&self, key: &str) -> Result<PersistedCredentials, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(PersistedCredentials::default());
            }
            Err(err) => return Err(StoreError::new(key, err.to_string())),
        };
        ron::from_str(&content).map_err(|err| StoreError::new(key, err.to_string()))
    }

    fn write(&self, key: &str, state: &PersistedCredentials) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(state, pretty)
            .map_err(|err| StoreError::new(key, err.to_string()))?;
        self.write_atomic(&content)
            .map_err(|err| StoreError::new(key, err.to_string()))
    }

    fn write_atomic(&self, content: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // NamedTempFile is created with owner-only permissions.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(self.path()).map_err(|err| err.error)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read(key)?.entries.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.read(key)?;
        state.entries.insert(key.to_string(), value.to_string());
        self.write(key, &state)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.read(key)?;
        if state.entries.remove(key).is_none() {
            return Ok(());
        }
        if state.entries.is_empty() {
            return match fs::remove_file(self.path()) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StoreError::new(key, err.to_string())),
            };
        }
        self.write(key, &state)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use veille_client::CREDENTIAL_KEY;

    use super::*;

    #[test]
    fn credential_survives_a_new_store_instance() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        assert_eq!(store.load(CREDENTIAL_KEY).unwrap(), None);

        store.save(CREDENTIAL_KEY, "abc").unwrap();
        let reopened = FileCredentialStore::new(dir.path().to_path_buf());
        assert_eq!(reopened.load(CREDENTIAL_KEY).unwrap().as_deref(), Some("abc"));

        reopened.clear(CREDENTIAL_KEY).unwrap();
        assert!(!reopened.path().exists());
        reopened.clear(CREDENTIAL_KEY).unwrap();
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        fs::write(store.path(), "not ron at all {").unwrap();

        let err = store.load(CREDENTIAL_KEY).unwrap_err();
        assert_eq!(err.key, CREDENTIAL_KEY);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, r#"(base_url: "http://veille.local", poll_ceiling: 10)"#).unwrap();

        let config = load_config(&path, true).unwrap();
        assert_eq!(config.base_url, "http://veille.local");
        assert_eq!(config.poll_policy().ceiling, 10);
        assert_eq!(config.poll_policy().interval, POLL_INTERVAL);
        assert_eq!(config.api_root, "/api");
    }

    #[test]
    fn missing_config_is_only_an_error_when_explicit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.ron");
        assert_eq!(load_config(&path, false).unwrap(), AppConfig::default());
        assert!(load_config(&path, true).is_err());
    }
}
