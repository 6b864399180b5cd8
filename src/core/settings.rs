/*
 * Provides read access to the user's view settings. Settings are stored in a JSON file
 * keyed by namespace; the panel only cares about the `view` object of the `sapling`
 * namespace. Nothing is cached here: every call re-reads the store, so a configuration
 * change is visible on the very next request.
 *
 * `SettingsStoreOperations` is the seam used by the controller; `CoreSettingsStore` is the
 * file-backed implementation, located in the per-user config directory by default.
 */
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SETTINGS_NAMESPACE: &str = "sapling";
const SETTINGS_FILENAME: &str = "settings.json";
const VIEW_KEY: &str = "view";

// Snapshot of the `view` settings sent to the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsView {
    pub react_router: bool,
    pub third_party: bool,
}

#[derive(Debug)]
pub enum SettingsError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for SettingsError {
    fn from(err: io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Serde(err)
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Settings I/O error: {e}"),
            SettingsError::Serde(e) => write!(f, "Settings file is not valid JSON: {e}"),
            SettingsError::NoConfigDirectory => {
                write!(f, "Could not determine the configuration directory")
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Serde(e) => Some(e),
            SettingsError::NoConfigDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;

pub trait SettingsStoreOperations: Send + Sync {
    // Reads a fresh snapshot of `namespace.view`. Missing entries yield defaults.
    fn load_view_settings(&self, namespace: &str) -> Result<SettingsView>;
}

/*
 * Determines the default location of the settings file, `settings.json` inside the
 * platform's per-user configuration directory for `app_name`.
 */
pub fn default_settings_path(app_name: &str) -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", app_name).ok_or(SettingsError::NoConfigDirectory)?;
    let path = proj_dirs.config_dir().join(SETTINGS_FILENAME);
    log::trace!("Settings: Default settings path for '{app_name}' is {path:?}");
    Ok(path)
}

pub struct CoreSettingsStore {
    settings_path: PathBuf,
}

impl CoreSettingsStore {
    pub fn new(settings_path: PathBuf) -> Self {
        CoreSettingsStore { settings_path }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}

impl SettingsStoreOperations for CoreSettingsStore {
    fn load_view_settings(&self, namespace: &str) -> Result<SettingsView> {
        if !self.settings_path.exists() {
            log::debug!(
                "CoreSettingsStore: {:?} does not exist, using defaults.",
                self.settings_path
            );
            return Ok(SettingsView::default());
        }

        let contents = fs::read_to_string(&self.settings_path)?;
        if contents.trim().is_empty() {
            return Ok(SettingsView::default());
        }

        let root: serde_json::Value = serde_json::from_str(&contents)?;
        let view = match root.get(namespace).and_then(|section| section.get(VIEW_KEY)) {
            Some(view) => SettingsView::deserialize(view)?,
            None => {
                log::debug!(
                    "CoreSettingsStore: No '{namespace}.{VIEW_KEY}' in {:?}, using defaults.",
                    self.settings_path
                );
                SettingsView::default()
            }
        };
        log::trace!("CoreSettingsStore: Loaded {view:?}");
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = CoreSettingsStore::new(dir.path().join(SETTINGS_FILENAME));

        let view = store.load_view_settings(SETTINGS_NAMESPACE).unwrap();

        assert_eq!(view, SettingsView::default());
    }

    #[test]
    fn test_reads_view_of_namespace() {
        // Arrange
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(
            &path,
            r#"{"sapling":{"view":{"reactRouter":true,"thirdParty":false}},"other":{"view":{"thirdParty":true}}}"#,
        )
        .unwrap();
        let store = CoreSettingsStore::new(path);

        // Act
        let view = store.load_view_settings(SETTINGS_NAMESPACE).unwrap();

        // Assert
        assert!(view.react_router);
        assert!(!view.third_party);
    }

    #[test]
    fn test_partial_view_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, r#"{"sapling":{"view":{"thirdParty":true}}}"#).unwrap();
        let store = CoreSettingsStore::new(path);

        let view = store.load_view_settings(SETTINGS_NAMESPACE).unwrap();

        assert_eq!(
            view,
            SettingsView {
                react_router: false,
                third_party: true
            }
        );
    }

    #[test]
    fn test_every_load_rereads_file() {
        // Arrange
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, r#"{"sapling":{"view":{"reactRouter":false}}}"#).unwrap();
        let store = CoreSettingsStore::new(path.clone());
        assert!(!store.load_view_settings(SETTINGS_NAMESPACE).unwrap().react_router);

        // Act
        fs::write(&path, r#"{"sapling":{"view":{"reactRouter":true}}}"#).unwrap();

        // Assert
        assert!(store.load_view_settings(SETTINGS_NAMESPACE).unwrap().react_router);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, "{ not json").unwrap();
        let store = CoreSettingsStore::new(path);

        assert!(matches!(
            store.load_view_settings(SETTINGS_NAMESPACE),
            Err(SettingsError::Serde(_))
        ));
    }

    #[test]
    fn test_default_settings_path_is_under_app_config_dir() {
        let unique_app_name = format!("TestApp_Settings_{}", rand::random::<u64>());

        let path = default_settings_path(&unique_app_name).unwrap();

        assert!(path.ends_with(SETTINGS_FILENAME));
        assert!(
            path.to_string_lossy()
                .to_lowercase()
                .contains(&unique_app_name.to_lowercase())
        );
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let value = serde_json::to_value(SettingsView {
            react_router: true,
            third_party: false,
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"reactRouter": true, "thirdParty": false}));
    }
}
