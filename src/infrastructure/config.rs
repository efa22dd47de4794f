use crate::domain::{config::MaasLinkConfig, error::{MaasLinkError, MaasLinkResult}};
use std::path::{Path, PathBuf};
use std::fs;

const CONFIG_DIR_NAME: &str = "maas-link";
const PROJECT_DIR_NAME: &str = ".maas-link";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> MaasLinkResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = Self::find_project_config_path();

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Create a manager over explicit paths
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration from files.
    ///
    /// The global file is read first. Tables present in the project file
    /// (`global`, `session`, `subscriptions`) replace the global ones.
    pub fn load_config(&self) -> MaasLinkResult<MaasLinkConfig> {
        // Start with default configuration
        let mut config = MaasLinkConfig::default();

        // Load global configuration if exists
        if self.global_config_path.exists() {
            config = self.load_config_from_path(&self.global_config_path)?;
        }

        // Overlay project configuration if exists
        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                self.merge_project_config(&mut config, project_path)?;
            }
        }

        config.session.validate()?;
        Ok(config)
    }

    /// Save configuration to the project file when one is in use,
    /// otherwise to the global file
    pub fn save_config(&self, config: &MaasLinkConfig) -> MaasLinkResult<()> {
        let path = self
            .project_config_path
            .as_ref()
            .unwrap_or(&self.global_config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MaasLinkError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        self.save_config_to_path(path, config)
    }

    /// Get global configuration path
    fn get_global_config_path() -> MaasLinkResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| MaasLinkError::Config {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home.join(".config").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> MaasLinkResult<MaasLinkConfig> {
        let content = Self::read(path)?;

        toml::from_str(&content).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    fn merge_project_config(&self, config: &mut MaasLinkConfig, path: &Path) -> MaasLinkResult<()> {
        let content = Self::read(path)?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;
        let project: MaasLinkConfig = toml::from_str(&content).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        if table.contains_key("global") {
            config.global = project.global;
        }
        if table.contains_key("session") {
            config.session = project.session;
        }
        if table.contains_key("subscriptions") {
            config.subscriptions = project.subscriptions;
        }

        Ok(())
    }

    fn read(path: &Path) -> MaasLinkResult<String> {
        fs::read_to_string(path).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &MaasLinkConfig) -> MaasLinkResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration under `path`
    pub fn init_project_config(&self, path: &Path) -> MaasLinkResult<PathBuf> {
        let config_dir = path.join(PROJECT_DIR_NAME);
        let config_file = config_dir.join(CONFIG_FILE_NAME);

        if config_file.exists() {
            return Err(MaasLinkError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to create {} directory: {}", PROJECT_DIR_NAME, e),
        })?;

        let mut default_config = MaasLinkConfig::default();
        default_config
            .session
            .headers
            .insert("Origin".to_string(), "http://localhost:8081".to_string());

        self.save_config_to_path(&config_file, &default_config)?;

        Ok(config_file)
    }

    /// Get the current project config path (if any)
    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> ConfigManager {
        ConfigManager::with_paths(
            dir.path().join("global").join(CONFIG_FILE_NAME),
            Some(dir.path().join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME)),
        )
    }

    #[test]
    fn test_load_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        let config = manager.load_config().unwrap();

        assert_eq!(config.global.log_level, "info");
        assert_eq!(config.session.url, "ws://localhost:8081/ws");
        assert_eq!(config.subscriptions.len(), 4);
    }

    #[test]
    fn test_init_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let config_file = manager.init_project_config(temp_dir.path()).unwrap();
        assert!(config_file.exists());

        let content = fs::read_to_string(&config_file).unwrap();
        let config: MaasLinkConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.subscriptions.len(), 4);
        assert!(config.session.headers.contains_key("Origin"));

        assert!(manager.init_project_config(temp_dir.path()).is_err());
    }

    #[test]
    fn test_project_tables_override_global() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let global_path = manager.get_global_config_path_ref().clone();
        fs::create_dir_all(global_path.parent().unwrap()).unwrap();
        fs::write(
            &global_path,
            r#"
[global]
log_level = "debug"

[session]
url = "wss://global.example/ws"
"#,
        )
        .unwrap();

        let project_path = manager.get_project_config_path().unwrap().clone();
        fs::create_dir_all(project_path.parent().unwrap()).unwrap();
        fs::write(
            &project_path,
            r#"
[session]
url = "ws://project.example:5240/MAAS/ws"
active_ping = false

[[subscriptions]]
method = "zone.list"
"#,
        )
        .unwrap();

        let config = manager.load_config().unwrap();
        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.session.url, "ws://project.example:5240/MAAS/ws");
        assert!(!config.session.active_ping);
        assert_eq!(config.subscriptions.len(), 1);
        assert_eq!(config.subscriptions[0].method, "zone.list");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let global_path = manager.get_global_config_path_ref().clone();
        fs::create_dir_all(global_path.parent().unwrap()).unwrap();
        fs::write(&global_path, "[session]\nurl = \"http://example.com\"\n").unwrap();

        assert!(matches!(
            manager.load_config(),
            Err(MaasLinkError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_save_prefers_project_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let mut config = MaasLinkConfig::default();
        config.session.reconnect_delay_ms = 1_000;
        manager.save_config(&config).unwrap();

        let saved = manager
            .load_config_from_path(manager.get_project_config_path().unwrap())
            .unwrap();
        assert_eq!(saved, config);
        assert!(!manager.get_global_config_path_ref().exists());
    }
}
