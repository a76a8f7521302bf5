use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;
use tracing::debug;

pub const ENV_CONFIG_DIR: &str = "BUBBLESHADE_CONFIG_DIR";
pub const CONFIG_FILE: &str = "demo.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Bubbleshade";
const APPLICATION: &str = "bubbleshade";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(dir) = env::var_os(ENV_CONFIG_DIR).filter(|value| !value.is_empty()) {
            let config_dir = PathBuf::from(dir);
            debug!(path = %config_dir.display(), "config dir from {ENV_CONFIG_DIR}");
            return Ok(Self { config_dir });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// `demo.toml` inside the config dir, if it exists.
    pub fn user_config(&self) -> Option<PathBuf> {
        let path = self.config_dir.join(CONFIG_FILE);
        path.is_file().then_some(path)
    }
}
