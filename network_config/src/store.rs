use std::{
    fs, io,
    path::PathBuf,
};

use log::{error, info};

use crate::{NetworkConfig, Result};

/// Where the current document lives between sessions.
pub trait ConfigStore {
    /// Retrieves the current document, or the default one if there's none to be read.
    fn load(&self) -> NetworkConfig;

    /// Replaces the current document.
    ///
    /// # Returns
    /// An error if the document is invalid or can't be written, the stored one is then kept.
    fn save(&self, config: &NetworkConfig) -> Result<()>;
}

/// Keeps the document as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<NetworkConfig> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl ConfigStore for FileStore {
    fn load(&self) -> NetworkConfig {
        let path = self.path.display();

        match self.read() {
            Ok(config) => {
                info!("loaded configuration from {path}");
                config
            }
            Err(crate::ConfigErr::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("no configuration found at {path}, using default");
                NetworkConfig::default()
            }
            Err(e) => {
                error!("error loading configuration from {path}: {e}");
                NetworkConfig::default()
            }
        }
    }

    fn save(&self, config: &NetworkConfig) -> Result<()> {
        config.validate()?;

        let json = serde_json::to_string(config)?;
        fs::write(&self.path, json)?;
        info!("saved configuration to {}", self.path.display());

        Ok(())
    }
}
