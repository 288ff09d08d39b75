// Application state module
// Read-only state shared by every connection task

use std::io;
use std::path::PathBuf;

use super::types::Config;
use crate::http::mime::MimeTable;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Served directory; request paths are joined onto it
    pub root: PathBuf,
    /// Built once at startup, never mutated afterwards
    pub mime: MimeTable,
    pub access_log: bool,
}

impl AppState {
    /// Build state from loaded configuration
    ///
    /// Fails when the configured root is missing or not a directory.
    pub fn new(config: Config) -> io::Result<Self> {
        let root = PathBuf::from(&config.http.root_dir);
        let metadata = std::fs::metadata(&root)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Root '{}' is not a directory", root.display()),
            ));
        }

        let mime = MimeTable::new(&config.http.mime_types);
        let access_log = config.logging.access_log;

        Ok(Self {
            config,
            root,
            mime,
            access_log,
        })
    }
}
