//! Service configuration.
//!
//! One explicit struct, built in `main` and handed to the handlers as shared
//! app data. Nothing reads ambient globals: tests construct their own config
//! pointing at a scratch uploads directory.

use std::io;
use std::path::PathBuf;

/// Explicit configuration for the thumbnail service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding uploaded images and URL-fetch temp files.
    pub uploads_dir: PathBuf,
    /// Default thumbnail edge used when `width`/`height` are absent.
    pub default_edge: u32,
    /// JPEG quality for rendered thumbnails (1-100).
    pub jpeg_quality: u8,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5002,
            uploads_dir: PathBuf::from("uploads"),
            default_edge: 100,
            jpeg_quality: 85,
        }
    }
}

impl ServiceConfig {
    /// Create the uploads directory if it does not exist yet.
    ///
    /// Called once at process start; handlers assume the directory exists.
    pub fn ensure_uploads_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.uploads_dir)
    }
}
