use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Connection settings for a LightBlue server.
#[derive(Debug, Clone)]
pub struct LightBlueConfig {
    pub server_url: String,
    pub cert: PathBuf,
    pub private_key: PathBuf,
    pub verify_ssl: bool,
}

impl LightBlueConfig {
    pub fn new(
        server_url: impl Into<String>,
        cert: impl Into<PathBuf>,
        private_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            cert: cert.into(),
            private_key: private_key.into(),
            verify_ssl: true,
        }
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Both credential files must exist before any request is made.
    pub fn validate(&self) -> Result<()> {
        require_file("certificate", &self.cert)?;
        require_file("private key", &self.private_key)?;
        Ok(())
    }
}

fn require_file(what: &'static str, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::MissingFile {
            what,
            path: path.to_path_buf(),
        })
    }
}

/// Strip trailing slashes so endpoint paths can be joined with a single `/`.
pub(crate) fn normalize_server_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
