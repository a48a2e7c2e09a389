//! Directory-backed exchange
//!
//! Layout under the save-data root:
//!
//! ```text
//! <root>/requests/<uuid>.json    written here, consumed by the launcher
//! <root>/responses/<uuid>.json   written by the launcher, read here
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::RequestId;
use crate::error::ExchangeError;
use crate::ports::RequestExchange;

/// Directory holding request files, relative to the root.
pub const REQUESTS_DIR: &str = "requests";

/// Directory holding response files, relative to the root.
pub const RESPONSES_DIR: &str = "responses";

/// Exchange over a shared directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct DirectoryExchange {
    root: PathBuf,
}

impl DirectoryExchange {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create `requests/` and `responses/` if they do not exist.
    pub fn ensure_layout(&self) -> Result<(), ExchangeError> {
        for dir in [self.requests_dir(), self.responses_dir()] {
            fs::create_dir_all(&dir).map_err(|e| ExchangeError::io(&dir, e))?;
        }
        debug!(root = %self.root.display(), "Exchange directories ready");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn requests_dir(&self) -> PathBuf {
        self.root.join(REQUESTS_DIR)
    }

    pub fn responses_dir(&self) -> PathBuf {
        self.root.join(RESPONSES_DIR)
    }

    pub fn request_path(&self, id: &RequestId) -> PathBuf {
        self.requests_dir().join(id.file_name())
    }

    pub fn response_path(&self, id: &RequestId) -> PathBuf {
        self.responses_dir().join(id.file_name())
    }
}

impl RequestExchange for DirectoryExchange {
    fn write_request(&self, id: &RequestId, payload: &[u8]) -> Result<(), ExchangeError> {
        let path = self.request_path(id);
        // The launcher only picks up `*.json`, so the temp name is invisible to it
        let tmp_path = path.with_extension("json.tmp");

        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(payload)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            ExchangeError::io(&path, e)
        })
    }

    fn read_response(&self, id: &RequestId) -> Result<Option<Vec<u8>>, ExchangeError> {
        let path = self.response_path(id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ExchangeError::io(path, e)),
        }
    }

    fn remove_response(&self, id: &RequestId) -> Result<(), ExchangeError> {
        let path = self.response_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExchangeError::io(path, e)),
        }
    }
}
