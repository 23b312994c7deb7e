//! Storage Port
//!
//! The wallet store and the configuration record each persist as one
//! document. [`Storage`] reads and replaces those documents; the facade never
//! touches paths directly.
//!
//! [`FileStorage`] writes owner-only files through a temp-file-then-rename
//! sequence, so a reader or a crash never observes a partial document.
//! [`MemoryStorage`] backs tests.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::WalletError;

/// Directory name under the user's home directory
pub const DEFAULT_DIR_NAME: &str = ".token-wallet";

/// Environment variable overriding the data directory
pub const HOME_ENV_VAR: &str = "TOKEN_WALLET_HOME";

/// The persisted documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreFile {
    /// The ordered list of wallet records
    Wallets,
    /// The singleton configuration record
    Config,
}

impl StoreFile {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Wallets => "wallets.json",
            Self::Config => "config.json",
        }
    }
}

/// Load/save access to the persisted documents.
pub trait Storage: Send + Sync {
    /// Read a document; `Ok(None)` if it has never been written.
    fn read(&self, file: StoreFile) -> Result<Option<Vec<u8>>, WalletError>;

    /// Replace a document atomically.
    fn write(&self, file: StoreFile, contents: &[u8]) -> Result<(), WalletError>;
}

/// Documents stored as files in one per-user directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$TOKEN_WALLET_HOME`, or `~/.token-wallet`
    pub fn default_dir() -> Result<PathBuf, WalletError> {
        if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_DIR_NAME))
            .ok_or_else(|| WalletError::Storage("could not find home directory".to_string()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: StoreFile) -> PathBuf {
        self.dir.join(file.file_name())
    }

    fn ensure_dir(&self) -> Result<(), WalletError> {
        if self.dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|e| io_error("create", &self.dir, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700))
                .map_err(|e| io_error("restrict permissions on", &self.dir, e))?;
        }

        tracing::debug!(dir = %self.dir.display(), "created wallet directory");
        Ok(())
    }
}

impl Storage for FileStorage {
    fn read(&self, file: StoreFile) -> Result<Option<Vec<u8>>, WalletError> {
        let path = self.path(file);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, e)),
        }
    }

    fn write(&self, file: StoreFile, contents: &[u8]) -> Result<(), WalletError> {
        self.ensure_dir()?;

        let path = self.path(file);
        let tmp_path = self.dir.join(format!(".{}.tmp", file.file_name()));

        if let Err(e) = write_private(&tmp_path, contents) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error("write", &tmp_path, e));
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_error("replace", &path, e)
        })?;

        // Persist the rename itself
        #[cfg(unix)]
        {
            if let Err(e) = fs::File::open(&self.dir).and_then(|d| d.sync_all()) {
                tracing::debug!("failed to sync wallet directory: {}", e);
            }
        }

        tracing::debug!(path = %path.display(), bytes = contents.len(), "saved");
        Ok(())
    }
}

/// Write a fresh owner-only file and flush it to disk
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // A stale temp file keeps its old mode; tighten it explicitly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> WalletError {
    WalletError::Storage(format!("failed to {} {}: {}", action, path.display(), err))
}

/// Documents held in memory; clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<StoreFile, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of a document, as they would appear on disk
    pub fn raw(&self, file: StoreFile) -> Option<Vec<u8>> {
        self.read(file).ok().flatten()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, file: StoreFile) -> Result<Option<Vec<u8>>, WalletError> {
        let files = self
            .files
            .lock()
            .map_err(|_| WalletError::Storage("in-memory storage poisoned".to_string()))?;
        Ok(files.get(&file).cloned())
    }

    fn write(&self, file: StoreFile, contents: &[u8]) -> Result<(), WalletError> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| WalletError::Storage("in-memory storage poisoned".to_string()))?;
        files.insert(file, contents.to_vec());
        Ok(())
    }
}
