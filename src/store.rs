//! Dataset persistence, one document per account and domain.
//!
//! Every call is atomic for the domain it touches: a save either replaces
//! the stored dataset completely or leaves the previous one in place.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{debug, info};
use uuid::Uuid;

use crate::{
    dataset::{AccountDatasets, AccountId, Dataset, DeleteCriteria},
    error::StoreError,
};

const DATASET_EXTENSION: &str = "json";
const MAX_KEY_LEN: usize = 128;

pub trait DatasetStore: Send + Sync {
    fn load_all(&self, account: &AccountId) -> Result<AccountDatasets, StoreError>;

    fn save(&self, account: &AccountId, domain: &str, dataset: &Dataset) -> Result<(), StoreError>;

    /// Removes the rows selected by `criteria` and returns what is left.
    ///
    /// A domain left without rows is removed altogether and `None` returned.
    fn delete(
        &self,
        account: &AccountId,
        domain: &str,
        criteria: DeleteCriteria,
    ) -> Result<Option<Dataset>, StoreError>;

    fn list_domains_with_data(&self, account: &AccountId) -> Result<Vec<String>, StoreError> {
        Ok(self
            .load_all(account)?
            .into_iter()
            .filter(|(_, dataset)| !dataset.is_empty())
            .map(|(domain, _)| domain)
            .collect())
    }
}

/// Accepts keys usable as a single path component.
pub fn validate_key(key: &str) -> Result<&str, StoreError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key.trim() == key
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.' | '@'));
    if valid {
        Ok(key)
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

fn prune(existing: Option<Dataset>, criteria: &DeleteCriteria) -> Option<Dataset> {
    let pruned = existing?.without(criteria);
    (!pruned.is_empty()).then_some(pruned)
}

/// Stores `<root>/<account>/<domain>.json`, written through a temporary
/// file and renamed into place.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn account_dir(&self, account: &AccountId) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(validate_key(account.as_str())?))
    }

    fn dataset_path(&self, account: &AccountId, domain: &str) -> Result<PathBuf, StoreError> {
        let file = format!("{}.{DATASET_EXTENSION}", validate_key(domain)?);
        Ok(self.account_dir(account)?.join(file))
    }

    fn read_dataset(path: &Path) -> Result<Option<Dataset>, StoreError> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Serialization {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_atomically(path: &Path, dataset: &Dataset) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(io_err)?;
        let payload = serde_json::to_vec(dataset).map_err(|source| StoreError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
        let temp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let written = fs::File::create(&temp)
            .and_then(|mut file| {
                file.write_all(&payload)?;
                file.sync_all()
            })
            .and_then(|_| fs::rename(&temp, path));
        if let Err(err) = written {
            let _ = fs::remove_file(&temp);
            return Err(io_err(err));
        }
        Ok(())
    }
}

impl DatasetStore for FsStore {
    fn load_all(&self, account: &AccountId) -> Result<AccountDatasets, StoreError> {
        let dir = self.account_dir(account)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(AccountDatasets::new());
            }
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };
        let mut datasets = AccountDatasets::new();
        for entry in entries {
            let path = entry
                .map_err(|source| StoreError::Io {
                    path: dir.clone(),
                    source,
                })?
                .path();
            let is_dataset = path
                .extension()
                .is_some_and(|ext| ext == DATASET_EXTENSION);
            let Some(domain) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !is_dataset || domain.starts_with('.') {
                continue;
            }
            if let Some(dataset) = Self::read_dataset(&path)? {
                datasets.insert(domain.to_string(), dataset);
            }
        }
        debug!("Loaded {} dataset(s) for account '{account}'", datasets.len());
        Ok(datasets)
    }

    fn save(&self, account: &AccountId, domain: &str, dataset: &Dataset) -> Result<(), StoreError> {
        let path = self.dataset_path(account, domain)?;
        Self::write_atomically(&path, dataset)?;
        info!(
            "Saved {} row(s) for '{domain}' to {path:?}",
            dataset.len()
        );
        Ok(())
    }

    fn delete(
        &self,
        account: &AccountId,
        domain: &str,
        criteria: DeleteCriteria,
    ) -> Result<Option<Dataset>, StoreError> {
        let path = self.dataset_path(account, domain)?;
        let remaining = prune(Self::read_dataset(&path)?, &criteria);
        match &remaining {
            Some(dataset) => Self::write_atomically(&path, dataset)?,
            None => match fs::remove_file(&path) {
                Ok(()) => info!("Removed dataset {path:?}"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { path, source }),
            },
        }
        Ok(remaining)
    }
}

/// In-process store; writes can be made to fail for exercising error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<AccountId, AccountDatasets>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::WriteRejected("writes are disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DatasetStore for MemoryStore {
    fn load_all(&self, account: &AccountId) -> Result<AccountDatasets, StoreError> {
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.get(account).cloned().unwrap_or_default())
    }

    fn save(&self, account: &AccountId, domain: &str, dataset: &Dataset) -> Result<(), StoreError> {
        validate_key(domain)?;
        self.check_writable()?;
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        accounts
            .entry(account.clone())
            .or_default()
            .insert(domain.to_string(), dataset.clone());
        Ok(())
    }

    fn delete(
        &self,
        account: &AccountId,
        domain: &str,
        criteria: DeleteCriteria,
    ) -> Result<Option<Dataset>, StoreError> {
        validate_key(domain)?;
        self.check_writable()?;
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let datasets = accounts.entry(account.clone()).or_default();
        let remaining = prune(datasets.remove(domain), &criteria);
        if let Some(dataset) = &remaining {
            datasets.insert(domain.to_string(), dataset.clone());
        }
        Ok(remaining)
    }
}
