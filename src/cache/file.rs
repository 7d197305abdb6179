use super::{CounterStates, SampleStore, retain_fresh};
use crate::error::{Error, Result};
use chrono::{Duration, Utc};
use nix::fcntl::{Flock, FlockArg};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CACHE_DIR: &str = "mariadb_integration";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    entities: BTreeMap<String, CounterStates>,
}

/// JSON file store holding every entity's counters in one document.
///
/// Writes go to a uniquely named sibling temp file which is synced and then
/// renamed over the target, so readers see either the old or the new
/// document. Stores take an exclusive lock on a sibling lock file, so runs for
/// different entities sharing one path do not lose each other's counters.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    ttl: Duration,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// `<temp dir>/mariadb_integration/<entity>.json` with the entity key made file-name safe.
    #[must_use]
    pub fn default_path(entity_key: &str) -> PathBuf {
        let name: String = entity_key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        std::env::temp_dir()
            .join(CACHE_DIR)
            .join(format!("{name}.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, source: io::Error) -> Error {
        Error::Store {
            path: self.path.clone(),
            source,
        }
    }

    fn read_document(&self) -> Result<CacheDocument> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheDocument::default()),
            Err(e) => return Err(self.store_error(e)),
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| self.store_error(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| "cache".into(), |n| n.to_string_lossy().into_owned())
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Exclusive advisory lock on a sibling `.<name>.lock`, held until dropped.
    fn lock(&self) -> io::Result<Flock<File>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.dir().join(format!(".{}.lock", self.file_name())))?;

        Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| io::Error::from(errno))
    }

    fn write_document(&self, document: &CacheDocument) -> io::Result<()> {
        let dir = self.dir();

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", self.file_name()))
            .suffix(".tmp")
            .tempfile_in(dir)?;

        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, document).map_err(io::Error::from)?;
        writer.flush()?;
        drop(writer);
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| e.error)?;

        // Make the rename itself durable.
        File::open(dir)?.sync_all()
    }
}

impl SampleStore for FileStore {
    fn load(&self, entity_key: &str) -> CounterStates {
        match self.read_document() {
            Ok(mut document) => {
                let counters = document.entities.remove(entity_key).unwrap_or_default();
                let fresh = retain_fresh(counters, self.ttl, Utc::now());
                debug!(
                    path = %self.path.display(),
                    entity = entity_key,
                    counters = fresh.len(),
                    "loaded previous sample"
                );
                fresh
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable sample cache; counters start over");
                CounterStates::new()
            }
        }
    }

    fn store(&self, entity_key: &str, counters: &CounterStates) -> Result<()> {
        let now = Utc::now();

        fs::create_dir_all(self.dir()).map_err(|e| self.store_error(e))?;

        // Serializes read-modify-write across runs sharing this file.
        let _lock = self.lock().map_err(|e| self.store_error(e))?;

        let mut document = self.read_document().unwrap_or_else(|e| {
            warn!(error = %e, "replacing unreadable sample cache");
            CacheDocument::default()
        });

        document.entities = std::mem::take(&mut document.entities)
            .into_iter()
            .map(|(key, states)| (key, retain_fresh(states, self.ttl, now)))
            .filter(|(_, states)| !states.is_empty())
            .collect();

        document
            .entities
            .insert(entity_key.to_string(), counters.clone());

        self.write_document(&document).map_err(|e| self.store_error(e))?;

        debug!(
            path = %self.path.display(),
            entity = entity_key,
            counters = counters.len(),
            "stored sample"
        );

        Ok(())
    }
}
