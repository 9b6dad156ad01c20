use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::backups::{self, BackupEntry};

/// Full content of one logical database: record key -> record.
pub type Document = Map<String, Value>;

/// Payload field that, when present on an added record, names its storage key.
pub const KEY_FIELD: &str = "key";

const PREVIEW_KEYS: usize = 5;

/// Dashboard line for one database file.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DatabaseSummary {
    Info {
        filename: PathBuf,
        size: u64,
        modified: String,
        record_count: usize,
        preview: Vec<String>,
    },
    Error { error: String },
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SearchResults {
    pub results: Document,
    pub count: usize,
}

/// JSON-file-backed record store.
///
/// Every configured database name maps to exactly one file. Each call reads
/// or rewrites the whole file; nothing is cached between calls. Mutations on
/// one database are serialized by a per-database mutex so read-modify-write
/// cycles do not lose each other's updates. Every successful save also writes
/// a timestamped copy into the backup directory.
pub struct RecordStore {
    databases: BTreeMap<String, PathBuf>,
    backup_dir: PathBuf,
    locks: HashMap<String, Arc<Mutex<()>>>,
}

impl RecordStore {
    pub fn new<P: Into<PathBuf>>(databases: BTreeMap<String, PathBuf>, backup_dir: P) -> Self {
        let locks = databases
            .keys()
            .map(|name| (name.clone(), Arc::new(Mutex::new(()))))
            .collect();
        Self { databases, backup_dir: backup_dir.into(), locks }
    }

    /// Directory timestamped backups are written to.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// File path backing `db`.
    pub fn resolve(&self, db: &str) -> Result<&Path, ServiceError> {
        self.databases
            .get(db)
            .map(PathBuf::as_path)
            .ok_or_else(|| ServiceError::UnknownDatabase(db.to_string()))
    }

    fn lock_for(&self, db: &str) -> Result<Arc<Mutex<()>>, ServiceError> {
        self.locks
            .get(db)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownDatabase(db.to_string()))
    }

    /// Load a document, distinguishing "absent" (`Ok(None)`) from failures.
    pub async fn load_checked(&self, db: &str) -> Result<Option<Document>, ServiceError> {
        let path = self.resolve(db)?;
        read_document(path).await
    }

    /// Load a document. Unknown names, missing files, unreadable files and
    /// malformed JSON all come back as an empty document; failures are logged.
    pub async fn load(&self, db: &str) -> Document {
        match self.load_checked(db).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!(db, "database file absent; treating as empty");
                Document::new()
            }
            Err(e) => {
                warn!(db, error = %e, "failed to load database; treating as empty");
                Document::new()
            }
        }
    }

    /// Overwrite the database file and write a backup copy.
    /// Returns the path of the backup written.
    #[instrument(skip(self, doc), fields(records = doc.len()))]
    pub async fn save(&self, db: &str, doc: &Document) -> Result<PathBuf, ServiceError> {
        let lock = self.lock_for(db)?;
        let _guard = lock.lock().await;
        self.save_unlocked(db, doc).await
    }

    async fn save_unlocked(&self, db: &str, doc: &Document) -> Result<PathBuf, ServiceError> {
        let path = self.resolve(db)?;
        let bytes = encode(doc)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| ServiceError::io(parent, e))?;
        }
        fs::write(path, &bytes).await.map_err(|e| {
            warn!(db, path = %path.display(), error = %e, "failed to write database file");
            ServiceError::io(path, e)
        })?;
        // Primary is not rolled back when the backup write fails.
        let backup = backups::write_backup(&self.backup_dir, db, &bytes).await.map_err(|e| {
            warn!(db, error = %e, "database saved but backup failed");
            e
        })?;
        info!(db, records = doc.len(), backup = %backup.display(), "database saved");
        Ok(backup)
    }

    /// Summaries for every configured database whose file exists.
    pub async fn list_databases(&self) -> BTreeMap<String, DatabaseSummary> {
        let mut out = BTreeMap::new();
        for (name, path) in &self.databases {
            let meta = match fs::metadata(path).await {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            let summary = match read_value(path).await {
                Ok(value) => {
                    let (record_count, preview) = match &value {
                        Value::Object(map) => {
                            (map.len(), map.keys().take(PREVIEW_KEYS).cloned().collect())
                        }
                        _ => (0, Vec::new()),
                    };
                    let modified = meta
                        .modified()
                        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default();
                    DatabaseSummary::Info {
                        filename: path.clone(),
                        size: meta.len(),
                        modified,
                        record_count,
                        preview,
                    }
                }
                Err(e) => {
                    warn!(db = %name, error = %e, "database file unreadable");
                    DatabaseSummary::Error { error: format!("failed to read file: {e}") }
                }
            };
            out.insert(name.clone(), summary);
        }
        out
    }

    pub async fn get_record(&self, db: &str, key: &str) -> Result<Value, ServiceError> {
        self.resolve(db)?;
        self.load(db)
            .await
            .remove(key)
            .ok_or_else(|| ServiceError::not_found(&format!("record {key}")))
    }

    /// Insert a record and persist, returning its key.
    ///
    /// The key is `key` if given, else the payload's `"key"` field (stripped
    /// from the stored value), else a fresh UUID v4. An existing record under
    /// the same key is replaced.
    #[instrument(skip(self, record))]
    pub async fn add_record(
        &self,
        db: &str,
        mut record: Value,
        key: Option<String>,
    ) -> Result<String, ServiceError> {
        let embedded = record
            .as_object_mut()
            .and_then(|fields| fields.shift_remove(KEY_FIELD))
            .map(|k| match k {
                Value::String(s) => s,
                other => other.to_string(),
            });
        let key = key.or(embedded).unwrap_or_else(|| Uuid::new_v4().to_string());

        let lock = self.lock_for(db)?;
        let _guard = lock.lock().await;
        let mut doc = self.load(db).await;
        doc.insert(key.clone(), record);
        self.save_unlocked(db, &doc).await?;
        debug!(db, %key, "record added");
        Ok(key)
    }

    /// Shallow-merge `updates` into the record at `key` and persist.
    /// Nested values are replaced wholesale. Returns the merged record.
    #[instrument(skip(self, updates))]
    pub async fn update_record(
        &self,
        db: &str,
        key: &str,
        updates: Value,
    ) -> Result<Value, ServiceError> {
        let Value::Object(updates) = updates else {
            return Err(ServiceError::Validation("updates must be a JSON object".into()));
        };

        let lock = self.lock_for(db)?;
        let _guard = lock.lock().await;
        let mut doc = self.load(db).await;
        let record = doc
            .get_mut(key)
            .ok_or_else(|| ServiceError::not_found(&format!("record {key}")))?;
        let fields = record
            .as_object_mut()
            .ok_or_else(|| ServiceError::Validation(format!("record {key} is not an object")))?;
        for (field, value) in updates {
            fields.insert(field, value);
        }
        let merged = record.clone();
        self.save_unlocked(db, &doc).await?;
        Ok(merged)
    }

    /// Remove the record at `key` and persist. Returns the removed record.
    #[instrument(skip(self))]
    pub async fn delete_record(&self, db: &str, key: &str) -> Result<Value, ServiceError> {
        let lock = self.lock_for(db)?;
        let _guard = lock.lock().await;
        let mut doc = self.load(db).await;
        let removed = doc
            .shift_remove(key)
            .ok_or_else(|| ServiceError::not_found(&format!("record {key}")))?;
        self.save_unlocked(db, &doc).await?;
        Ok(removed)
    }

    /// Case-insensitive substring search over keys and string-typed fields.
    /// An empty query matches everything.
    pub async fn search(&self, db: &str, query: &str) -> SearchResults {
        let needle = query.to_lowercase();
        let results: Document = self
            .load(db)
            .await
            .into_iter()
            .filter(|(key, record)| record_matches(key, record, &needle))
            .collect();
        SearchResults { count: results.len(), results }
    }

    /// Write a backup of the current document without touching the primary file.
    #[instrument(skip(self))]
    pub async fn backup(&self, db: &str) -> Result<PathBuf, ServiceError> {
        self.resolve(db)?;
        let doc = self.load(db).await;
        let path = backups::write_backup(&self.backup_dir, db, &encode(&doc)?).await?;
        info!(db, backup = %path.display(), "backup created");
        Ok(path)
    }

    pub async fn list_backups(&self, db: Option<&str>) -> Result<Vec<BackupEntry>, ServiceError> {
        if let Some(db) = db {
            self.resolve(db)?;
        }
        backups::list_backups(&self.backup_dir, db).await
    }

    /// Replace `db` with the content of a backup file. The primary file is
    /// untouched unless the backup exists and parses as a JSON object.
    #[instrument(skip(self, backup_path), fields(backup = %backup_path.as_ref().display()))]
    pub async fn restore<P: AsRef<Path>>(&self, db: &str, backup_path: P) -> Result<PathBuf, ServiceError> {
        self.replace_from_file(db, backup_path.as_ref(), "backup file").await
    }

    /// Bulk-replace `db` with the JSON object stored at `path`.
    #[instrument(skip(self, path), fields(source = %path.as_ref().display()))]
    pub async fn import_file<P: AsRef<Path>>(&self, db: &str, path: P) -> Result<PathBuf, ServiceError> {
        self.replace_from_file(db, path.as_ref(), "import file").await
    }

    async fn replace_from_file(&self, db: &str, source: &Path, what: &str) -> Result<PathBuf, ServiceError> {
        self.resolve(db)?;
        let doc = read_document(source)
            .await?
            .ok_or_else(|| ServiceError::not_found(&format!("{what} {}", source.display())))?;

        let lock = self.lock_for(db)?;
        let _guard = lock.lock().await;
        self.save_unlocked(db, &doc).await
    }

    /// Raw bytes of the database file, for download.
    pub async fn read_raw(&self, db: &str) -> Result<Vec<u8>, ServiceError> {
        let path = self.resolve(db)?;
        match fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServiceError::not_found(&format!("database file {}", path.display())))
            }
            Err(e) => Err(ServiceError::io(path, e)),
        }
    }
}

fn record_matches(key: &str, record: &Value, needle: &str) -> bool {
    if key.to_lowercase().contains(needle) {
        return true;
    }
    match record {
        Value::Object(fields) => fields.values().any(|v| match v {
            Value::String(s) => s.to_lowercase().contains(needle),
            _ => false,
        }),
        _ => false,
    }
}

/// Pretty-printed with two-space indent; non-ASCII is written verbatim.
fn encode(doc: &Document) -> Result<Vec<u8>, ServiceError> {
    Ok(serde_json::to_vec_pretty(doc)?)
}

async fn read_value(path: &Path) -> Result<Value, ServiceError> {
    let bytes = fs::read(path).await.map_err(|e| ServiceError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::malformed(path, e.to_string()))
}

/// `Ok(None)` when the file does not exist.
async fn read_document(path: &Path) -> Result<Option<Document>, ServiceError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ServiceError::io(path, e)),
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(doc)) => Ok(Some(doc)),
        Ok(_) => Err(ServiceError::malformed(path, "top-level value is not an object")),
        Err(e) => Err(ServiceError::malformed(path, e.to_string())),
    }
}
