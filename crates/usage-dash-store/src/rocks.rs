//! `RocksDB` record source.
//!
//! Documents are stored CBOR-encoded in the `usage_events` column family.
//!
//! A collection has one writer, opened with [`RocksSource::open`]. Readers that
//! run next to a live writer open it with [`RocksSource::open_secondary`] and
//! catch up with the writer before every read.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded, Options};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::RecordSource;

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed usage document collection.
#[derive(Clone)]
pub struct RocksSource {
    db: Arc<Db>,
    secondary: bool,
    scanning: Arc<AtomicBool>,
}

impl RocksSource {
    /// Open or create a `RocksDB` database at the given path as its writer.
    ///
    /// The writer holds the database lock; no other process can open the
    /// same path as a writer while this handle is alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = Db::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self::from_db(db, false))
    }

    /// Open an existing database read-only, alongside the process writing it.
    ///
    /// `secondary_path` holds this reader's own info logs and must differ
    /// from `primary_path`. Every [`RecordSource::fetch_all`] first catches
    /// up with the writer, so documents written after opening are seen on
    /// the next read.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the primary database does not
    /// exist or cannot be opened.
    pub fn open_secondary<P: AsRef<Path>>(primary_path: P, secondary_path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.set_max_open_files(-1);

        let db = Db::open_cf_as_secondary(
            &opts,
            primary_path,
            secondary_path,
            all_column_families(),
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self::from_db(db, true))
    }

    fn from_db(db: Db, secondary: bool) -> Self {
        Self {
            db: Arc::new(db),
            secondary,
            scanning: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether this handle is a read-only secondary.
    #[must_use]
    pub fn is_secondary(&self) -> bool {
        self.secondary
    }

    /// Store a usage document, returning the ID it was stored under.
    ///
    /// Storing a document with an existing `_id` replaces it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDocument` if the document is not a JSON
    /// object, `StoreError::Database` on a secondary handle, or a
    /// database/serialization error.
    pub fn insert(&self, document: &Value) -> Result<String> {
        self.ensure_writable()?;
        if !document.is_object() {
            return Err(StoreError::InvalidDocument(
                "usage documents must be JSON objects".into(),
            ));
        }

        let cf = self
            .db
            .cf_handle(cf::USAGE_EVENTS)
            .ok_or_else(|| missing_cf(cf::USAGE_EVENTS))?;
        let id = keys::document_id(document);
        let value = serialize(document)?;

        self.db
            .put_cf(&cf, keys::usage_event_key(&id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(id)
    }

    /// Remove a stored document. Removing an unknown ID is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the handle is a
    /// secondary.
    pub fn remove(&self, document_id: &str) -> Result<()> {
        self.ensure_writable()?;
        let cf = self
            .db
            .cf_handle(cf::USAGE_EVENTS)
            .ok_or_else(|| missing_cf(cf::USAGE_EVENTS))?;

        self.db
            .delete_cf(&cf, keys::usage_event_key(document_id))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Read every stored document synchronously.
    ///
    /// Records that fail to decode are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if catching up or iteration fails.
    pub fn scan(&self) -> Result<Vec<Value>> {
        read_all(&self.db, self.secondary)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.secondary {
            return Err(StoreError::Database(
                "secondary handle is read-only".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSource for RocksSource {
    /// Scan the collection on the blocking pool.
    ///
    /// A caller that stops waiting does not stop the scan. While a scan is
    /// still running, further calls fail fast with `StoreError::Unavailable`
    /// instead of queueing another blocking thread.
    async fn fetch_all(&self) -> Result<Vec<Value>> {
        let Some(guard) = ScanGuard::acquire(&self.scanning) else {
            tracing::warn!("Previous usage scan still running, skipping read");
            return Err(StoreError::Unavailable(
                "previous scan still running".into(),
            ));
        };

        let db = Arc::clone(&self.db);
        let secondary = self.secondary;
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            read_all(&db, secondary)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("scan task failed: {e}")))?
    }

    fn backend(&self) -> &'static str {
        if self.secondary {
            "rocksdb-secondary"
        } else {
            "rocksdb"
        }
    }
}

/// Marks a scan in flight; cleared on drop.
struct ScanGuard(Arc<AtomicBool>);

impl ScanGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn read_all(db: &Db, secondary: bool) -> Result<Vec<Value>> {
    if secondary {
        db.try_catch_up_with_primary()
            .map_err(|e| StoreError::Unavailable(format!("catch-up failed: {e}")))?;
    }
    scan(db)
}

fn scan(db: &Db) -> Result<Vec<Value>> {
    let cf = db
        .cf_handle(cf::USAGE_EVENTS)
        .ok_or_else(|| missing_cf(cf::USAGE_EVENTS))?;

    let mut documents = Vec::new();
    for item in db.iterator_cf(&cf, IteratorMode::Start) {
        let (key, value) = item.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        match deserialize(&value) {
            Ok(document) => documents.push(document),
            Err(err) => {
                tracing::warn!(
                    key = %String::from_utf8_lossy(&key),
                    error = %err,
                    "Skipping undecodable usage document"
                );
            }
        }
    }

    tracing::debug!(count = documents.len(), "Scanned usage documents");
    Ok(documents)
}

fn missing_cf(name: &str) -> StoreError {
    StoreError::Database(format!("column family not found: {name}"))
}

/// Serialize a value using CBOR.
fn serialize(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value from CBOR.
fn deserialize(data: &[u8]) -> Result<Value> {
    ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_source() -> (RocksSource, TempDir) {
        let dir = TempDir::new().unwrap();
        let source = RocksSource::open(dir.path()).unwrap();
        (source, dir)
    }

    #[tokio::test]
    async fn insert_and_fetch_all() {
        let (source, _dir) = create_test_source();

        source
            .insert(&json!({
                "_id": "evt_1",
                "time": "2024-01-01T00:00:00Z",
                "total_tokens": 100,
                "cost": 1.25,
                "completion": "hi",
                "model_name": "gpt-4o"
            }))
            .unwrap();
        source
            .insert(&json!({"time": "2024-01-02T00:00:00Z", "total_tokens": null, "cost": "bad"}))
            .unwrap();

        let documents = source.fetch_all().await.unwrap();
        assert_eq!(documents.len(), 2);

        let first = documents
            .iter()
            .find(|doc| doc["_id"] == "evt_1")
            .unwrap();
        assert_eq!(first["total_tokens"], json!(100));
        assert_eq!(first["cost"], json!(1.25));
        assert_eq!(first["model_name"], json!("gpt-4o"));

        let second = documents.iter().find(|doc| doc.get("_id").is_none()).unwrap();
        assert!(second["total_tokens"].is_null());
        assert_eq!(second["cost"], json!("bad"));
    }

    #[tokio::test]
    async fn insert_with_same_id_replaces() {
        let (source, _dir) = create_test_source();

        source.insert(&json!({"_id": "evt_1", "cost": 1})).unwrap();
        source.insert(&json!({"_id": "evt_1", "cost": 2})).unwrap();

        let documents = source.fetch_all().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["cost"], json!(2));
    }

    #[test]
    fn remove_document() {
        let (source, _dir) = create_test_source();

        let id = source.insert(&json!({"time": "2024-01-01"})).unwrap();
        assert_eq!(source.scan().unwrap().len(), 1);

        source.remove(&id).unwrap();
        assert!(source.scan().unwrap().is_empty());

        source.remove("never-stored").unwrap();
    }

    #[test]
    fn non_object_rejected() {
        let (source, _dir) = create_test_source();

        let result = source.insert(&json!([1, 2, 3]));
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn empty_collection() {
        let (source, _dir) = create_test_source();
        assert!(source.fetch_all().await.unwrap().is_empty());
        assert_eq!(source.backend(), "rocksdb");
    }

    #[test]
    fn reopen_keeps_documents() {
        let dir = TempDir::new().unwrap();
        {
            let source = RocksSource::open(dir.path()).unwrap();
            source.insert(&json!({"_id": "evt_1", "time": "2024-01-01"})).unwrap();
        }

        let source = RocksSource::open(dir.path()).unwrap();
        let documents = source.scan().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["_id"], json!("evt_1"));
    }

    #[tokio::test]
    async fn secondary_sees_writes_after_open() {
        let (primary, primary_dir) = create_test_source();
        let secondary_dir = TempDir::new().unwrap();
        primary.insert(&json!({"_id": "evt_1", "time": "2024-01-01"})).unwrap();

        let secondary = RocksSource::open_secondary(primary_dir.path(), secondary_dir.path()).unwrap();
        assert!(secondary.is_secondary());
        assert_eq!(secondary.backend(), "rocksdb-secondary");
        assert_eq!(secondary.fetch_all().await.unwrap().len(), 1);

        primary.insert(&json!({"_id": "evt_2", "time": "2024-01-02"})).unwrap();

        let documents = secondary.fetch_all().await.unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents.iter().any(|doc| doc["_id"] == "evt_2"));

        primary.remove("evt_1").unwrap();
        assert_eq!(secondary.fetch_all().await.unwrap().len(), 1);
    }

    #[test]
    fn writer_lock_is_exclusive() {
        let (_primary, dir) = create_test_source();

        let second_writer = RocksSource::open(dir.path());
        assert!(matches!(second_writer, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn secondary_is_read_only() {
        let (_primary, primary_dir) = create_test_source();
        let secondary_dir = TempDir::new().unwrap();
        let secondary = RocksSource::open_secondary(primary_dir.path(), secondary_dir.path()).unwrap();

        let result = secondary.insert(&json!({"time": "2024-01-01"}));
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert!(matches!(secondary.remove("evt_1"), Err(StoreError::Database(_))));
    }

    #[test]
    fn secondary_requires_existing_primary() {
        let missing = TempDir::new().unwrap();
        let secondary_dir = TempDir::new().unwrap();

        let result = RocksSource::open_secondary(
            missing.path().join("absent"),
            secondary_dir.path().to_path_buf(),
        );
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn overlapping_scan_is_skipped() {
        let (source, _dir) = create_test_source();
        source.insert(&json!({"time": "2024-01-01"})).unwrap();

        let in_flight = ScanGuard::acquire(&source.scanning).unwrap();
        let result = source.fetch_all().await;
        assert!(matches!(result, Err(StoreError::Unavailable(msg)) if msg.contains("still running")));

        drop(in_flight);
        assert_eq!(source.fetch_all().await.unwrap().len(), 1);
        assert!(!source.scanning.load(Ordering::Acquire));
    }
}
