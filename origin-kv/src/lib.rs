//! Disk-backed key/value store for POST submissions, plus the POST
//! record layout helpers. Backed by `sled`, an embedded
//! ordered B-tree store, chosen as the one place this workspace reaches
//! outside the teacher's own stack: the teacher never persists anything to
//! disk itself, and `sled`'s iterator semantics line up with the cursor-style
//! `first_key`/`next_key` contract the original C implementation built on
//! `ndbm` (see `database.c`'s `dbm_open`/`dbm_store`/`dbm_fetch`).

use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum KvError {
    Open(sled::Error),
    Io(sled::Error),
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvError::Open(e) => write!(f, "failed to open kv store: {e}"),
            KvError::Io(e) => write!(f, "kv store I/O error: {e}"),
        }
    }
}

impl std::error::Error for KvError {}

pub struct KvStore {
    db: sled::Db,
}

impl KvStore {
    /// Create-if-absent, read-write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KvError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            origin_log::warn!("kv store open failed at {:?}: {e}", path.as_ref());
            KvError::Open(e)
        })?;
        Ok(Self { db })
    }

    /// Opens an existing store without creating one and without taking
    /// sled's exclusive write lock, so it can be inspected while a worker
    /// already holds it open. Any write through the returned handle fails.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, KvError> {
        let db = sled::Config::new()
            .path(path.as_ref())
            .read_only(true)
            .open()
            .map_err(|e| {
                origin_log::warn!("kv store read-only open failed at {:?}: {e}", path.as_ref());
                KvError::Open(e)
            })?;
        Ok(Self { db })
    }

    /// Overwrite semantics: a record with an existing key is replaced.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.db.insert(key, value).map_err(|e| {
            origin_log::warn!("kv store put failed: {e}");
            KvError::Io(e)
        })?;
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        let value = self.db.get(key).map_err(|e| {
            origin_log::warn!("kv store get failed: {e}");
            KvError::Io(e)
        })?;
        Ok(value.map(|v| v.to_vec()))
    }

    /// First key in iteration order, or `None` if the store is empty.
    pub fn first_key(&self) -> Option<Vec<u8>> {
        self.db.iter().next().and_then(Result::ok).map(|(k, _)| k.to_vec())
    }

    /// Key immediately after `key` in iteration order, or `None` at the end.
    pub fn next_key(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.db
            .range((std::ops::Bound::Excluded(key.to_vec()), std::ops::Bound::Unbounded))
            .next()
            .and_then(Result::ok)
            .map(|(k, _)| k.to_vec())
    }

    /// Iterate every key in store order, oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.db.iter().filter_map(Result::ok).map(|(k, _)| k.to_vec())
    }

    /// Idempotent; flushes to disk and drops the handle. `Drop` alone
    /// already flushes, but an explicit call lets a caller observe a flush
    /// failure rather than losing it silently.
    pub fn close(self) -> Result<(), KvError> {
        self.db.flush().map_err(|e| {
            origin_log::warn!("kv store flush on close failed: {e}");
            KvError::Io(e)
        })?;
        Ok(())
    }
}

/// Builds the record set for one POST submission: one
/// `"<submission_id>.<key>"` record per field plus a trailing
/// `"<submission_id>.keys"` commit marker, written last.
pub fn write_submission(
    store: &KvStore,
    submission_id: &str,
    fields: &[(String, String)],
) -> Result<(), KvError> {
    for (key, value) in fields {
        let record_key = format!("{submission_id}.{key}");
        store.put(record_key.as_bytes(), value.as_bytes())?;
    }
    let keys_list = fields
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let keys_record = format!("{submission_id}.keys");
    store.put(keys_record.as_bytes(), keys_list.as_bytes())?;
    Ok(())
}

/// Reads back a committed submission's fields in the order recorded by its
/// `.keys` record. Returns `None` if the commit marker is absent — an
/// uncommitted submission must be treated as not present.
pub fn read_submission(store: &KvStore, submission_id: &str) -> Result<Option<Vec<(String, String)>>, KvError> {
    let keys_record = format!("{submission_id}.keys");
    let Some(raw_keys) = store.get(keys_record.as_bytes())? else {
        return Ok(None);
    };
    let keys_list = String::from_utf8_lossy(&raw_keys);
    let mut fields = Vec::new();
    for key in keys_list.split(',').filter(|k| !k.is_empty()) {
        let record_key = format!("{submission_id}.{key}");
        let value = store
            .get(record_key.as_bytes())?
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .unwrap_or_default();
        fields.push((key.to_string(), value));
    }
    Ok(Some(fields))
}

/// Lists every distinct submission id that has a committed `.keys` record,
/// in store order. Used by the offline query tool's `-l` option.
pub fn list_submissions(store: &KvStore) -> Vec<String> {
    store
        .keys()
        .filter_map(|k| String::from_utf8(k).ok())
        .filter_map(|k| k.strip_suffix(".keys").map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (KvStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path().join("kv")).unwrap();
        (store, dir)
    }

    #[test]
    fn put_get_roundtrip() {
        let (store, _dir) = open_temp();
        store.put(b"post_1.name", b"alice").unwrap();
        assert_eq!(store.get(b"post_1.name").unwrap(), Some(b"alice".to_vec()));
        assert_eq!(store.get(b"post_1.missing").unwrap(), None);
    }

    #[test]
    fn put_overwrites_existing_key() {
        let (store, _dir) = open_temp();
        store.put(b"k", b"first").unwrap();
        store.put(b"k", b"second").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn submission_records_match_scenario_5() {
        let (store, _dir) = open_temp();
        let fields = vec![
            ("name".to_string(), "alice".to_string()),
            ("age".to_string(), "30".to_string()),
        ];
        write_submission(&store, "post_1700000000", &fields).unwrap();

        assert_eq!(
            store.get(b"post_1700000000.name").unwrap(),
            Some(b"alice".to_vec())
        );
        assert_eq!(
            store.get(b"post_1700000000.age").unwrap(),
            Some(b"30".to_vec())
        );
        assert_eq!(
            store.get(b"post_1700000000.keys").unwrap(),
            Some(b"name,age".to_vec())
        );
    }

    #[test]
    fn read_submission_returns_none_without_commit_marker() {
        let (store, _dir) = open_temp();
        store.put(b"post_5.name", b"bob").unwrap();
        assert_eq!(read_submission(&store, "post_5").unwrap(), None);
    }

    #[test]
    fn list_submissions_finds_committed_ids() {
        let (store, _dir) = open_temp();
        write_submission(&store, "post_1", &[("a".to_string(), "1".to_string())]).unwrap();
        write_submission(&store, "post_2", &[("b".to_string(), "2".to_string())]).unwrap();
        let mut ids = list_submissions(&store);
        ids.sort();
        assert_eq!(ids, vec!["post_1".to_string(), "post_2".to_string()]);
    }
}
