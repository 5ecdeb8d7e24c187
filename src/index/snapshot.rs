//! Index snapshots
//!
//! An index is persisted as a single opaque blob so a fresh process can
//! answer queries without re-embedding the codebase.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{IndexedEntry, SemanticIndex};
use crate::error::{ForgeError, ForgeResult};

const SNAPSHOT_VERSION: u32 = 1;

/// Where snapshot blobs live
pub trait SnapshotStore: Send + Sync {
    fn save(&self, blob: &[u8]) -> ForgeResult<()>;

    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> ForgeResult<Option<Vec<u8>>>;

    fn location(&self) -> String;
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    model: &'a str,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: &'a [IndexedEntry],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    model: String,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: Vec<IndexedEntry>,
}

/// Serialize an index into a snapshot blob
pub fn encode(index: &SemanticIndex) -> ForgeResult<Vec<u8>> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        model: index.model(),
        dimension: index.dimension(),
        created_at: Utc::now(),
        entries: index.entries(),
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

/// Restore an index from a snapshot blob
pub fn decode(blob: &[u8]) -> ForgeResult<SemanticIndex> {
    let snapshot: Snapshot = serde_json::from_slice(blob)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(ForgeError::Snapshot(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }
    debug!(
        "Decoded snapshot from {} with {} entries",
        snapshot.created_at,
        snapshot.entries.len()
    );
    SemanticIndex::from_entries(snapshot.model, snapshot.dimension, snapshot.entries)
}

/// Snapshot kept in a single file, replaced atomically on save
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, blob: &[u8]) -> ForgeResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> ForgeResult<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use super::*;

    /// In-process store for tests
    #[derive(Default)]
    pub struct MemorySnapshotStore {
        blob: Mutex<Option<Vec<u8>>>,
    }

    impl SnapshotStore for MemorySnapshotStore {
        fn save(&self, blob: &[u8]) -> ForgeResult<()> {
            *self.blob.lock().unwrap() = Some(blob.to_vec());
            Ok(())
        }

        fn load(&self) -> ForgeResult<Option<Vec<u8>>> {
            Ok(self.blob.lock().unwrap().clone())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CandidateLine;
    use tempfile::TempDir;

    fn sample_index() -> SemanticIndex {
        SemanticIndex::from_entries(
            "hashed-2".to_string(),
            2,
            vec![IndexedEntry {
                line: CandidateLine {
                    file_path: "app/Models/User.php".to_string(),
                    line_number: 42,
                    text: "return $this->hasMany(Post::class)->get();".to_string(),
                },
                embedding: vec![0.6, 0.8],
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_encode_decode_preserves_entries() {
        let index = sample_index();
        let restored = decode(&encode(&index).unwrap()).unwrap();
        assert_eq!(restored.model(), "hashed-2");
        assert_eq!(restored.dimension(), 2);
        assert_eq!(restored.entries()[0].line, index.entries()[0].line);
        assert_eq!(restored.entries()[0].embedding, vec![0.6, 0.8]);
    }

    #[test]
    fn test_blob_is_flat_json() {
        let blob = encode(&sample_index()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["entries"][0]["line_number"], 42);
        assert_eq!(json["entries"][0]["file_path"], "app/Models/User.php");
    }

    #[test]
    fn test_rejects_unknown_version() {
        let blob = br#"{"version":99,"model":"m","dimension":1,"created_at":"2024-01-01T00:00:00Z","entries":[]}"#;
        assert!(matches!(decode(blob), Err(ForgeError::Snapshot(_))));
    }

    #[test]
    fn test_garbage_is_a_snapshot_error() {
        assert!(matches!(decode(b"not json"), Err(ForgeError::Snapshot(_))));
    }

    #[test]
    fn test_file_store_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("cache/index.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("cache/index.json"));
        store.save(b"blob").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(&b"blob"[..]));
        assert!(!dir.path().join("cache/index.tmp").exists());
    }
}
