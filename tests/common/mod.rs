#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use song_upload::entities::songs;
use song_upload::models::{FileUpload, NewSong, SessionUser, UploadForm};
use song_upload::services::keys::KeyGenerator;
use song_upload::services::notify::ViewRefresher;
use song_upload::services::song_table::{SongTable, TableError};
use song_upload::services::storage::{ObjectStore, StorageError, StoredObject, UploadOptions};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload {
        bucket: String,
        key: String,
        options: UploadOptions,
    },
    Delete {
        bucket: String,
        path: String,
    },
    Insert(NewSong),
}

/// Shared, ordered log of every remote call made by the workflow.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<Call>>,
}

impl CallLog {
    pub fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload { bucket, key, .. } => Some((bucket, key)),
                _ => None,
            })
            .collect()
    }

    pub fn inserts(&self) -> Vec<NewSong> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Insert(song) => Some(song),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { bucket, path } => Some((bucket, path)),
                _ => None,
            })
            .collect()
    }
}

/// In-memory object store. Stored paths are the requested key under a
/// `stored/` prefix so callers can tell returned paths from local keys.
pub struct MockObjectStore {
    log: Arc<CallLog>,
    objects: Mutex<HashMap<(String, String), Bytes>>,
    failing_buckets: Mutex<HashSet<String>>,
    panic_on_upload: bool,
    gate: Option<Arc<Semaphore>>,
}

impl MockObjectStore {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            objects: Mutex::new(HashMap::new()),
            failing_buckets: Mutex::new(HashSet::new()),
            panic_on_upload: false,
            gate: None,
        }
    }

    pub fn failing(log: Arc<CallLog>, bucket: &str) -> Self {
        let store = Self::new(log);
        store.failing_buckets.lock().unwrap().insert(bucket.to_string());
        store
    }

    pub fn panicking(log: Arc<CallLog>) -> Self {
        Self {
            panic_on_upload: true,
            ..Self::new(log)
        }
    }

    /// Every upload waits for one permit from `gate`.
    pub fn gated(log: Arc<CallLog>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(log)
        }
    }

    pub fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError> {
        self.log.push(Call::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            options: options.clone(),
        });

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        if self.panic_on_upload {
            panic!("storage client blew up");
        }

        if self.failing_buckets.lock().unwrap().contains(bucket) {
            return Err(StorageError::UploadFailed("connection reset by peer".to_string()));
        }

        let path = format!("stored/{}", key);
        let mut objects = self.objects.lock().unwrap();
        let slot = (bucket.to_string(), path.clone());
        if objects.contains_key(&slot) && !options.upsert {
            return Err(StorageError::AlreadyExists {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        objects.insert(slot, data);

        Ok(StoredObject { path })
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.log.push(Call::Delete {
            bucket: bucket.to_string(),
            path: path.to_string(),
        });
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }

    async fn check_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        if self.failing_buckets.lock().unwrap().contains(bucket) {
            return Err(StorageError::BucketUnavailable(bucket.to_string()));
        }
        Ok(())
    }
}

pub struct MockSongTable {
    log: Arc<CallLog>,
    rows: Mutex<Vec<songs::Model>>,
    failure: Option<String>,
}

impl MockSongTable {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            rows: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn failing(log: Arc<CallLog>, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(log)
        }
    }
}

#[async_trait]
impl SongTable for MockSongTable {
    async fn insert(&self, song: NewSong) -> Result<songs::Model, TableError> {
        self.log.push(Call::Insert(song.clone()));

        if let Some(message) = &self.failure {
            return Err(TableError {
                message: message.clone(),
            });
        }

        let mut rows = self.rows.lock().unwrap();
        let row = songs::Model {
            id: format!("song-{}", rows.len() + 1),
            user_id: song.user_id,
            author: song.author,
            title: song.title,
            song_path: song.song_path,
            image_path: song.image_path,
            created_at: Some(Utc::now()),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<songs::Model>, TableError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Hands out `k1`, `k2`, ... so tests can predict object keys.
#[derive(Default)]
pub struct SequentialKeys {
    next: AtomicUsize,
}

impl KeyGenerator for SequentialKeys {
    fn next_key(&self) -> String {
        format!("k{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Always returns the same key.
pub struct FixedKey(pub &'static str);

impl KeyGenerator for FixedKey {
    fn next_key(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Default)]
pub struct RecordingRefresher {
    refreshed: Mutex<Vec<String>>,
}

impl RecordingRefresher {
    pub fn refreshed(&self) -> Vec<String> {
        self.refreshed.lock().unwrap().clone()
    }
}

impl ViewRefresher for RecordingRefresher {
    fn refresh(&self, user: &SessionUser) {
        self.refreshed.lock().unwrap().push(user.id.clone());
    }
}

pub fn mp3() -> FileUpload {
    FileUpload::new(
        "track.mp3",
        Some("audio/mpeg".to_string()),
        Bytes::from_static(b"ID3\x04\x00\x00\x00\x00\x00\x00fake-frames"),
    )
}

pub fn jpg() -> FileUpload {
    FileUpload::new(
        "cover.jpg",
        Some("image/jpeg".to_string()),
        Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']),
    )
}

pub fn song_a_form() -> UploadForm {
    UploadForm {
        title: "Song A".to_string(),
        author: "Artist B".to_string(),
        song: Some(mp3()),
        image: Some(jpg()),
    }
}
