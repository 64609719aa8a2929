use uuid::Uuid;

/// Source of per-attempt unique keys used to namespace storage objects.
pub trait KeyGenerator: Send + Sync {
    fn next_key(&self) -> String;
}

/// Random UUID v4 in its 32-character simple form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn next_key(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Object keys for one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKeys {
    pub song: String,
    pub image: String,
}

impl ObjectKeys {
    pub fn new(title: &str, unique_key: &str) -> Self {
        Self {
            song: format!("song-{}-{}", title, unique_key),
            image: format!("image-{}-{}", title, unique_key),
        }
    }
}
