use crate::entities::songs;
use crate::models::SessionUser;
use crate::services::notify::ViewRefresher;
use crate::services::song_table::{SongTable, TableError};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_MAX_USERS: usize = 10_000;

/// One user's slot. `songs` is empty while the first load is in flight.
struct CachedSongs {
    generation: u64,
    songs: Option<Arc<Vec<songs::Model>>>,
}

/// Per-user cache of the song list view.
///
/// Entries are loaded on first read and dropped whenever a refresh is
/// requested for that user. A load only lands if its slot still carries the
/// generation it started with, so a read racing an upload can never restore
/// the pre-upload list. At most `max_users` slots are kept; starting a load
/// for a new user past that bound evicts another user's slot.
pub struct SongListCache {
    table: Arc<dyn SongTable>,
    entries: DashMap<String, CachedSongs>,
    generations: AtomicU64,
    max_users: usize,
}

impl SongListCache {
    pub fn new(table: Arc<dyn SongTable>) -> Self {
        Self::with_max_users(table, DEFAULT_MAX_USERS)
    }

    pub fn with_max_users(table: Arc<dyn SongTable>, max_users: usize) -> Self {
        Self {
            table,
            entries: DashMap::new(),
            generations: AtomicU64::new(0),
            max_users: max_users.max(1),
        }
    }

    pub async fn songs_for(&self, user: &SessionUser) -> Result<Arc<Vec<songs::Model>>, TableError> {
        let cached = self
            .entries
            .get(&user.id)
            .map(|entry| (entry.generation, entry.songs.clone()));

        let generation = match cached {
            Some((_, Some(songs))) => return Ok(songs),
            Some((generation, None)) => generation,
            None => self.open_slot(&user.id),
        };

        let songs = Arc::new(self.table.list_for_user(&user.id).await?);

        if let Some(mut entry) = self.entries.get_mut(&user.id) {
            if entry.generation == generation {
                entry.songs = Some(songs.clone());
            } else {
                tracing::debug!("Discarding stale song list load for user {}", user.id);
            }
        }

        Ok(songs)
    }

    pub fn is_cached(&self, user: &SessionUser) -> bool {
        self.entries
            .get(&user.id)
            .is_some_and(|entry| entry.songs.is_some())
    }

    fn open_slot(&self, user_id: &str) -> u64 {
        if self.entries.len() >= self.max_users {
            let victim = self
                .entries
                .iter()
                .map(|entry| entry.key().clone())
                .find(|key| key != user_id);
            if let Some(victim) = victim {
                self.entries.remove(&victim);
                tracing::debug!("Song list cache full, evicted user {}", victim);
            }
        }

        let fresh = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries
            .entry(user_id.to_string())
            .or_insert_with(|| CachedSongs {
                generation: fresh,
                songs: None,
            })
            .generation
    }
}

impl ViewRefresher for SongListCache {
    fn refresh(&self, user: &SessionUser) {
        if self.entries.remove(&user.id).is_some() {
            tracing::debug!("Song list cache invalidated for user {}", user.id);
        }
    }
}
