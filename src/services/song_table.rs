use crate::entities::songs;
use crate::models::NewSong;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by the metadata table. `message` is the store's own text.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TableError {
    pub message: String,
}

impl From<sea_orm::DbErr> for TableError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

#[async_trait]
pub trait SongTable: Send + Sync {
    async fn insert(&self, song: NewSong) -> Result<songs::Model, TableError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<songs::Model>, TableError>;
}

pub struct SeaOrmSongTable {
    db: DatabaseConnection,
}

impl SeaOrmSongTable {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SongTable for SeaOrmSongTable {
    async fn insert(&self, song: NewSong) -> Result<songs::Model, TableError> {
        let record = songs::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(song.user_id),
            author: Set(song.author),
            title: Set(song.title),
            song_path: Set(song.song_path),
            image_path: Set(song.image_path),
            created_at: Set(Some(Utc::now())),
        };

        Ok(record.insert(&self.db).await?)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<songs::Model>, TableError> {
        Ok(songs::Entity::find()
            .filter(songs::Column::UserId.eq(user_id))
            .order_by_desc(songs::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;

    async fn setup_table() -> SeaOrmSongTable {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::infrastructure::database::create_schema(&db)
            .await
            .unwrap();
        SeaOrmSongTable::new(db)
    }

    fn new_song(user_id: &str, title: &str) -> NewSong {
        NewSong {
            user_id: user_id.to_string(),
            title: title.to_string(),
            author: "Artist B".to_string(),
            song_path: format!("song-{}-k", title),
            image_path: format!("image-{}-k", title),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let table = setup_table().await;

        let saved = table.insert(new_song("u1", "Song A")).await.unwrap();
        assert_eq!(saved.user_id, "u1");
        assert_eq!(saved.song_path, "song-Song A-k");
        assert!(saved.created_at.is_some());

        table.insert(new_song("u2", "Other")).await.unwrap();

        let songs = table.list_for_user("u1").await.unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, saved.id);
    }

    #[tokio::test]
    async fn test_insert_error_carries_store_message() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        // No schema: the insert fails inside the database.
        let table = SeaOrmSongTable::new(db);
        let err = table.insert(new_song("u1", "Song A")).await.unwrap_err();
        assert!(err.message.contains("songs"), "unexpected message: {}", err.message);
    }
}
