use crate::error::{AppError, Result};
use crate::models::{Group, Song, SongDetails, SongInfo};
use crate::services::song_filter::SongFilter;
use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

/// Runs `f` inside a transaction: commit on `Ok`, roll back on `Err`.
///
/// If `f` panics the transaction is dropped mid-unwind, and sqlx rolls back
/// any transaction that is dropped without being committed.
pub async fn with_transaction<T, F>(db: &PgPool, f: F) -> Result<T>
where
    T: Send,
    F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, Result<T>>,
{
    let mut tx = db
        .begin()
        .await
        .map_err(AppError::storage("failed to start transaction"))?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(AppError::storage("failed to commit transaction"))?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed after '{}': {}", e, rollback_err);
            } else {
                tracing::warn!("Transaction rolled back: {}", e);
            }
            Err(e)
        }
    }
}

pub struct SongRepository {
    db: PgPool,
}

impl SongRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    pub async fn list_songs(&self, filter: &SongFilter) -> Result<Vec<Song>> {
        let mut query = filter.build_query();
        let songs = query
            .build_query_as::<Song>()
            .fetch_all(&self.db)
            .await
            .map_err(AppError::storage("error executing query"))?;

        tracing::debug!("Listed {} songs", songs.len());
        Ok(songs)
    }

    pub async fn get_lyrics_by_song_id(&self, song_id: i32) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT text FROM song_details WHERE song_id = $1")
            .bind(song_id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::storage("error scanning song text"))
    }

    /// Deleting an id that does not exist is not an error. Returns the number
    /// of songs removed.
    pub async fn delete_song(&self, song_id: i32) -> Result<u64> {
        let result = sqlx::query("DELETE FROM songs WHERE id = $1")
            .bind(song_id)
            .execute(&self.db)
            .await
            .map_err(AppError::storage("error deleting song"))?;

        Ok(result.rows_affected())
    }

    pub async fn get_group_id_by_name(&self, name: &str) -> Result<Option<i32>> {
        sqlx::query_scalar("SELECT id FROM groups WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::storage("error scanning group"))
    }

    pub async fn create_group(&self, name: &str) -> Result<Group> {
        sqlx::query_as::<_, Group>("INSERT INTO groups (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::storage("error inserting group"))
    }

    /// Get-or-create by name. A concurrent request can insert the same group
    /// between our lookup and insert; the unique constraint rejects the second
    /// insert and we pick up the id the other request created.
    pub async fn resolve_group(&self, name: &str) -> Result<i32> {
        if let Some(id) = self.get_group_id_by_name(name).await? {
            return Ok(id);
        }

        match self.create_group(name).await {
            Ok(group) => {
                tracing::info!("Created group '{}' ({})", group.name, group.id);
                Ok(group.id)
            }
            Err(e) if e.is_unique_violation() => {
                tracing::warn!("Group '{}' was created concurrently, re-fetching", name);
                self.get_group_id_by_name(name)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("no such group: {}", name)))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_song_by_id(&self, song_id: i32) -> Result<Option<Song>> {
        sqlx::query_as::<_, Song>("SELECT id, name, group_id FROM songs WHERE id = $1")
            .bind(song_id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::storage("error scanning song"))
    }

    pub async fn get_song_details_by_id(&self, song_id: i32) -> Result<Option<SongDetails>> {
        sqlx::query_as::<_, SongDetails>(
            "SELECT id, song_id, release_date, text, link FROM song_details WHERE song_id = $1",
        )
        .bind(song_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::storage("error scanning song details"))
    }

    pub async fn update_song(&self, song: Song, details: SongDetails) -> Result<()> {
        with_transaction(&self.db, move |tx| {
            Box::pin(async move {
                sqlx::query("UPDATE songs SET name = $1, group_id = $2 WHERE id = $3")
                    .bind(&song.name)
                    .bind(song.group_id)
                    .bind(song.id)
                    .execute(&mut **tx)
                    .await
                    .map_err(AppError::storage("error updating song"))?;

                sqlx::query(
                    "UPDATE song_details SET release_date = $1, text = $2, link = $3 WHERE song_id = $4",
                )
                .bind(details.release_date)
                .bind(&details.text)
                .bind(&details.link)
                .bind(details.song_id)
                .execute(&mut **tx)
                .await
                .map_err(AppError::storage("error updating song_details"))?;

                Ok(())
            })
        })
        .await
    }

    /// Inserts the song and its details atomically and returns the stored song.
    pub async fn create_song_with_details(
        &self,
        name: String,
        group_id: i32,
        info: SongInfo,
    ) -> Result<Song> {
        with_transaction(&self.db, move |tx| {
            Box::pin(async move {
                let song = sqlx::query_as::<_, Song>(
                    "INSERT INTO songs (name, group_id) VALUES ($1, $2) RETURNING id, name, group_id",
                )
                .bind(&name)
                .bind(group_id)
                .fetch_one(&mut **tx)
                .await
                .map_err(AppError::storage("failed to insert song"))?;

                sqlx::query(
                    "INSERT INTO song_details (song_id, release_date, text, link) VALUES ($1, $2, $3, $4)",
                )
                .bind(song.id)
                .bind(info.release_date)
                .bind(&info.text)
                .bind(&info.link)
                .execute(&mut **tx)
                .await
                .map_err(AppError::storage("failed to insert song details"))?;

                Ok(song)
            })
        })
        .await
    }
}
