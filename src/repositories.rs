use crate::{
    db::{DbPool, MEMES_TABLE},
    domain::MemeRepository,
    errors::RepoError,
    models::{Meme, NewMeme},
};
use anyhow::Context;
use async_trait::async_trait;
use rusqlite::{named_params, Connection, OptionalExtension};
use tracing::{self, info};

#[derive(Debug, Clone)]
pub struct SqliteMemeRepository {
    pool: DbPool,
}

impl SqliteMemeRepository {
    pub fn new(pool: DbPool) -> Self {
        info!(table_name = MEMES_TABLE, "Initializing SqliteMemeRepository");
        Self { pool }
    }

    /// Runs `f` on a pooled connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, RepoError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, RepoError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .context("SQLite: Failed to get connection from pool")?;
            f(&mut conn)
        })
        .await
        .context("SQLite: Blocking task failed")?
    }
}

#[async_trait]
impl MemeRepository for SqliteMemeRepository {
    async fn insert(&self, meme: NewMeme) -> Result<Meme, RepoError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().context("SQLite: Failed to begin transaction")?;
            tx.execute(
                "INSERT INTO memes (title, image_url, description)
                 VALUES (:title, :image_url, :description)",
                named_params! {
                    ":title": &meme.title,
                    ":image_url": &meme.image_url,
                    ":description": &meme.description,
                },
            )
            .with_context(|| format!("SQLite: Failed to insert meme '{}'", meme.title))?;
            let id = tx.last_insert_rowid();
            tx.commit().context("SQLite: Failed to commit insert")?;

            tracing::debug!(meme_id = id, "SQLite: Inserted meme");
            Ok(Meme {
                id,
                title: meme.title,
                image_url: meme.image_url,
                description: meme.description,
            })
        })
        .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Meme>, RepoError> {
        self.with_conn(move |conn| {
            let meme = conn
                .query_row(
                    "SELECT id, title, image_url, description FROM memes WHERE id = :id",
                    named_params! { ":id": id },
                    row_to_meme,
                )
                .optional()
                .with_context(|| format!("SQLite: Failed to get meme (id: {})", id))?;
            Ok(meme)
        })
        .await
    }

    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Meme>, RepoError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, title, image_url, description FROM memes
                     ORDER BY id ASC LIMIT :limit OFFSET :offset",
                )
                .context("SQLite: Failed to prepare list query")?;
            let memes = stmt
                .query_map(named_params! { ":limit": limit, ":offset": offset }, row_to_meme)
                .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
                .context("SQLite: Failed to list memes")?;

            tracing::debug!(offset, limit, count = memes.len(), "SQLite: Listed memes");
            Ok(memes)
        })
        .await
    }

    async fn update(&self, meme: &Meme) -> Result<(), RepoError> {
        let meme = meme.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction().context("SQLite: Failed to begin transaction")?;
            let changed = tx
                .execute(
                    "UPDATE memes SET title = :title, image_url = :image_url,
                     description = :description WHERE id = :id",
                    named_params! {
                        ":id": meme.id,
                        ":title": &meme.title,
                        ":image_url": &meme.image_url,
                        ":description": &meme.description,
                    },
                )
                .with_context(|| format!("SQLite: Failed to update meme (id: {})", meme.id))?;
            if changed == 0 {
                return Err(RepoError::NotFound(meme.id));
            }
            tx.commit().context("SQLite: Failed to commit update")?;

            tracing::debug!(meme_id = meme.id, "SQLite: Updated meme");
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().context("SQLite: Failed to begin transaction")?;
            let changed = tx
                .execute("DELETE FROM memes WHERE id = :id", named_params! { ":id": id })
                .with_context(|| format!("SQLite: Failed to delete meme (id: {})", id))?;
            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
            tx.commit().context("SQLite: Failed to commit delete")?;

            tracing::debug!(meme_id = id, "SQLite: Deleted meme");
            Ok(())
        })
        .await
    }
}

// Expects columns in order: id, title, image_url, description.
fn row_to_meme(row: &rusqlite::Row) -> rusqlite::Result<Meme> {
    Ok(Meme {
        id: row.get(0)?,
        title: row.get(1)?,
        image_url: row.get(2)?,
        description: row.get(3)?,
    })
}
