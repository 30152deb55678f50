use async_trait::async_trait;
use time::Date;

use crate::{
    application::repos::{PageRequest, RepoError, SongsRepo, SongsWriteRepo},
    domain::{
        songs::{Song, SongField},
        verses::paginate_verses,
    },
};

use super::{
    PostgresRepositories,
    clause::{ClauseKind, bind_query, bind_query_as, build_clause},
    map_sqlx_error, rollback_or_abort,
};

const SONG_COLUMNS: &str = "id, group_name, song_name, release_date, song_text, link";

#[derive(sqlx::FromRow)]
struct SongRow {
    id: i64,
    group_name: String,
    song_name: String,
    release_date: Option<Date>,
    song_text: String,
    link: String,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Self {
            id: row.id,
            group_name: row.group_name,
            song_name: row.song_name,
            text: row.song_text,
            release_date: row.release_date,
            link: row.link,
        }
    }
}

#[async_trait]
impl SongsRepo for PostgresRepositories {
    async fn get_all_songs(&self) -> Result<Vec<Song>, RepoError> {
        let sql = format!("SELECT {SONG_COLUMNS} FROM songs ORDER BY id");
        self.bounded("get_all_songs", async {
            let rows = sqlx::query_as::<_, SongRow>(&sql)
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;
            Ok(rows.into_iter().map(Song::from).collect())
        })
        .await
    }

    async fn get_songs(
        &self,
        filter: &Song,
        page: PageRequest,
        fields: &[SongField],
    ) -> Result<Vec<Song>, RepoError> {
        let clause = build_clause(ClauseKind::Where, filter, fields);
        let offset_at = clause.next_placeholder();

        let mut sql = format!("SELECT {SONG_COLUMNS} FROM songs");
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause.sql);
        }
        sql.push_str(&format!(
            " ORDER BY id OFFSET ${} LIMIT ${}",
            offset_at,
            offset_at + 1
        ));

        self.bounded("get_songs", async {
            let rows = bind_query_as(sqlx::query_as::<_, SongRow>(&sql), &clause.args)
                .bind(page.offset())
                .bind(i64::from(page.limit))
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;
            Ok(rows.into_iter().map(Song::from).collect())
        })
        .await
    }

    async fn get_verses(&self, id: i64, verse: u32, limit: u32) -> Result<String, RepoError> {
        self.bounded("get_verses", async {
            let text: Option<String> =
                sqlx::query_scalar("SELECT song_text FROM songs WHERE id = $1")
                    .bind(id)
                    .fetch_optional(self.pool())
                    .await
                    .map_err(map_sqlx_error)?;
            let text = text.ok_or(RepoError::NotFound)?;
            Ok(paginate_verses(&text, verse as usize, limit as usize))
        })
        .await
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.bounded("health_check", async {
            PostgresRepositories::health_check(self)
                .await
                .map_err(map_sqlx_error)
        })
        .await
    }
}

#[async_trait]
impl SongsWriteRepo for PostgresRepositories {
    async fn add_song(&self, song: &Song) -> Result<i64, RepoError> {
        self.bounded("add_song", async {
            let mut tx = self.begin().await.map_err(map_sqlx_error)?;
            let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
                r#"
                INSERT INTO songs (group_name, song_name, release_date, song_text, link)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(&song.group_name)
            .bind(&song.song_name)
            .bind(song.release_date)
            .bind(&song.text)
            .bind(&song.link)
            .fetch_one(&mut *tx)
            .await;

            match inserted {
                Ok(id) => {
                    tx.commit().await.map_err(map_sqlx_error)?;
                    Ok(id)
                }
                Err(err) => {
                    rollback_or_abort(tx, "add_song").await;
                    Err(map_sqlx_error(err))
                }
            }
        })
        .await
    }

    async fn update_song(&self, song: &Song, fields: &[SongField]) -> Result<u64, RepoError> {
        if fields.contains(&SongField::Id) {
            return Err(RepoError::InvalidInput {
                message: "song id cannot be updated".to_string(),
            });
        }

        let clause = build_clause(ClauseKind::Set, song, fields);
        if clause.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE songs {} WHERE id=${}",
            clause.sql,
            clause.next_placeholder()
        );

        self.bounded("update_song", async {
            let mut tx = self.begin().await.map_err(map_sqlx_error)?;
            let updated = bind_query(sqlx::query(&sql), &clause.args)
                .bind(song.id)
                .execute(&mut *tx)
                .await;

            match updated {
                Ok(done) => {
                    tx.commit().await.map_err(map_sqlx_error)?;
                    Ok(done.rows_affected())
                }
                Err(err) => {
                    rollback_or_abort(tx, "update_song").await;
                    Err(map_sqlx_error(err))
                }
            }
        })
        .await
    }

    async fn delete_song(&self, id: i64) -> Result<(), RepoError> {
        self.bounded("delete_song", async {
            let mut tx = self.begin().await.map_err(map_sqlx_error)?;
            let deleted = sqlx::query("DELETE FROM songs WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await;

            match deleted {
                Ok(done) if done.rows_affected() == 0 => {
                    rollback_or_abort(tx, "delete_song").await;
                    Err(RepoError::NoRowsAffected)
                }
                Ok(_) => {
                    tx.commit().await.map_err(map_sqlx_error)?;
                    Ok(())
                }
                Err(err) => {
                    rollback_or_abort(tx, "delete_song").await;
                    Err(map_sqlx_error(err))
                }
            }
        })
        .await
    }
}
