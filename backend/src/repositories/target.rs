//! Engagement target repository
//!
//! Targets (videos, comments) are owned by their own CRUD layer; the
//! engagement ledger only needs two things from them: an existence
//! check and atomic, floored adjustments of the denormalized like and
//! dislike counters.

use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::vote::{TargetType, VoteKind};

/// Repository over the counter fields of vote targets
pub struct TargetRepository;

impl TargetRepository {
    /// Check that the target entity exists
    pub async fn exists(pool: &PgPool, target_type: TargetType, id: Uuid) -> Result<bool> {
        // Table name comes from a closed enum, never from user input
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            target_type.table()
        );

        let found = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(found)
    }

    /// Apply a relative delta to one engagement counter, floored at
    /// zero, as part of the caller's transaction
    ///
    /// The delta is applied by the database in a single statement; the
    /// counter value is never read into application code, which is what
    /// rules out lost updates between concurrent voters.
    pub async fn apply_counter_delta(
        conn: &mut PgConnection,
        target_type: TargetType,
        id: Uuid,
        kind: VoteKind,
        delta: i64,
    ) -> Result<()> {
        let column = kind.counter_column();
        let sql = format!(
            "UPDATE {table} SET {column} = GREATEST({column} + $2, 0) WHERE id = $1",
            table = target_type.table(),
            column = column,
        );

        sqlx::query(&sql)
            .bind(id)
            .bind(delta)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Read the current counters of a target (tests and diagnostics)
    pub async fn counters(
        pool: &PgPool,
        target_type: TargetType,
        id: Uuid,
    ) -> Result<Option<(i64, i64)>> {
        let sql = format!(
            "SELECT likes_count, dislikes_count FROM {} WHERE id = $1",
            target_type.table()
        );

        let counters = sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(counters)
    }
}
