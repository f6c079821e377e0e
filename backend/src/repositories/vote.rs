//! Vote repository for database operations
//!
//! A vote is a user's current like/dislike stance on one target. The
//! `votes` table carries a unique index on (user_id, target_id,
//! target_type), so "at most one vote per user per target" is a
//! storage invariant, not a hope pinned on read-then-write sequencing.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::fmt;
use uuid::Uuid;

/// What a vote is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Video,
    Comment,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Video => "video",
            TargetType::Comment => "comment",
        }
    }

    /// Table holding the target entity and its engagement counters
    pub fn table(&self) -> &'static str {
        match self {
            TargetType::Video => "videos",
            TargetType::Comment => "comments",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "video" => Some(TargetType::Video),
            "comment" => Some(TargetType::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Like or dislike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Like => "like",
            VoteKind::Dislike => "dislike",
        }
    }

    /// The denormalized counter column this kind feeds
    pub fn counter_column(&self) -> &'static str {
        match self {
            VoteKind::Like => "likes_count",
            VoteKind::Dislike => "dislikes_count",
        }
    }

    /// The other kind
    pub fn opposite(&self) -> Self {
        match self {
            VoteKind::Like => VoteKind::Dislike,
            VoteKind::Dislike => VoteKind::Like,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(VoteKind::Like),
            "dislike" => Some(VoteKind::Dislike),
            _ => None,
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vote record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub target_type: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl VoteRecord {
    pub fn vote_kind(&self) -> Option<VoteKind> {
        VoteKind::parse(&self.kind)
    }
}

/// Vote repository for database operations
///
/// The mutating operations take a live transaction connection so the
/// caller can commit the vote row and its counter adjustment as one
/// atomic unit.
pub struct VoteRepository;

impl VoteRepository {
    /// Find a user's vote on a target, locking the row for the rest of
    /// the transaction
    pub async fn find_for_update(
        conn: &mut PgConnection,
        user_id: Uuid,
        target_id: Uuid,
        target_type: TargetType,
    ) -> Result<Option<VoteRecord>> {
        let vote = sqlx::query_as::<_, VoteRecord>(
            r#"
            SELECT id, user_id, target_id, target_type, kind, created_at
            FROM votes
            WHERE user_id = $1 AND target_id = $2 AND target_type = $3
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(target_id)
        .bind(target_type.as_str())
        .fetch_optional(conn)
        .await?;

        Ok(vote)
    }

    /// Find a user's vote on a target (read-only)
    pub async fn find_by_user_and_target(
        pool: &PgPool,
        user_id: Uuid,
        target_id: Uuid,
        target_type: TargetType,
    ) -> Result<Option<VoteRecord>> {
        let vote = sqlx::query_as::<_, VoteRecord>(
            r#"
            SELECT id, user_id, target_id, target_type, kind, created_at
            FROM votes
            WHERE user_id = $1 AND target_id = $2 AND target_type = $3
            "#,
        )
        .bind(user_id)
        .bind(target_id)
        .bind(target_type.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(vote)
    }

    /// Insert a new vote; fails with a unique violation if a concurrent
    /// request already inserted one for the same (user, target)
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Uuid,
        target_id: Uuid,
        target_type: TargetType,
        kind: VoteKind,
    ) -> Result<VoteRecord, sqlx::Error> {
        sqlx::query_as::<_, VoteRecord>(
            r#"
            INSERT INTO votes (user_id, target_id, target_type, kind)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, target_id, target_type, kind, created_at
            "#,
        )
        .bind(user_id)
        .bind(target_id)
        .bind(target_type.as_str())
        .bind(kind.as_str())
        .fetch_one(conn)
        .await
    }

    /// Change the kind of an existing vote in place
    ///
    /// The kind is the only mutable field of a vote; nothing else is
    /// ever updatable.
    pub async fn update_kind(
        conn: &mut PgConnection,
        vote_id: Uuid,
        kind: VoteKind,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE votes SET kind = $2 WHERE id = $1
            "#,
        )
        .bind(vote_id)
        .bind(kind.as_str())
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete a vote (retraction)
    pub async fn delete(conn: &mut PgConnection, vote_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM votes WHERE id = $1
            "#,
        )
        .bind(vote_id)
        .execute(conn)
        .await?;

        Ok(())
    }
}
