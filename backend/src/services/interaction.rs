//! Engagement ledger: like/dislike votes with denormalized counters
//!
//! Each (user, target) pair is a 3-state machine:
//! NoVote ⇄ Liked ⇄ Disliked. Repeating the current vote retracts it;
//! the opposite vote switches it in place. Counter adjustments commit
//! in the same transaction as the vote row, so the two can never
//! diverge, and the unique index on (user_id, target_id, target_type)
//! resolves concurrent first-votes (the loser retries and lands in the
//! retract branch).

use crate::error::ApiError;
use crate::repositories::{TargetRepository, TargetType, VoteKind, VoteRepository};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;
use vidstream_shared::LikeStatusResponse;

/// Outcome of a cast vote, reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No prior vote existed; one was recorded
    Recorded,
    /// The same vote existed; it was removed (toggle-off)
    Retracted,
    /// The opposite vote existed; its kind was switched in place
    Switched,
}

impl VoteOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            VoteOutcome::Recorded => "Recorded",
            VoteOutcome::Retracted => "Retracted",
            VoteOutcome::Switched => "Switched",
        }
    }
}

/// Row operation the transition calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOp {
    Insert,
    Delete,
    SwitchKind,
}

/// A planned vote transition: the row operation plus the exact counter
/// deltas, computed from current state before anything is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VotePlan {
    outcome: VoteOutcome,
    op: RowOp,
    like_delta: i64,
    dislike_delta: i64,
}

impl VotePlan {
    /// Pure transition function of the vote state machine
    fn plan(existing: Option<VoteKind>, requested: VoteKind) -> Self {
        let (outcome, op) = match existing {
            None => (VoteOutcome::Recorded, RowOp::Insert),
            Some(current) if current == requested => (VoteOutcome::Retracted, RowOp::Delete),
            Some(_) => (VoteOutcome::Switched, RowOp::SwitchKind),
        };

        let mut like_delta = 0;
        let mut dislike_delta = 0;
        {
            let delta_for = |kind: VoteKind, amount: i64, like: &mut i64, dislike: &mut i64| {
                match kind {
                    VoteKind::Like => *like += amount,
                    VoteKind::Dislike => *dislike += amount,
                }
            };
            match op {
                RowOp::Insert => delta_for(requested, 1, &mut like_delta, &mut dislike_delta),
                RowOp::Delete => delta_for(requested, -1, &mut like_delta, &mut dislike_delta),
                RowOp::SwitchKind => {
                    delta_for(requested, 1, &mut like_delta, &mut dislike_delta);
                    delta_for(
                        requested.opposite(),
                        -1,
                        &mut like_delta,
                        &mut dislike_delta,
                    );
                }
            }
        }

        Self {
            outcome,
            op,
            like_delta,
            dislike_delta,
        }
    }
}

/// How many times a conflicting transaction is retried before the
/// operation is surfaced as transient
const MAX_ATTEMPTS: u32 = 3;

/// Interaction service owning the vote state machine
pub struct InteractionService;

impl InteractionService {
    /// Cast a like or dislike on a target
    pub async fn cast_vote(
        pool: &PgPool,
        user_id: Uuid,
        target_id: Uuid,
        target_type: TargetType,
        kind: VoteKind,
    ) -> Result<VoteOutcome, ApiError> {
        // Target existence is checked before any vote state is touched
        let found = TargetRepository::exists(pool, target_type, target_id)
            .await
            .map_err(ApiError::Internal)?;
        if !found {
            return Err(ApiError::NotFound(format!(
                "{} not found",
                capitalize(target_type.as_str())
            )));
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match Self::cast_vote_once(pool, user_id, target_id, target_type, kind).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if is_unique_violation(&e) || is_serialization_failure(&e) => {
                    // A concurrent vote for the same (user, target) won
                    // the race; re-read and re-plan.
                    debug!(
                        attempt,
                        %user_id,
                        %target_id,
                        "Vote transaction conflicted, retrying"
                    );
                    continue;
                }
                Err(e) => return Err(ApiError::Database(e)),
            }
        }

        Err(ApiError::Transient(
            "Vote could not be committed after retries".to_string(),
        ))
    }

    /// One attempt: read-plan-write as a single transaction
    ///
    /// The existing vote row is locked FOR UPDATE, so between the read
    /// and the write no concurrent request can change this user's vote
    /// on this target. Counter deltas are relative SQL updates floored
    /// at zero. Either everything commits or nothing does.
    async fn cast_vote_once(
        pool: &PgPool,
        user_id: Uuid,
        target_id: Uuid,
        target_type: TargetType,
        kind: VoteKind,
    ) -> Result<VoteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing = VoteRepository::find_for_update(&mut *tx, user_id, target_id, target_type)
            .await
            .map_err(into_sqlx)?;

        let current_kind = existing.as_ref().and_then(|v| v.vote_kind());
        let plan = VotePlan::plan(current_kind, kind);

        match plan.op {
            RowOp::Insert => {
                VoteRepository::insert(&mut *tx, user_id, target_id, target_type, kind).await?;
            }
            RowOp::Delete => {
                // `existing` is present whenever the plan deletes
                if let Some(vote) = &existing {
                    VoteRepository::delete(&mut *tx, vote.id).await.map_err(into_sqlx)?;
                }
            }
            RowOp::SwitchKind => {
                if let Some(vote) = &existing {
                    VoteRepository::update_kind(&mut *tx, vote.id, kind)
                        .await
                        .map_err(into_sqlx)?;
                }
            }
        }

        if plan.like_delta != 0 {
            TargetRepository::apply_counter_delta(
                &mut *tx,
                target_type,
                target_id,
                VoteKind::Like,
                plan.like_delta,
            )
            .await
            .map_err(into_sqlx)?;
        }
        if plan.dislike_delta != 0 {
            TargetRepository::apply_counter_delta(
                &mut *tx,
                target_type,
                target_id,
                VoteKind::Dislike,
                plan.dislike_delta,
            )
            .await
            .map_err(into_sqlx)?;
        }

        tx.commit().await?;

        Ok(plan.outcome)
    }

    /// Current like/dislike stance of a user on a target
    pub async fn like_status(
        pool: &PgPool,
        user_id: Uuid,
        target_id: Uuid,
        target_type: TargetType,
    ) -> Result<LikeStatusResponse, ApiError> {
        let vote = VoteRepository::find_by_user_and_target(pool, user_id, target_id, target_type)
            .await
            .map_err(ApiError::Internal)?;

        let kind = vote.as_ref().and_then(|v| v.vote_kind());
        Ok(LikeStatusResponse {
            liked: kind == Some(VoteKind::Like),
            disliked: kind == Some(VoteKind::Dislike),
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn into_sqlx(err: anyhow::Error) -> sqlx::Error {
    match err.downcast::<sqlx::Error>() {
        Ok(e) => e,
        Err(other) => sqlx::Error::Protocol(other.to_string()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

fn is_serialization_failure(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("40001")
    )
}
