//! Interaction routes: likes, dislikes and like-status
//!
//! All endpoints require authentication. Vote endpoints answer with
//! the outcome of the state transition: Recorded, Retracted or
//! Switched.

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::repositories::{TargetType, VoteKind};
use crate::services::InteractionService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use vidstream_shared::{LikeStatusQuery, LikeStatusResponse, MessageResponse};

/// Create interaction routes
///
/// Vote routes live under the target's own prefix (the original URL
/// shape); the like-status query lives under /interactions.
pub fn interaction_routes() -> Router<AppState> {
    Router::new()
        .route("/videos/:id/like", post(like_video))
        .route("/videos/:id/dislike", post(dislike_video))
        .route("/comments/:id/like", post(like_comment))
        .route("/comments/:id/dislike", post(dislike_comment))
        .route("/interactions/like-status", get(like_status))
}

async fn cast(
    state: AppState,
    auth_user: AuthUser,
    target_id: Uuid,
    target_type: TargetType,
    kind: VoteKind,
) -> ApiResult<Json<MessageResponse>> {
    let outcome = InteractionService::cast_vote(
        state.db(),
        auth_user.user_id,
        target_id,
        target_type,
        kind,
    )
    .await?;

    Ok(Json(MessageResponse {
        message: outcome.message().to_string(),
    }))
}

/// POST /api/videos/:id/like
async fn like_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    cast(state, auth_user, id, TargetType::Video, VoteKind::Like).await
}

/// POST /api/videos/:id/dislike
async fn dislike_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    cast(state, auth_user, id, TargetType::Video, VoteKind::Dislike).await
}

/// POST /api/comments/:id/like
async fn like_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    cast(state, auth_user, id, TargetType::Comment, VoteKind::Like).await
}

/// POST /api/comments/:id/dislike
async fn dislike_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    cast(state, auth_user, id, TargetType::Comment, VoteKind::Dislike).await
}

/// GET /api/interactions/like-status?target_id=&target_type=
async fn like_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<LikeStatusQuery>,
) -> ApiResult<Json<LikeStatusResponse>> {
    let target_id = Uuid::parse_str(&query.target_id)
        .map_err(|_| ApiError::Validation("target_id must be a valid UUID".to_string()))?;
    let target_type = TargetType::parse(&query.target_type).ok_or_else(|| {
        ApiError::Validation("target_type must be either \"video\" or \"comment\"".to_string())
    })?;

    let status =
        InteractionService::like_status(state.db(), auth_user.user_id, target_id, target_type)
            .await?;

    Ok(Json(status))
}
