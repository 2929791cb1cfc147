use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{Block, NewBlock, Profile};
use crate::schema::{blocks, profiles};
use crate::AppState;

/// A block in either direction suppresses all interaction between the
/// pair; callers check the unordered pair, not the stored direction.
pub fn block_exists_between(conn: &mut PgConnection, a: Uuid, b: Uuid) -> QueryResult<bool> {
    let count: i64 = blocks::table
        .filter(
            blocks::blocker_id
                .eq(a)
                .and(blocks::blocked_id.eq(b))
                .or(blocks::blocker_id.eq(b).and(blocks::blocked_id.eq(a))),
        )
        .select(count_star())
        .first(conn)?;
    Ok(count > 0)
}

#[derive(Debug, Deserialize)]
pub struct CreateBlockRequest {
    pub blocked_user_id: Uuid,
}

/// POST /blocks
pub async fn create_block(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBlockRequest>,
) -> AppResult<Json<ApiResponse<Block>>> {
    if user.id == req.blocked_user_id {
        return Err(AppError::new(ErrorCode::CannotBlockSelf, "you cannot block yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    profiles::table
        .filter(profiles::user_id.eq(req.blocked_user_id))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "target profile not found"))?;

    let already_blocked: i64 = blocks::table
        .filter(blocks::blocker_id.eq(user.id))
        .filter(blocks::blocked_id.eq(req.blocked_user_id))
        .select(count_star())
        .first(&mut conn)?;

    if already_blocked > 0 {
        return Err(AppError::new(ErrorCode::BlockAlreadyExists, "user is already blocked"));
    }

    let block: Block = diesel::insert_into(blocks::table)
        .values(&NewBlock {
            blocker_id: user.id,
            blocked_id: req.blocked_user_id,
        })
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(block)))
}

/// DELETE /blocks/:user_id
pub async fn remove_block(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(blocked_user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(
        blocks::table
            .filter(blocks::blocker_id.eq(user.id))
            .filter(blocks::blocked_id.eq(blocked_user_id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::BlockNotFound, "block not found"));
    }

    Ok(Json(ApiResponse::ok_with_message((), "unblocked")))
}

/// GET /blocks
pub async fn list_blocks(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Block>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows = blocks::table
        .filter(blocks::blocker_id.eq(user.id))
        .order(blocks::created_at.desc())
        .load::<Block>(&mut conn)?;

    Ok(Json(ApiResponse::ok(rows)))
}
