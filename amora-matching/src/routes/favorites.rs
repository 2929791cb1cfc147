use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use diesel::prelude::*;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{Favorite, NewFavorite, Profile};
use crate::schema::{favorites, profiles};
use crate::AppState;

/// POST /favorites/:user_id - idempotent: favoriting twice is a no-op.
pub async fn add_favorite(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(favorite_user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Favorite>>> {
    if user.id == favorite_user_id {
        return Err(AppError::new(ErrorCode::CannotFavoriteSelf, "you cannot favorite yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    profiles::table
        .filter(profiles::user_id.eq(favorite_user_id))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "target profile not found"))?;

    diesel::insert_into(favorites::table)
        .values(&NewFavorite {
            user_id: user.id,
            favorite_user_id,
        })
        .on_conflict((favorites::user_id, favorites::favorite_user_id))
        .do_nothing()
        .execute(&mut conn)?;

    let favorite: Favorite = favorites::table
        .filter(favorites::user_id.eq(user.id))
        .filter(favorites::favorite_user_id.eq(favorite_user_id))
        .first(&mut conn)?;

    Ok(Json(ApiResponse::ok(favorite)))
}

/// DELETE /favorites/:user_id
pub async fn remove_favorite(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(favorite_user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(
        favorites::table
            .filter(favorites::user_id.eq(user.id))
            .filter(favorites::favorite_user_id.eq(favorite_user_id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::not_found("favorite not found"));
    }

    Ok(Json(ApiResponse::ok(())))
}

/// GET /favorites
pub async fn list_favorites(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Favorite>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows = favorites::table
        .filter(favorites::user_id.eq(user.id))
        .order(favorites::created_at.desc())
        .load::<Favorite>(&mut conn)?;

    Ok(Json(ApiResponse::ok(rows)))
}
