use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::pagination::{PageParams, Paginated};
use amora_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{MatchAction, MatchActionKind, NewMatchAction, Profile, INTEREST_ACTIONS};
use crate::routes::blocks::block_exists_between;
use crate::routes::discover::load_viewer;
use crate::schema::{gallery_photos, matches, profiles};
use crate::services::conversations;
use crate::AppState;

const GALLERY_SLICE: usize = 4;

#[derive(Debug, Deserialize)]
pub struct RecordActionRequest {
    pub target_user_id: Uuid,
    pub action: MatchActionKind,
}

#[derive(Debug, Serialize)]
pub struct RecordActionResponse {
    #[serde(rename = "match")]
    pub recorded: MatchAction,
    pub is_mutual: bool,
    pub conversation_id: Option<Uuid>,
}

/// POST /matches - record a directed like/pass/super-like.
///
/// Preconditions are checked in order, first failure wins: no self-action,
/// target exists, target account not suspended/deleted, no block in either
/// direction. The write itself is an upsert keyed on (actor, target), so
/// retries are safe and a later action supersedes the earlier one.
pub async fn record_action(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordActionRequest>,
) -> AppResult<Json<ApiResponse<RecordActionResponse>>> {
    if req.target_user_id == user.id {
        return Err(AppError::new(ErrorCode::CannotMatchSelf, "you cannot match with yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let actor = load_viewer(&mut conn, user.id)?;
    if !actor.can_start_matching {
        return Err(AppError::new(
            ErrorCode::MatchingDisabled,
            "matching is not enabled for this profile",
        ));
    }

    let target: Profile = profiles::table
        .filter(profiles::user_id.eq(req.target_user_id))
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "target profile not found"))?;

    if target.is_unavailable() {
        return Err(AppError::new(
            ErrorCode::TargetUnavailable,
            "target account is suspended or deleted",
        ));
    }

    if block_exists_between(&mut conn, user.id, target.user_id)? {
        return Err(AppError::new(
            ErrorCode::BlockedPair,
            "interaction between these users is blocked",
        ));
    }

    let now = Utc::now();
    let recorded: MatchAction = diesel::insert_into(matches::table)
        .values(&NewMatchAction {
            actor_id: user.id,
            target_id: target.user_id,
            action: req.action.as_str().to_string(),
        })
        .on_conflict((matches::actor_id, matches::target_id))
        .do_update()
        .set((
            matches::action.eq(req.action.as_str()),
            matches::updated_at.eq(now),
        ))
        .get_result(&mut conn)?;

    // Liveness signal: the actor just did something.
    diesel::update(profiles::table.filter(profiles::user_id.eq(user.id)))
        .set(profiles::last_active_at.eq(now))
        .execute(&mut conn)?;
    let active_key = format!("active:{}", user.id);
    let _ = state
        .redis
        .set(&active_key, &now.timestamp().to_string(), state.config.last_active_ttl_secs)
        .await;

    let mut is_mutual = false;
    let mut conversation_id = None;

    if req.action.expresses_interest() {
        let reciprocal: Option<MatchAction> = matches::table
            .filter(matches::actor_id.eq(target.user_id))
            .filter(matches::target_id.eq(user.id))
            .filter(matches::action.eq_any(INTEREST_ACTIONS))
            .first::<MatchAction>(&mut conn)
            .optional()?;

        if reciprocal.is_some() {
            is_mutual = true;
            let (conversation, created) =
                conversations::ensure_direct_conversation(&mut conn, user.id, target.user_id, user.id)?;
            conversation_id = Some(conversation.id);

            if created {
                tracing::info!(
                    actor_id = %user.id,
                    target_id = %target.user_id,
                    conversation_id = %conversation.id,
                    "mutual match"
                );
                publisher::publish_conversation_created(
                    &state.rabbitmq,
                    conversation.id,
                    conversations::TYPE_DIRECT,
                    vec![user.id, target.user_id],
                )
                .await;
                // The actor learns about the match from this response; only
                // the other party needs a notification decision.
                publisher::publish_mutual_match(
                    &state.rabbitmq,
                    target.user_id,
                    user.id,
                    &actor.display_name,
                    conversation.id,
                )
                .await;
            }
        }
    }

    if req.action == MatchActionKind::SuperLike && state.config.super_like_cost > 0 {
        publisher::publish_superlike_charged(
            &state.rabbitmq,
            user.id,
            target.user_id,
            state.config.super_like_cost,
        )
        .await;
    }

    Ok(Json(ApiResponse::ok(RecordActionResponse {
        recorded,
        is_mutual,
        conversation_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListMatchesParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub user_id: Uuid,
    pub display_name: String,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub gallery: Vec<String>,
    pub conversation_id: Option<Uuid>,
    pub matched_at: DateTime<Utc>,
}

/// GET /matches - the caller's mutual matches, most recent first.
pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMatchesParams>,
) -> AppResult<Json<ApiResponse<Paginated<MatchSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    load_viewer(&mut conn, user.id)?;

    let page = PageParams {
        limit: params.limit.unwrap_or(50),
        offset: params.offset.unwrap_or(0),
    };

    let my_likes: Vec<MatchAction> = matches::table
        .filter(matches::actor_id.eq(user.id))
        .filter(matches::action.eq_any(INTEREST_ACTIONS))
        .order(matches::updated_at.desc())
        .load::<MatchAction>(&mut conn)?;

    if my_likes.is_empty() {
        return Ok(Json(ApiResponse::ok(Paginated::new(vec![], 0, &page))));
    }

    let target_ids: Vec<Uuid> = my_likes.iter().map(|m| m.target_id).collect();
    let reciprocal_ids: Vec<Uuid> = matches::table
        .filter(matches::target_id.eq(user.id))
        .filter(matches::actor_id.eq_any(&target_ids))
        .filter(matches::action.eq_any(INTEREST_ACTIONS))
        .select(matches::actor_id)
        .load::<Uuid>(&mut conn)?;
    let reciprocal: std::collections::HashSet<Uuid> = reciprocal_ids.into_iter().collect();

    // Mutual pairs in my-action recency order.
    let mutual: Vec<&MatchAction> = my_likes
        .iter()
        .filter(|m| reciprocal.contains(&m.target_id))
        .collect();

    let total = mutual.len() as i64;
    let page_slice: Vec<&MatchAction> = mutual
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();

    let page_ids: Vec<Uuid> = page_slice.iter().map(|m| m.target_id).collect();

    let loaded: Vec<Profile> = profiles::table
        .filter(profiles::user_id.eq_any(&page_ids))
        .load::<Profile>(&mut conn)?;
    let profiles_by_id: HashMap<Uuid, Profile> =
        loaded.into_iter().map(|p| (p.user_id, p)).collect();

    let galleries = gallery_slices(&mut conn, &page_ids)?;

    let keys: Vec<String> = page_ids
        .iter()
        .map(|other| conversations::direct_key(user.id, *other))
        .collect();
    let convs = conversations::direct_conversations_by_keys(&mut conn, &keys)?;
    let conv_by_key: HashMap<String, Uuid> = convs
        .into_iter()
        .filter_map(|c| c.direct_key.clone().map(|k| (k, c.id)))
        .collect();

    let items: Vec<MatchSummary> = page_slice
        .into_iter()
        .filter_map(|m| {
            let profile = profiles_by_id.get(&m.target_id)?;
            let key = conversations::direct_key(user.id, m.target_id);
            Some(MatchSummary {
                user_id: profile.user_id,
                display_name: profile.display_name.clone(),
                city: profile.city.clone(),
                bio: profile.bio.clone(),
                gallery: galleries.get(&m.target_id).cloned().unwrap_or_default(),
                conversation_id: conv_by_key.get(&key).copied(),
                matched_at: m.updated_at,
            })
        })
        .collect();

    Ok(Json(ApiResponse::ok(Paginated::new(items, total, &page))))
}

/// First few gallery photos per user, by position.
fn gallery_slices(
    conn: &mut diesel::pg::PgConnection,
    user_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<String>>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, String)> = gallery_photos::table
        .filter(gallery_photos::user_id.eq_any(user_ids))
        .order((gallery_photos::user_id.asc(), gallery_photos::position.asc()))
        .select((gallery_photos::user_id, gallery_photos::photo_url))
        .load::<(Uuid, String)>(conn)?;

    let mut out: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (user_id, url) in rows {
        let slot = out.entry(user_id).or_default();
        if slot.len() < GALLERY_SLICE {
            slot.push(url);
        }
    }
    Ok(out)
}
