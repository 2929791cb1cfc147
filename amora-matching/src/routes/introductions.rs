use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::middleware::MatchmakerUser;
use amora_shared::types::auth::AuthUser;
use amora_shared::types::pagination::{PageParams, Paginated};
use amora_shared::types::ApiResponse;

use crate::events::publisher;
use crate::introductions::state::{
    apply_response, effective_status, IntroResponse, IntroductionOutcome, IntroductionStatus,
    ResponderSlot, TransitionError,
};
use crate::models::{Introduction, NewIntroduction, Profile};
use crate::routes::blocks::block_exists_between;
use crate::schema::{matchmaker_introductions, profiles};
use crate::services::conversations;
use crate::AppState;

/// Read-model of an introduction: the stored status with lazy expiry
/// applied, so two reads of the same row never disagree.
#[derive(Debug, Serialize)]
pub struct IntroductionView {
    pub id: Uuid,
    pub matchmaker_id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub intro_message: String,
    pub status: IntroductionStatus,
    pub outcome: Option<String>,
    pub conversation_id: Option<Uuid>,
    pub user_a_response_at: Option<DateTime<Utc>>,
    pub user_b_response_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub outcome_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn parse_status(row: &Introduction) -> AppResult<IntroductionStatus> {
    row.status
        .parse::<IntroductionStatus>()
        .map_err(|_| AppError::internal(format!("corrupt introduction status: {}", row.status)))
}

fn view(row: Introduction, now: DateTime<Utc>) -> AppResult<IntroductionView> {
    let status = effective_status(parse_status(&row)?, row.expires_at, now);
    Ok(IntroductionView {
        id: row.id,
        matchmaker_id: row.matchmaker_id,
        user_a_id: row.user_a_id,
        user_b_id: row.user_b_id,
        intro_message: row.intro_message,
        status,
        outcome: row.outcome,
        conversation_id: row.conversation_id,
        user_a_response_at: row.user_a_response_at,
        user_b_response_at: row.user_b_response_at,
        expires_at: row.expires_at,
        outcome_updated_at: row.outcome_updated_at,
        created_at: row.created_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntroductionRequest {
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub intro_message: String,
}

/// POST /introductions - broker opens an introduction between two users.
pub async fn create_introduction(
    MatchmakerUser(broker): MatchmakerUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIntroductionRequest>,
) -> AppResult<Json<ApiResponse<IntroductionView>>> {
    req.validate()?;

    if req.user_a_id == req.user_b_id {
        return Err(AppError::new(
            ErrorCode::DuplicateInvitees,
            "an introduction needs two distinct users",
        ));
    }
    if broker.id == req.user_a_id || broker.id == req.user_b_id {
        return Err(AppError::new(
            ErrorCode::CannotIntroduceSelf,
            "a matchmaker cannot introduce themselves",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    for invitee_id in [req.user_a_id, req.user_b_id] {
        let invitee: Profile = profiles::table
            .filter(profiles::user_id.eq(invitee_id))
            .first::<Profile>(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "invitee profile not found"))?;
        if invitee.is_unavailable() {
            return Err(AppError::new(
                ErrorCode::TargetUnavailable,
                "invitee account is suspended or deleted",
            ));
        }
    }

    // A block between any of the three parties makes the eventual
    // conversation impossible; refuse up front.
    for (a, b) in [
        (req.user_a_id, req.user_b_id),
        (broker.id, req.user_a_id),
        (broker.id, req.user_b_id),
    ] {
        if block_exists_between(&mut conn, a, b)? {
            return Err(AppError::new(
                ErrorCode::BlockedPair,
                "interaction between these users is blocked",
            ));
        }
    }

    let now = Utc::now();
    let expires_at = now + Duration::hours(state.config.introduction_ttl_hours);

    let row: Introduction = diesel::insert_into(matchmaker_introductions::table)
        .values(&NewIntroduction {
            matchmaker_id: broker.id,
            user_a_id: req.user_a_id,
            user_b_id: req.user_b_id,
            intro_message: req.intro_message.clone(),
            status: IntroductionStatus::Pending.as_str().to_string(),
            expires_at,
        })
        .get_result(&mut conn)?;

    publisher::publish_introduction_created(
        &state.rabbitmq,
        row.id,
        broker.id,
        row.user_a_id,
        row.user_b_id,
    )
    .await;
    publisher::publish_introduction_created(
        &state.rabbitmq,
        row.id,
        broker.id,
        row.user_b_id,
        row.user_a_id,
    )
    .await;

    Ok(Json(ApiResponse::ok(view(row, now)?)))
}

#[derive(Debug, Deserialize)]
pub struct ListIntroductionsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /introductions - introductions the caller brokers or is invited to.
pub async fn list_introductions(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListIntroductionsParams>,
) -> AppResult<Json<ApiResponse<Paginated<IntroductionView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let page = PageParams {
        limit: params.limit.unwrap_or(50),
        offset: params.offset.unwrap_or(0),
    };

    let involving_me = matchmaker_introductions::matchmaker_id
        .eq(user.id)
        .or(matchmaker_introductions::user_a_id.eq(user.id))
        .or(matchmaker_introductions::user_b_id.eq(user.id));

    let total: i64 = matchmaker_introductions::table
        .filter(involving_me)
        .count()
        .get_result(&mut conn)?;

    let rows: Vec<Introduction> = matchmaker_introductions::table
        .filter(involving_me)
        .order(matchmaker_introductions::created_at.desc())
        .limit(page.limit())
        .offset(page.offset())
        .load::<Introduction>(&mut conn)?;

    let now = Utc::now();
    let items = rows
        .into_iter()
        .map(|row| view(row, now))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total, &page))))
}

/// GET /introductions/:id - readable by the broker and both invitees only.
pub async fn get_introduction(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<IntroductionView>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let row: Introduction = matchmaker_introductions::table
        .find(id)
        .first::<Introduction>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::IntroductionNotFound, "introduction not found"))?;

    if !row.is_party(user.id) {
        return Err(AppError::new(
            ErrorCode::NotIntroductionParty,
            "you are not part of this introduction",
        ));
    }

    Ok(Json(ApiResponse::ok(view(row, Utc::now())?)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateIntroductionRequest {
    pub action: Option<IntroResponse>,
    pub outcome: Option<IntroductionOutcome>,
}

/// PATCH /introductions/:id - either an invitee response (`action`) or a
/// broker outcome annotation (`outcome`), never both.
pub async fn update_introduction(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateIntroductionRequest>,
) -> AppResult<Json<ApiResponse<IntroductionView>>> {
    match (req.action, req.outcome) {
        (Some(action), None) => respond(user, state, id, action).await,
        (None, Some(outcome)) => set_outcome(user, state, id, outcome).await,
        _ => Err(AppError::bad_request("provide exactly one of action or outcome")),
    }
}

async fn respond(
    user: AuthUser,
    state: Arc<AppState>,
    id: Uuid,
    action: IntroResponse,
) -> AppResult<Json<ApiResponse<IntroductionView>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let now = Utc::now();

    let updated: Introduction = conn.transaction::<Introduction, AppError, _>(|conn| {
        let row: Introduction = matchmaker_introductions::table
            .find(id)
            .for_update()
            .first::<Introduction>(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::IntroductionNotFound, "introduction not found"))?;

        let slot = if row.user_a_id == user.id {
            ResponderSlot::UserA
        } else if row.user_b_id == user.id {
            ResponderSlot::UserB
        } else {
            return Err(AppError::new(
                ErrorCode::NotIntroductionParty,
                "only invitees may respond to an introduction",
            ));
        };

        let current = parse_status(&row)?;
        if effective_status(current, row.expires_at, now) == IntroductionStatus::Expired {
            // Persist the lazily computed state so later reads agree cheaply.
            diesel::update(matchmaker_introductions::table.find(id))
                .set((
                    matchmaker_introductions::status.eq(IntroductionStatus::Expired.as_str()),
                    matchmaker_introductions::updated_at.eq(now),
                ))
                .execute(conn)?;
            return Err(AppError::new(
                ErrorCode::IntroductionExpired,
                "introduction has expired",
            ));
        }

        // The response timestamp is the authoritative once-only guard; the
        // status check inside apply_response is a second line of defense.
        let responded_at = match slot {
            ResponderSlot::UserA => row.user_a_response_at,
            ResponderSlot::UserB => row.user_b_response_at,
        };
        if responded_at.is_some() {
            return Err(AppError::new(
                ErrorCode::AlreadyResponded,
                "you have already responded to this introduction",
            ));
        }

        let new_status = apply_response(current, slot, action).map_err(|e| match e {
            TransitionError::AlreadyResponded => AppError::new(
                ErrorCode::AlreadyResponded,
                "you have already responded to this introduction",
            ),
            TransitionError::Closed => AppError::new(
                ErrorCode::IntroductionClosed,
                "introduction is closed",
            ),
        })?;

        // Guarded-once conditional write: only flips if the responder's own
        // timestamp column is still null.
        let updated_rows = match slot {
            ResponderSlot::UserA => diesel::update(
                matchmaker_introductions::table
                    .find(id)
                    .filter(matchmaker_introductions::user_a_response_at.is_null()),
            )
            .set((
                matchmaker_introductions::status.eq(new_status.as_str()),
                matchmaker_introductions::user_a_response_at.eq(now),
                matchmaker_introductions::updated_at.eq(now),
            ))
            .execute(conn)?,
            ResponderSlot::UserB => diesel::update(
                matchmaker_introductions::table
                    .find(id)
                    .filter(matchmaker_introductions::user_b_response_at.is_null()),
            )
            .set((
                matchmaker_introductions::status.eq(new_status.as_str()),
                matchmaker_introductions::user_b_response_at.eq(now),
                matchmaker_introductions::updated_at.eq(now),
            ))
            .execute(conn)?,
        };

        if updated_rows == 0 {
            return Err(AppError::new(
                ErrorCode::AlreadyResponded,
                "you have already responded to this introduction",
            ));
        }

        // Dual acceptance is the only trigger for conversation creation:
        // three participants, seeded with the broker's introduction message.
        if new_status == IntroductionStatus::BothAccepted {
            let conversation = conversations::create_introduction_conversation(
                conn,
                row.matchmaker_id,
                row.user_a_id,
                row.user_b_id,
                &row.intro_message,
            )?;
            diesel::update(matchmaker_introductions::table.find(id))
                .set(matchmaker_introductions::conversation_id.eq(conversation.id))
                .execute(conn)?;
        }

        let fresh: Introduction = matchmaker_introductions::table.find(id).first(conn)?;
        Ok(fresh)
    })?;

    let accepted = action == IntroResponse::Accept;
    publisher::publish_introduction_responded(&state.rabbitmq, id, user.id, accepted, &updated.status)
        .await;

    if updated.status == IntroductionStatus::BothAccepted.as_str() {
        if let Some(conversation_id) = updated.conversation_id {
            publisher::publish_introduction_completed(
                &state.rabbitmq,
                id,
                conversation_id,
                updated.matchmaker_id,
                updated.user_a_id,
                updated.user_b_id,
            )
            .await;
            publisher::publish_conversation_created(
                &state.rabbitmq,
                conversation_id,
                conversations::TYPE_GROUP,
                vec![updated.user_a_id, updated.user_b_id, updated.matchmaker_id],
            )
            .await;
        }
    }

    Ok(Json(ApiResponse::ok(view(updated, now)?)))
}

async fn set_outcome(
    user: AuthUser,
    state: Arc<AppState>,
    id: Uuid,
    outcome: IntroductionOutcome,
) -> AppResult<Json<ApiResponse<IntroductionView>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let row: Introduction = matchmaker_introductions::table
        .find(id)
        .first::<Introduction>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::IntroductionNotFound, "introduction not found"))?;

    // Outcome is a broker-only annotation, independent of the response
    // state machine.
    if row.matchmaker_id != user.id {
        return Err(AppError::new(
            ErrorCode::NotIntroductionBroker,
            "only the broker may set an outcome",
        ));
    }

    let now = Utc::now();
    let updated: Introduction = diesel::update(matchmaker_introductions::table.find(id))
        .set((
            matchmaker_introductions::outcome.eq(outcome.as_str()),
            matchmaker_introductions::outcome_updated_at.eq(now),
            matchmaker_introductions::updated_at.eq(now),
        ))
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(view(updated, now)?)))
}
