use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::pagination::{PageParams, Paginated};
use amora_shared::types::ApiResponse;

use crate::matching::filter::{self, DiscoverFilters, RankedCandidate, SortOrder};
use crate::models::{Profile, INTEREST_ACTIONS};
use crate::schema::{blocks, favorites, matches, profiles};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscoverParams {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub height_min_cm: Option<i32>,
    pub height_max_cm: Option<i32>,
    pub max_distance_km: Option<f64>,
    // Set-valued filters arrive as comma-separated values.
    pub body_types: Option<String>,
    pub ethnicities: Option<String>,
    pub religions: Option<String>,
    pub educations: Option<String>,
    pub zodiacs: Option<String>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,
    pub marijuana: Option<String>,
    pub wants_kids: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn csv_set(raw: Option<&String>) -> Option<Vec<String>> {
    raw.map(|s| {
        s.split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect::<Vec<String>>()
    })
    .filter(|v| !v.is_empty())
}

impl DiscoverParams {
    fn filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            age_min: self.age_min,
            age_max: self.age_max,
            height_min_cm: self.height_min_cm,
            height_max_cm: self.height_max_cm,
            max_distance_km: self.max_distance_km,
            body_types: csv_set(self.body_types.as_ref()),
            ethnicities: csv_set(self.ethnicities.as_ref()),
            religions: csv_set(self.religions.as_ref()),
            educations: csv_set(self.educations.as_ref()),
            zodiacs: csv_set(self.zodiacs.as_ref()),
            smoking: self.smoking.clone(),
            drinking: self.drinking.clone(),
            marijuana: self.marijuana.clone(),
            wants_kids: self.wants_kids.clone(),
        }
    }

    fn page(&self) -> PageParams {
        PageParams {
            limit: self.limit.unwrap_or(50),
            offset: self.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub user_id: Uuid,
    pub display_name: String,
    pub gender: String,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub distance_km: Option<f64>,
    pub is_favorite: bool,
    pub has_liked_me: bool,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// GET /discover - the candidate feed.
pub async fn discover(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiscoverParams>,
) -> AppResult<Json<ApiResponse<Paginated<CandidateSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = load_viewer(&mut conn, user.id)?;
    if !viewer.can_start_matching {
        return Err(AppError::new(
            ErrorCode::MatchingDisabled,
            "matching is not enabled for this profile",
        ));
    }

    let filters = params.filters();
    let page = params.page();

    // Blocked pairs (either direction) and already-acted-upon targets never
    // surface in the feed.
    let excluded = excluded_user_ids(&mut conn, viewer.user_id, true)?;
    let rows = eligible_rows(&mut conn, &viewer, &excluded, state.config.discover_scan_limit)?;

    let feed = build_feed(&mut conn, &viewer, rows, &filters, params.sort, &page)?;
    Ok(Json(ApiResponse::ok(feed)))
}

#[derive(Debug, Deserialize)]
pub struct LikesReceivedParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /likes/received - profiles that liked the caller. Deliberately
/// bypasses the already-acted exclusion so previously passed users
/// re-surface here.
pub async fn likes_received(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<LikesReceivedParams>,
) -> AppResult<Json<ApiResponse<Paginated<CandidateSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let viewer = load_viewer(&mut conn, user.id)?;
    let page = PageParams {
        limit: params.limit.unwrap_or(50),
        offset: params.offset.unwrap_or(0),
    };

    let liker_ids_ordered: Vec<Uuid> = matches::table
        .filter(matches::target_id.eq(viewer.user_id))
        .filter(matches::action.eq_any(INTEREST_ACTIONS))
        .order(matches::updated_at.desc())
        .select(matches::actor_id)
        .load::<Uuid>(&mut conn)?;

    let excluded = excluded_user_ids(&mut conn, viewer.user_id, false)?;
    let wanted: Vec<Uuid> = liker_ids_ordered
        .iter()
        .copied()
        .filter(|id| !excluded.contains(id))
        .collect();

    let loaded: Vec<Profile> = profiles::table
        .filter(profiles::user_id.eq_any(&wanted))
        .filter(profiles::profile_hidden.eq(false))
        .load::<Profile>(&mut conn)?;

    let mut by_id: HashMap<Uuid, Profile> = loaded
        .into_iter()
        .filter(|p| !p.is_unavailable())
        .map(|p| (p.user_id, p))
        .collect();

    let viewer_loc = viewer.location();
    // Keep like recency as the feed order.
    let ranked: Vec<RankedCandidate> = wanted
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(|p| {
            let distance_km = filter::distance_km(viewer_loc, p.location());
            RankedCandidate { profile: p, distance_km }
        })
        .collect();

    let total = ranked.len() as i64;
    let slice: Vec<RankedCandidate> = ranked
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();

    let candidate_ids: Vec<Uuid> = slice.iter().map(|c| c.profile.user_id).collect();
    let favorite_set = favorite_ids(&mut conn, viewer.user_id, &candidate_ids)?;
    let liker_set: HashSet<Uuid> = candidate_ids.iter().copied().collect();

    let today = Utc::now().date_naive();
    let items: Vec<CandidateSummary> = slice
        .into_iter()
        .map(|c| summarize(c, today, &favorite_set, &liker_set))
        .collect();

    Ok(Json(ApiResponse::ok(Paginated::new(items, total, &page))))
}

// --- Helpers shared with the matches listing ---

pub(crate) fn load_viewer(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Profile> {
    profiles::table
        .filter(profiles::user_id.eq(user_id))
        .first::<Profile>(conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

/// User ids never shown to this viewer: blocked pairs in either direction
/// and, unless the call site opts out, targets already acted upon.
pub(crate) fn excluded_user_ids(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    exclude_acted: bool,
) -> AppResult<HashSet<Uuid>> {
    let blocked: Vec<Uuid> = blocks::table
        .filter(blocks::blocker_id.eq(viewer_id))
        .select(blocks::blocked_id)
        .load::<Uuid>(conn)?;

    let blockers: Vec<Uuid> = blocks::table
        .filter(blocks::blocked_id.eq(viewer_id))
        .select(blocks::blocker_id)
        .load::<Uuid>(conn)?;

    let mut excluded: HashSet<Uuid> = blocked.into_iter().chain(blockers).collect();

    if exclude_acted {
        let acted: Vec<Uuid> = matches::table
            .filter(matches::actor_id.eq(viewer_id))
            .select(matches::target_id)
            .load::<Uuid>(conn)?;
        excluded.extend(acted);
    }

    Ok(excluded)
}

fn eligible_rows(
    conn: &mut PgConnection,
    viewer: &Profile,
    excluded: &HashSet<Uuid>,
    scan_limit: i64,
) -> AppResult<Vec<Profile>> {
    let mut query = profiles::table
        .filter(profiles::user_id.ne(viewer.user_id))
        .filter(profiles::profile_hidden.eq(false))
        .filter(profiles::can_start_matching.eq(true))
        // Bidirectional gender compatibility, both halves in SQL.
        .filter(profiles::gender.eq_any(viewer.looking_for.clone()))
        .filter(profiles::looking_for.contains(vec![viewer.gender.clone()]))
        .into_boxed();

    if !excluded.is_empty() {
        let ids: Vec<Uuid> = excluded.iter().copied().collect();
        query = query.filter(profiles::user_id.ne_all(ids));
    }

    let rows = query
        .order((profiles::updated_at.desc(), profiles::id.asc()))
        .limit(scan_limit)
        .load::<Profile>(conn)?;

    Ok(rows)
}

fn build_feed(
    conn: &mut PgConnection,
    viewer: &Profile,
    rows: Vec<Profile>,
    filters: &DiscoverFilters,
    sort: SortOrder,
    page: &PageParams,
) -> AppResult<Paginated<CandidateSummary>> {
    let today = Utc::now().date_naive();
    let viewer_loc = viewer.location();

    let mut ranked: Vec<RankedCandidate> = rows
        .into_iter()
        .filter(|p| !p.is_unavailable())
        .filter(|p| filter::passes_attribute_filters(p, filters, today))
        .map(|p| {
            let distance_km = filter::distance_km(viewer_loc, p.location());
            RankedCandidate { profile: p, distance_km }
        })
        .filter(|c| filter::within_max_distance(filters.max_distance_km, viewer_loc, c.distance_km))
        .collect();

    filter::rank_candidates(&mut ranked, sort);

    let total = ranked.len() as i64;
    let slice: Vec<RankedCandidate> = ranked
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();

    // Enrichment lookups only for the returned page.
    let candidate_ids: Vec<Uuid> = slice.iter().map(|c| c.profile.user_id).collect();
    let favorite_set = favorite_ids(conn, viewer.user_id, &candidate_ids)?;
    let liker_set = liker_ids(conn, viewer.user_id, &candidate_ids)?;

    let items: Vec<CandidateSummary> = slice
        .into_iter()
        .map(|c| summarize(c, today, &favorite_set, &liker_set))
        .collect();

    Ok(Paginated::new(items, total, page))
}

fn favorite_ids(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    candidate_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if candidate_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = favorites::table
        .filter(favorites::user_id.eq(viewer_id))
        .filter(favorites::favorite_user_id.eq_any(candidate_ids))
        .select(favorites::favorite_user_id)
        .load::<Uuid>(conn)?;
    Ok(ids.into_iter().collect())
}

/// Reverse MatchAction lookup. The result only ever flows to the viewer's
/// own feed; the candidate never learns who saw this flag.
fn liker_ids(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    candidate_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if candidate_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = matches::table
        .filter(matches::target_id.eq(viewer_id))
        .filter(matches::actor_id.eq_any(candidate_ids))
        .filter(matches::action.eq_any(INTEREST_ACTIONS))
        .select(matches::actor_id)
        .load::<Uuid>(conn)?;
    Ok(ids.into_iter().collect())
}

fn summarize(
    candidate: RankedCandidate,
    today: NaiveDate,
    favorite_set: &HashSet<Uuid>,
    liker_set: &HashSet<Uuid>,
) -> CandidateSummary {
    let profile = candidate.profile;
    CandidateSummary {
        user_id: profile.user_id,
        age: profile.birth_date.map(|b| filter::age_on(b, today)),
        is_favorite: favorite_set.contains(&profile.user_id),
        has_liked_me: liker_set.contains(&profile.user_id),
        distance_km: candidate.distance_km,
        display_name: profile.display_name,
        gender: profile.gender,
        city: profile.city,
        bio: profile.bio,
        last_active_at: profile.last_active_at,
    }
}
