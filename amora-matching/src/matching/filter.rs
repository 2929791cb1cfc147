use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::models::Profile;

/// Optional constraints for the discovery feed. A missing field means "no
/// constraint", never a restrictive default.
#[derive(Debug, Clone, Default)]
pub struct DiscoverFilters {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub height_min_cm: Option<i32>,
    pub height_max_cm: Option<i32>,
    pub max_distance_km: Option<f64>,
    pub body_types: Option<Vec<String>>,
    pub ethnicities: Option<Vec<String>>,
    pub religions: Option<Vec<String>>,
    pub educations: Option<Vec<String>>,
    pub zodiacs: Option<Vec<String>>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,
    pub marijuana: Option<String>,
    pub wants_kids: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Recent,
    Distance,
}

/// Gender compatibility must hold in BOTH directions: the candidate's
/// gender is one the viewer is looking for, and the viewer's gender is one
/// the candidate is looking for. A one-directional check produces false
/// matches.
pub fn mutually_interested(viewer: &Profile, candidate: &Profile) -> bool {
    viewer.looking_for.iter().any(|g| g == &candidate.gender)
        && candidate.looking_for.iter().any(|g| g == &viewer.gender)
}

pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Haversine distance in km between two lat/lng points.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const R: f64 = 6371.0; // Earth radius in km
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    R * c
}

pub fn distance_km(
    viewer_loc: Option<(f64, f64)>,
    candidate_loc: Option<(f64, f64)>,
) -> Option<f64> {
    match (viewer_loc, candidate_loc) {
        (Some((lat1, lng1)), Some((lat2, lng2))) => Some(haversine_km(lat1, lng1, lat2, lng2)),
        _ => None,
    }
}

fn in_set(value: Option<&str>, allowed: Option<&Vec<String>>) -> bool {
    match allowed {
        None => true,
        Some(set) if set.is_empty() => true,
        Some(set) => value.map(|v| set.iter().any(|s| s == v)).unwrap_or(false),
    }
}

fn matches_scalar(value: Option<&str>, wanted: Option<&String>) -> bool {
    match wanted {
        None => true,
        Some(w) => value.map(|v| v == w).unwrap_or(false),
    }
}

/// Attribute filters only; gender eligibility, blocks, and the distance
/// constraint are applied separately.
pub fn passes_attribute_filters(
    candidate: &Profile,
    filters: &DiscoverFilters,
    today: NaiveDate,
) -> bool {
    if filters.age_min.is_some() || filters.age_max.is_some() {
        let Some(age) = candidate.birth_date.map(|b| age_on(b, today)) else {
            return false;
        };
        if filters.age_min.is_some_and(|min| age < min) {
            return false;
        }
        if filters.age_max.is_some_and(|max| age > max) {
            return false;
        }
    }

    if filters.height_min_cm.is_some() || filters.height_max_cm.is_some() {
        let Some(height) = candidate.height_cm else {
            return false;
        };
        if filters.height_min_cm.is_some_and(|min| height < min) {
            return false;
        }
        if filters.height_max_cm.is_some_and(|max| height > max) {
            return false;
        }
    }

    in_set(candidate.body_type.as_deref(), filters.body_types.as_ref())
        && in_set(candidate.ethnicity.as_deref(), filters.ethnicities.as_ref())
        && in_set(candidate.religion.as_deref(), filters.religions.as_ref())
        && in_set(candidate.education.as_deref(), filters.educations.as_ref())
        && in_set(candidate.zodiac.as_deref(), filters.zodiacs.as_ref())
        && matches_scalar(candidate.smoking.as_deref(), filters.smoking.as_ref())
        && matches_scalar(candidate.drinking.as_deref(), filters.drinking.as_ref())
        && matches_scalar(candidate.marijuana.as_deref(), filters.marijuana.as_ref())
        && matches_scalar(candidate.wants_kids.as_deref(), filters.wants_kids.as_ref())
}

/// A max-distance constraint is ignored when the viewer has no location (a
/// viewer without coordinates must still get results); a candidate without
/// coordinates cannot satisfy a present constraint.
pub fn within_max_distance(
    max_distance_km: Option<f64>,
    viewer_loc: Option<(f64, f64)>,
    distance: Option<f64>,
) -> bool {
    match (max_distance_km, viewer_loc) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(max), Some(_)) => distance.map(|d| d <= max).unwrap_or(false),
    }
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub profile: Profile,
    pub distance_km: Option<f64>,
}

/// Ordering is deterministic across repeated calls: recency (or distance)
/// first, then profile id as a stable tie-break. Under distance ordering,
/// candidates without a computable distance sort last instead of erroring.
pub fn rank_candidates(candidates: &mut [RankedCandidate], order: SortOrder) {
    match order {
        SortOrder::Recent => {
            candidates.sort_by(|a, b| {
                b.profile
                    .updated_at
                    .cmp(&a.profile.updated_at)
                    .then_with(|| a.profile.id.cmp(&b.profile.id))
            });
        }
        SortOrder::Distance => {
            candidates.sort_by(|a, b| match (a.distance_km, b.distance_km) {
                (Some(da), Some(db)) => da
                    .total_cmp(&db)
                    .then_with(|| a.profile.id.cmp(&b.profile.id)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.profile.id.cmp(&b.profile.id),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn profile(gender: &str, looking_for: &[&str]) -> Profile {
        Profile {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            display_name: "test".to_string(),
            gender: gender.to_string(),
            looking_for: looking_for.iter().map(|s| s.to_string()).collect(),
            birth_date: None,
            bio: None,
            latitude: None,
            longitude: None,
            city: None,
            height_cm: None,
            body_type: None,
            ethnicity: None,
            religion: None,
            education: None,
            zodiac: None,
            smoking: None,
            drinking: None,
            marijuana: None,
            wants_kids: None,
            account_status: None,
            profile_hidden: false,
            can_start_matching: true,
            last_active_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn eligibility_requires_both_directions() {
        let viewer = profile("woman", &["man"]);
        let candidate = profile("man", &["woman"]);
        assert!(mutually_interested(&viewer, &candidate));

        // Candidate matches the viewer's preference, but not vice versa.
        let one_way = profile("man", &["man"]);
        assert!(!mutually_interested(&viewer, &one_way));
        assert!(!mutually_interested(&one_way, &viewer));
    }

    #[test]
    fn empty_filters_constrain_nothing() {
        let candidate = profile("man", &["woman"]);
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert!(passes_attribute_filters(&candidate, &DiscoverFilters::default(), today));
    }

    #[test]
    fn age_filter_excludes_out_of_range_and_unknown() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let mut candidate = profile("man", &["woman"]);
        candidate.birth_date = NaiveDate::from_ymd_opt(1996, 8, 8); // turns 30 tomorrow

        let filters = DiscoverFilters {
            age_min: Some(25),
            age_max: Some(29),
            ..Default::default()
        };
        assert!(passes_attribute_filters(&candidate, &filters, today));

        let filters = DiscoverFilters {
            age_min: Some(30),
            ..Default::default()
        };
        assert!(!passes_attribute_filters(&candidate, &filters, today));

        // Unknown birth date cannot satisfy an age constraint.
        candidate.birth_date = None;
        let filters = DiscoverFilters {
            age_max: Some(50),
            ..Default::default()
        };
        assert!(!passes_attribute_filters(&candidate, &filters, today));
    }

    #[test]
    fn set_filters_match_membership() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let mut candidate = profile("man", &["woman"]);
        candidate.body_type = Some("athletic".to_string());
        candidate.smoking = Some("never".to_string());

        let filters = DiscoverFilters {
            body_types: Some(vec!["athletic".to_string(), "slim".to_string()]),
            smoking: Some("never".to_string()),
            ..Default::default()
        };
        assert!(passes_attribute_filters(&candidate, &filters, today));

        let filters = DiscoverFilters {
            body_types: Some(vec!["slim".to_string()]),
            ..Default::default()
        };
        assert!(!passes_attribute_filters(&candidate, &filters, today));
    }

    #[test]
    fn haversine_paris_to_london() {
        let km = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((km - 343.0).abs() < 10.0, "got {km}");
        assert!(haversine_km(10.0, 20.0, 10.0, 20.0) < 1e-9);
    }

    #[test]
    fn max_distance_rules() {
        let viewer_loc = Some((48.85, 2.35));
        assert!(within_max_distance(None, viewer_loc, None));
        // Viewer without location: constraint ignored.
        assert!(within_max_distance(Some(50.0), None, None));
        // Candidate without location fails a present constraint.
        assert!(!within_max_distance(Some(50.0), viewer_loc, None));
        assert!(within_max_distance(Some(50.0), viewer_loc, Some(49.9)));
        assert!(!within_max_distance(Some(50.0), viewer_loc, Some(50.1)));
    }

    #[test]
    fn distance_order_puts_unlocated_last() {
        let mut candidates = vec![
            RankedCandidate { profile: profile("man", &["woman"]), distance_km: None },
            RankedCandidate { profile: profile("man", &["woman"]), distance_km: Some(12.0) },
            RankedCandidate { profile: profile("man", &["woman"]), distance_km: Some(3.0) },
        ];
        rank_candidates(&mut candidates, SortOrder::Distance);
        assert_eq!(candidates[0].distance_km, Some(3.0));
        assert_eq!(candidates[1].distance_km, Some(12.0));
        assert_eq!(candidates[2].distance_km, None);
    }

    #[test]
    fn recent_order_is_deterministic_on_ties() {
        let mut a = profile("man", &["woman"]);
        let mut b = profile("man", &["woman"]);
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        a.updated_at = t;
        b.updated_at = t;

        let mut first = vec![
            RankedCandidate { profile: a.clone(), distance_km: None },
            RankedCandidate { profile: b.clone(), distance_km: None },
        ];
        let mut second = vec![
            RankedCandidate { profile: b, distance_km: None },
            RankedCandidate { profile: a, distance_km: None },
        ];
        rank_candidates(&mut first, SortOrder::Recent);
        rank_candidates(&mut second, SortOrder::Recent);
        let ids: Vec<_> = first.iter().map(|c| c.profile.id).collect();
        let ids2: Vec<_> = second.iter().map(|c| c.profile.id).collect();
        assert_eq!(ids, ids2);
    }

    #[test]
    fn age_on_handles_birthday_boundary() {
        let birth = NaiveDate::from_ymd_opt(2000, 8, 8).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()), 25);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 8, 8).unwrap()), 26);
    }
}
