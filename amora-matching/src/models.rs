use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    blocks, conversation_participants, conversations, favorites, gallery_photos, matches,
    matchmaker_introductions, messages, profiles,
};

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub gender: String,
    pub looking_for: Vec<String>,
    pub birth_date: Option<NaiveDate>,
    pub bio: Option<String>,
    #[serde(skip_serializing)]
    pub latitude: Option<f64>,
    #[serde(skip_serializing)]
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub height_cm: Option<i32>,
    pub body_type: Option<String>,
    pub ethnicity: Option<String>,
    pub religion: Option<String>,
    pub education: Option<String>,
    pub zodiac: Option<String>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,
    pub marijuana: Option<String>,
    pub wants_kids: Option<String>,
    pub account_status: Option<String>,
    pub profile_hidden: bool,
    pub can_start_matching: bool,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Suspended or deleted accounts cannot be targeted; an account with no
    /// status (new/unprovisioned) is eligible.
    pub fn is_unavailable(&self) -> bool {
        matches!(self.account_status.as_deref(), Some("suspended") | Some("deleted"))
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

// --- MatchAction ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchActionKind {
    Like,
    Pass,
    SuperLike,
}

/// Storage strings for the actions that participate in mutual-match
/// detection.
pub const INTEREST_ACTIONS: &[&str] = &["like", "super_like"];

impl MatchActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchActionKind::Like => "like",
            MatchActionKind::Pass => "pass",
            MatchActionKind::SuperLike => "super_like",
        }
    }

    /// Only interest-expressing actions participate in mutual-match
    /// detection; a pass never does.
    pub fn expresses_interest(self) -> bool {
        matches!(self, MatchActionKind::Like | MatchActionKind::SuperLike)
    }
}

impl std::str::FromStr for MatchActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(MatchActionKind::Like),
            "pass" => Ok(MatchActionKind::Pass),
            "super_like" => Ok(MatchActionKind::SuperLike),
            _ => Err(format!("unknown match action: {s}")),
        }
    }
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
pub struct MatchAction {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub action: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatchAction {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub action: String,
}

// --- Block ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = blocks)]
pub struct Block {
    pub id: Uuid,
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = blocks)]
pub struct NewBlock {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
}

// --- Conversation ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = conversations)]
pub struct Conversation {
    pub id: Uuid,
    pub conversation_type: String,
    #[serde(skip_serializing)]
    pub direct_key: Option<String>,
    pub title: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversation {
    pub conversation_type: String,
    pub direct_key: Option<String>,
    pub title: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = conversation_participants)]
pub struct ConversationParticipant {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub last_read_at: DateTime<Utc>,
    pub is_muted: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = conversation_participants)]
pub struct NewConversationParticipant {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

// --- MatchmakerIntroduction ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matchmaker_introductions)]
pub struct Introduction {
    pub id: Uuid,
    pub matchmaker_id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub intro_message: String,
    pub status: String,
    pub outcome: Option<String>,
    pub conversation_id: Option<Uuid>,
    pub user_a_response_at: Option<DateTime<Utc>>,
    pub user_b_response_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub outcome_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Introduction {
    pub fn is_invitee(&self, user_id: Uuid) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.matchmaker_id == user_id || self.is_invitee(user_id)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matchmaker_introductions)]
pub struct NewIntroduction {
    pub matchmaker_id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub intro_message: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

// --- Favorite ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = favorites)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub favorite_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub favorite_user_id: Uuid,
}

// --- GalleryPhoto ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = gallery_photos)]
pub struct GalleryPhoto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub photo_url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn match_action_serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&MatchActionKind::SuperLike).unwrap(), "\"super_like\"");
        let parsed: MatchActionKind = serde_json::from_str("\"pass\"").unwrap();
        assert_eq!(parsed, MatchActionKind::Pass);
        assert!(serde_json::from_str::<MatchActionKind>("\"wink\"").is_err());
    }

    #[test]
    fn action_string_round_trip() {
        for kind in [MatchActionKind::Like, MatchActionKind::Pass, MatchActionKind::SuperLike] {
            assert_eq!(MatchActionKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn pass_expresses_no_interest() {
        assert!(MatchActionKind::Like.expresses_interest());
        assert!(MatchActionKind::SuperLike.expresses_interest());
        assert!(!MatchActionKind::Pass.expresses_interest());
    }
}
