use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `amora.{domain}.{entity}.{action}`
/// Example: `amora.matching.match.created`
///
/// The notification service consumes these as delivery *decisions*; the
/// matching engine never talks to push/toast rendering directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Matching events
    pub const MATCHING_MATCH_CREATED: &str = "amora.matching.match.created";
    pub const MATCHING_SUPERLIKE_CHARGED: &str = "amora.points.superlike.charged";

    // Introduction events
    pub const INTRO_CREATED: &str = "amora.matchmaking.introduction.created";
    pub const INTRO_RESPONDED: &str = "amora.matchmaking.introduction.responded";
    pub const INTRO_COMPLETED: &str = "amora.matchmaking.introduction.completed";

    // Messaging events
    pub const MESSAGING_CONVERSATION_CREATED: &str = "amora.messaging.conversation.created";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Notify the party who did not just act; the actor gets the match
    /// result synchronously in the action response.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MutualMatchCreated {
        pub notify_user_id: Uuid,
        pub matched_user_id: Uuid,
        pub matched_display_name: String,
        pub conversation_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SuperLikeCharged {
        pub actor_id: Uuid,
        pub target_id: Uuid,
        pub cost: u32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct IntroductionCreated {
        pub introduction_id: Uuid,
        pub matchmaker_id: Uuid,
        pub invitee_id: Uuid,
        pub other_invitee_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct IntroductionResponded {
        pub introduction_id: Uuid,
        pub responder_id: Uuid,
        pub accepted: bool,
        pub status: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct IntroductionCompleted {
        pub introduction_id: Uuid,
        pub conversation_id: Uuid,
        pub matchmaker_id: Uuid,
        pub user_a_id: Uuid,
        pub user_b_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ConversationCreated {
        pub conversation_id: Uuid,
        pub conversation_type: String,
        pub participant_ids: Vec<Uuid>,
    }
}
