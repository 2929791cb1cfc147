use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Profile/discovery errors
/// - E3xxx: Match action errors
/// - E4xxx: Conversation errors
/// - E5xxx: Introduction errors
/// - E6xxx: Block/favorite errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,

    // Auth (E1xxx)
    TokenExpired,
    TokenInvalid,

    // Profile / discovery (E2xxx)
    ProfileNotFound,
    MatchingDisabled,

    // Match actions (E3xxx)
    CannotMatchSelf,
    TargetUnavailable,
    BlockedPair,
    MatchNotFound,

    // Conversations (E4xxx)
    ConversationNotFound,
    NotConversationParticipant,

    // Introductions (E5xxx)
    IntroductionNotFound,
    NotIntroductionParty,
    NotIntroductionBroker,
    AlreadyResponded,
    IntroductionClosed,
    IntroductionExpired,
    CannotIntroduceSelf,
    DuplicateInvitees,

    // Blocks / favorites (E6xxx)
    CannotBlockSelf,
    BlockAlreadyExists,
    BlockNotFound,
    CannotFavoriteSelf,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",

            // Auth
            Self::TokenExpired => "E1001",
            Self::TokenInvalid => "E1002",

            // Profile / discovery
            Self::ProfileNotFound => "E2001",
            Self::MatchingDisabled => "E2002",

            // Match actions
            Self::CannotMatchSelf => "E3001",
            Self::TargetUnavailable => "E3002",
            Self::BlockedPair => "E3003",
            Self::MatchNotFound => "E3004",

            // Conversations
            Self::ConversationNotFound => "E4001",
            Self::NotConversationParticipant => "E4002",

            // Introductions
            Self::IntroductionNotFound => "E5001",
            Self::NotIntroductionParty => "E5002",
            Self::NotIntroductionBroker => "E5003",
            Self::AlreadyResponded => "E5004",
            Self::IntroductionClosed => "E5005",
            Self::IntroductionExpired => "E5006",
            Self::CannotIntroduceSelf => "E5007",
            Self::DuplicateInvitees => "E5008",

            // Blocks / favorites
            Self::CannotBlockSelf => "E6001",
            Self::BlockAlreadyExists => "E6002",
            Self::BlockNotFound => "E6003",
            Self::CannotFavoriteSelf => "E6004",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::CannotMatchSelf
            | Self::TargetUnavailable | Self::CannotIntroduceSelf
            | Self::DuplicateInvitees => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ProfileNotFound | Self::MatchNotFound
            | Self::ConversationNotFound | Self::IntroductionNotFound
            | Self::BlockNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::MatchingDisabled | Self::BlockedPair
            | Self::NotConversationParticipant | Self::NotIntroductionParty
            | Self::NotIntroductionBroker | Self::CannotBlockSelf
            | Self::CannotFavoriteSelf => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::AlreadyResponded | Self::IntroductionClosed | Self::IntroductionExpired
            | Self::BlockAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_codes_map_to_409() {
        assert_eq!(ErrorCode::AlreadyResponded.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::IntroductionExpired.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::BlockAlreadyExists.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_distinct_from_forbidden() {
        assert_eq!(ErrorCode::IntroductionNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::NotIntroductionParty.status_code(), StatusCode::FORBIDDEN);
        assert_ne!(
            ErrorCode::IntroductionNotFound.code(),
            ErrorCode::NotIntroductionParty.code()
        );
    }

    #[test]
    fn blocked_pair_is_authorization_error() {
        assert_eq!(ErrorCode::BlockedPair.status_code(), StatusCode::FORBIDDEN);
    }
}
