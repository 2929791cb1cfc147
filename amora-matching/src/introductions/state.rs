use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Introduction status lattice.
///
/// `pending → user_a_accepted | user_b_accepted → both_accepted` on the
/// success path; any non-terminal state can move to a declined state or, by
/// time, to `expired`. Terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroductionStatus {
    Pending,
    UserAAccepted,
    UserBAccepted,
    BothAccepted,
    UserADeclined,
    UserBDeclined,
    Expired,
}

impl IntroductionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IntroductionStatus::Pending => "pending",
            IntroductionStatus::UserAAccepted => "user_a_accepted",
            IntroductionStatus::UserBAccepted => "user_b_accepted",
            IntroductionStatus::BothAccepted => "both_accepted",
            IntroductionStatus::UserADeclined => "user_a_declined",
            IntroductionStatus::UserBDeclined => "user_b_declined",
            IntroductionStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            IntroductionStatus::BothAccepted
                | IntroductionStatus::UserADeclined
                | IntroductionStatus::UserBDeclined
                | IntroductionStatus::Expired
        )
    }
}

impl std::str::FromStr for IntroductionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(IntroductionStatus::Pending),
            "user_a_accepted" => Ok(IntroductionStatus::UserAAccepted),
            "user_b_accepted" => Ok(IntroductionStatus::UserBAccepted),
            "both_accepted" => Ok(IntroductionStatus::BothAccepted),
            "user_a_declined" => Ok(IntroductionStatus::UserADeclined),
            "user_b_declined" => Ok(IntroductionStatus::UserBDeclined),
            "expired" => Ok(IntroductionStatus::Expired),
            _ => Err(format!("unknown introduction status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderSlot {
    UserA,
    UserB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntroResponse {
    Accept,
    Decline,
}

/// Broker-set annotation of how the introduction turned out in the real
/// world. Independent axis from the response status - not a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroductionOutcome {
    NoResponse,
    Declined,
    Chatted,
    Dated,
    Relationship,
}

impl IntroductionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            IntroductionOutcome::NoResponse => "no_response",
            IntroductionOutcome::Declined => "declined",
            IntroductionOutcome::Chatted => "chatted",
            IntroductionOutcome::Dated => "dated",
            IntroductionOutcome::Relationship => "relationship",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The responder already recorded a response; the first one sticks.
    #[error("responder has already recorded a response")]
    AlreadyResponded,
    /// The introduction is in a terminal state and accepts no responses.
    #[error("introduction is closed")]
    Closed,
}

/// Pure transition function over the status lattice. The caller resolves
/// which slot the responder occupies and whether the row has expired; the
/// persisted response timestamps remain the authoritative once-only guard.
pub fn apply_response(
    current: IntroductionStatus,
    slot: ResponderSlot,
    response: IntroResponse,
) -> Result<IntroductionStatus, TransitionError> {
    use IntroductionStatus::*;

    if current.is_terminal() {
        return Err(TransitionError::Closed);
    }

    // In a non-terminal state, the only recorded responses are the
    // accepted-and-waiting ones; a second response from the same side is a
    // conflict, not an overwrite.
    match (current, slot) {
        (UserAAccepted, ResponderSlot::UserA) | (UserBAccepted, ResponderSlot::UserB) => {
            return Err(TransitionError::AlreadyResponded);
        }
        _ => {}
    }

    Ok(match (response, slot) {
        (IntroResponse::Decline, ResponderSlot::UserA) => UserADeclined,
        (IntroResponse::Decline, ResponderSlot::UserB) => UserBDeclined,
        (IntroResponse::Accept, ResponderSlot::UserA) => {
            if current == UserBAccepted {
                BothAccepted
            } else {
                UserAAccepted
            }
        }
        (IntroResponse::Accept, ResponderSlot::UserB) => {
            if current == UserAAccepted {
                BothAccepted
            } else {
                UserBAccepted
            }
        }
    })
}

/// Expiry is computed lazily at read time: a non-terminal introduction past
/// its deadline reads as expired. Repeated reads of the same timestamps
/// always agree.
pub fn effective_status(
    status: IntroductionStatus,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> IntroductionStatus {
    if !status.is_terminal() && now > expires_at {
        IntroductionStatus::Expired
    } else {
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;

    use IntroductionStatus::*;
    use ResponderSlot::{UserA, UserB};

    #[test]
    fn accept_while_waiting_parks_on_one_side() {
        assert_eq!(apply_response(Pending, UserA, IntroResponse::Accept), Ok(UserAAccepted));
        assert_eq!(apply_response(Pending, UserB, IntroResponse::Accept), Ok(UserBAccepted));
    }

    #[test]
    fn dual_acceptance_reaches_both_accepted() {
        assert_eq!(apply_response(UserAAccepted, UserB, IntroResponse::Accept), Ok(BothAccepted));
        assert_eq!(apply_response(UserBAccepted, UserA, IntroResponse::Accept), Ok(BothAccepted));
    }

    #[test]
    fn decline_is_terminal_from_any_live_state() {
        assert_eq!(apply_response(Pending, UserA, IntroResponse::Decline), Ok(UserADeclined));
        assert_eq!(apply_response(UserAAccepted, UserB, IntroResponse::Decline), Ok(UserBDeclined));
        assert_eq!(apply_response(UserBAccepted, UserA, IntroResponse::Decline), Ok(UserADeclined));

        for terminal in [BothAccepted, UserADeclined, UserBDeclined, Expired] {
            assert_eq!(
                apply_response(terminal, UserB, IntroResponse::Accept),
                Err(TransitionError::Closed)
            );
            assert_eq!(
                apply_response(terminal, UserB, IntroResponse::Decline),
                Err(TransitionError::Closed)
            );
        }
    }

    #[test]
    fn second_response_from_same_side_is_rejected() {
        assert_eq!(
            apply_response(UserAAccepted, UserA, IntroResponse::Accept),
            Err(TransitionError::AlreadyResponded)
        );
        assert_eq!(
            apply_response(UserAAccepted, UserA, IntroResponse::Decline),
            Err(TransitionError::AlreadyResponded)
        );
        assert_eq!(
            apply_response(UserBAccepted, UserB, IntroResponse::Decline),
            Err(TransitionError::AlreadyResponded)
        );
    }

    #[test]
    fn expiry_is_stable_across_reads() {
        let expires = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let before = expires - Duration::hours(1);
        let after = expires + Duration::hours(1);

        assert_eq!(effective_status(Pending, expires, before), Pending);
        assert_eq!(effective_status(Pending, expires, after), Expired);
        // Same inputs, same answer - no flapping.
        assert_eq!(effective_status(Pending, expires, after), Expired);
        // Terminal states never turn into expired.
        assert_eq!(effective_status(BothAccepted, expires, after), BothAccepted);
        assert_eq!(effective_status(UserADeclined, expires, after), UserADeclined);
    }

    #[test]
    fn status_string_round_trip() {
        for status in [Pending, UserAAccepted, UserBAccepted, BothAccepted, UserADeclined, UserBDeclined, Expired] {
            assert_eq!(IntroductionStatus::from_str(status.as_str()).unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn outcome_serde_matches_storage_strings() {
        for outcome in [
            IntroductionOutcome::NoResponse,
            IntroductionOutcome::Declined,
            IntroductionOutcome::Chatted,
            IntroductionOutcome::Dated,
            IntroductionOutcome::Relationship,
        ] {
            let json = serde_json::to_string(&outcome).unwrap();
            assert_eq!(json, format!("\"{}\"", outcome.as_str()));
        }
    }
}
