use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::models::{Conversation, NewConversation, NewConversationParticipant, NewMessage};
use crate::schema::{conversation_participants, conversations, messages};

pub const TYPE_DIRECT: &str = "direct";
pub const TYPE_GROUP: &str = "group";
pub const ROLE_MEMBER: &str = "member";
pub const ROLE_MATCHMAKER: &str = "matchmaker";

/// Storage key enforcing "at most one direct conversation per unordered
/// pair": the two user ids in lexicographic order, backed by a unique
/// constraint on `conversations.direct_key`.
pub fn direct_key(a: Uuid, b: Uuid) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}:{hi}")
}

/// Existence check via membership intersection: a direct conversation both
/// users participate in.
pub fn find_direct_conversation(
    conn: &mut PgConnection,
    a: Uuid,
    b: Uuid,
) -> QueryResult<Option<Conversation>> {
    let a_conversations: Vec<Uuid> = conversation_participants::table
        .filter(conversation_participants::user_id.eq(a))
        .select(conversation_participants::conversation_id)
        .load::<Uuid>(conn)?;

    if a_conversations.is_empty() {
        return Ok(None);
    }

    let shared: Vec<Uuid> = conversation_participants::table
        .filter(conversation_participants::user_id.eq(b))
        .filter(conversation_participants::conversation_id.eq_any(&a_conversations))
        .select(conversation_participants::conversation_id)
        .load::<Uuid>(conn)?;

    if shared.is_empty() {
        return Ok(None);
    }

    conversations::table
        .filter(conversations::id.eq_any(&shared))
        .filter(conversations::conversation_type.eq(TYPE_DIRECT))
        .first::<Conversation>(conn)
        .optional()
}

/// Idempotent create-or-fetch of the direct conversation for a pair.
///
/// The conversation row and both participant rows are written in one
/// transaction, so a failure after the conversation insert rolls the row
/// back rather than leaving a participant-less conversation behind. Two
/// racing callers may both pass the existence check; the loser's insert
/// hits the `direct_key` unique constraint and is folded into fetching the
/// winner's row.
///
/// Returns the conversation and whether this call created it.
pub fn ensure_direct_conversation(
    conn: &mut PgConnection,
    a: Uuid,
    b: Uuid,
    created_by: Uuid,
) -> QueryResult<(Conversation, bool)> {
    if let Some(existing) = find_direct_conversation(conn, a, b)? {
        return Ok((existing, false));
    }

    let key = direct_key(a, b);
    let attempt = conn.transaction::<Conversation, DieselError, _>(|conn| {
        let conversation: Conversation = diesel::insert_into(conversations::table)
            .values(&NewConversation {
                conversation_type: TYPE_DIRECT.to_string(),
                direct_key: Some(key.clone()),
                title: None,
                created_by: Some(created_by),
            })
            .get_result(conn)?;

        let participants: Vec<NewConversationParticipant> = [a, b]
            .into_iter()
            .map(|user_id| NewConversationParticipant {
                conversation_id: conversation.id,
                user_id,
                role: ROLE_MEMBER.to_string(),
            })
            .collect();

        diesel::insert_into(conversation_participants::table)
            .values(&participants)
            .execute(conn)?;

        Ok(conversation)
    });

    match attempt {
        Ok(conversation) => Ok((conversation, true)),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            let existing = conversations::table
                .filter(conversations::direct_key.eq(&key))
                .first::<Conversation>(conn)?;
            Ok((existing, false))
        }
        Err(e) => Err(e),
    }
}

/// Three-party conversation for a dually-accepted introduction: both
/// invitees plus the matchmaker, seeded with the original introduction
/// message as the first message in the thread.
pub fn create_introduction_conversation(
    conn: &mut PgConnection,
    matchmaker_id: Uuid,
    user_a_id: Uuid,
    user_b_id: Uuid,
    intro_message: &str,
) -> QueryResult<Conversation> {
    conn.transaction(|conn| {
        let conversation: Conversation = diesel::insert_into(conversations::table)
            .values(&NewConversation {
                conversation_type: TYPE_GROUP.to_string(),
                direct_key: None,
                title: Some("Introduction".to_string()),
                created_by: Some(matchmaker_id),
            })
            .get_result(conn)?;

        let participants = vec![
            NewConversationParticipant {
                conversation_id: conversation.id,
                user_id: user_a_id,
                role: ROLE_MEMBER.to_string(),
            },
            NewConversationParticipant {
                conversation_id: conversation.id,
                user_id: user_b_id,
                role: ROLE_MEMBER.to_string(),
            },
            NewConversationParticipant {
                conversation_id: conversation.id,
                user_id: matchmaker_id,
                role: ROLE_MATCHMAKER.to_string(),
            },
        ];

        diesel::insert_into(conversation_participants::table)
            .values(&participants)
            .execute(conn)?;

        diesel::insert_into(messages::table)
            .values(&NewMessage {
                conversation_id: conversation.id,
                sender_id: matchmaker_id,
                content: intro_message.to_string(),
            })
            .execute(conn)?;

        Ok(conversation)
    })
}

/// Batch lookup of direct conversations by pair key, for enriching match
/// listings with an existing conversation id.
pub fn direct_conversations_by_keys(
    conn: &mut PgConnection,
    keys: &[String],
) -> QueryResult<Vec<Conversation>> {
    if keys.is_empty() {
        return Ok(vec![]);
    }
    conversations::table
        .filter(conversations::conversation_type.eq(TYPE_DIRECT))
        .filter(conversations::direct_key.eq_any(keys))
        .load::<Conversation>(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_key_ignores_argument_order() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert_eq!(direct_key(a, b), direct_key(b, a));
        assert_ne!(direct_key(a, b), direct_key(a, a));
    }

    #[test]
    fn direct_key_is_lexicographically_ordered() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let key = direct_key(a, b);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        assert_eq!(key, format!("{lo}:{hi}"));
    }
}
