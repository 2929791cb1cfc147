use uuid::Uuid;

use amora_shared::clients::rabbitmq::RabbitMQClient;
use amora_shared::types::event::{payloads, routing_keys, Event};

/// Notification decision for a fresh mutual match: only the party who did
/// not just act gets notified; the actor sees the result synchronously.
pub async fn publish_mutual_match(
    rabbitmq: &RabbitMQClient,
    notify_user_id: Uuid,
    matched_user_id: Uuid,
    matched_display_name: &str,
    conversation_id: Uuid,
) {
    let event = Event::new(
        "amora-matching",
        routing_keys::MATCHING_MATCH_CREATED,
        payloads::MutualMatchCreated {
            notify_user_id,
            matched_user_id,
            matched_display_name: matched_display_name.to_string(),
            conversation_id,
        },
    )
    .with_user(notify_user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_MATCH_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish match.created event");
    }
}

/// Points-ledger decision for a configured super-like cost. The ledger
/// itself is external; we only emit the charge decision.
pub async fn publish_superlike_charged(
    rabbitmq: &RabbitMQClient,
    actor_id: Uuid,
    target_id: Uuid,
    cost: u32,
) {
    let event = Event::new(
        "amora-matching",
        routing_keys::MATCHING_SUPERLIKE_CHARGED,
        payloads::SuperLikeCharged { actor_id, target_id, cost },
    )
    .with_user(actor_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MATCHING_SUPERLIKE_CHARGED, &event).await {
        tracing::error!(error = %e, "failed to publish superlike.charged event");
    }
}

/// One decision per invitee when a broker opens an introduction.
pub async fn publish_introduction_created(
    rabbitmq: &RabbitMQClient,
    introduction_id: Uuid,
    matchmaker_id: Uuid,
    invitee_id: Uuid,
    other_invitee_id: Uuid,
) {
    let event = Event::new(
        "amora-matching",
        routing_keys::INTRO_CREATED,
        payloads::IntroductionCreated {
            introduction_id,
            matchmaker_id,
            invitee_id,
            other_invitee_id,
        },
    )
    .with_user(invitee_id)
    .with_correlation(introduction_id);

    if let Err(e) = rabbitmq.publish(routing_keys::INTRO_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish introduction.created event");
    }
}

pub async fn publish_introduction_responded(
    rabbitmq: &RabbitMQClient,
    introduction_id: Uuid,
    responder_id: Uuid,
    accepted: bool,
    status: &str,
) {
    let event = Event::new(
        "amora-matching",
        routing_keys::INTRO_RESPONDED,
        payloads::IntroductionResponded {
            introduction_id,
            responder_id,
            accepted,
            status: status.to_string(),
        },
    )
    .with_user(responder_id)
    .with_correlation(introduction_id);

    if let Err(e) = rabbitmq.publish(routing_keys::INTRO_RESPONDED, &event).await {
        tracing::error!(error = %e, "failed to publish introduction.responded event");
    }
}

pub async fn publish_introduction_completed(
    rabbitmq: &RabbitMQClient,
    introduction_id: Uuid,
    conversation_id: Uuid,
    matchmaker_id: Uuid,
    user_a_id: Uuid,
    user_b_id: Uuid,
) {
    let event = Event::new(
        "amora-matching",
        routing_keys::INTRO_COMPLETED,
        payloads::IntroductionCompleted {
            introduction_id,
            conversation_id,
            matchmaker_id,
            user_a_id,
            user_b_id,
        },
    )
    .with_correlation(introduction_id);

    if let Err(e) = rabbitmq.publish(routing_keys::INTRO_COMPLETED, &event).await {
        tracing::error!(error = %e, "failed to publish introduction.completed event");
    }
}

pub async fn publish_conversation_created(
    rabbitmq: &RabbitMQClient,
    conversation_id: Uuid,
    conversation_type: &str,
    participant_ids: Vec<Uuid>,
) {
    let event = Event::new(
        "amora-matching",
        routing_keys::MESSAGING_CONVERSATION_CREATED,
        payloads::ConversationCreated {
            conversation_id,
            conversation_type: conversation_type.to_string(),
            participant_ids,
        },
    );

    if let Err(e) = rabbitmq
        .publish(routing_keys::MESSAGING_CONVERSATION_CREATED, &event)
        .await
    {
        tracing::error!(error = %e, "failed to publish conversation.created event");
    }
}
