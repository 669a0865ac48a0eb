//! In-process push hub.
//!
//! Handlers publish events addressed to user ids; each WebSocket connection
//! holds a [`Subscription`] that only yields events for its own user.
//! Delivery is best-effort: a subscriber that falls behind the channel
//! capacity skips the oldest events.

use std::sync::Arc;

use chess_core::Side;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ChallengeReceived { match_id: i64, from: String },
    MoveMade { match_id: i64, moves: i32, current_turn: Side },
    MatchEnded { match_id: i64, outcome: String },
    PresenceChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    Everyone,
    Users(Vec<i64>),
}

#[derive(Debug)]
struct Envelope {
    recipients: Recipients,
    event: Event,
}

impl Envelope {
    fn is_for(&self, user_id: i64) -> bool {
        match &self.recipients {
            Recipients::Everyone => true,
            Recipients::Users(ids) => ids.contains(&user_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Arc<Envelope>>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire and forget. Having no subscribers is not an error.
    pub fn publish(&self, recipients: Recipients, event: Event) {
        let _ = self.tx.send(Arc::new(Envelope { recipients, event }));
    }

    pub fn to_users(&self, users: &[i64], event: Event) {
        self.publish(Recipients::Users(users.to_vec()), event);
    }

    pub fn subscribe(&self, user_id: i64) -> Subscription {
        Subscription {
            user_id,
            rx: self.tx.subscribe(),
        }
    }
}

pub struct Subscription {
    user_id: i64,
    rx: broadcast::Receiver<Arc<Envelope>>,
}

impl Subscription {
    /// Next event addressed to this user, or `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(env) if env.is_for(self.user_id) => return Some(env.event.clone()),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber {} lagged, skipped {} events", self.user_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_are_filtered_by_recipient() {
        let hub = Notifier::new(16);
        let mut alice = hub.subscribe(1);
        let mut bob = hub.subscribe(2);

        hub.to_users(&[2], Event::ChallengeReceived { match_id: 9, from: "alice".into() });
        hub.publish(Recipients::Everyone, Event::PresenceChanged);

        assert_eq!(alice.next().await, Some(Event::PresenceChanged));
        assert_eq!(
            bob.next().await,
            Some(Event::ChallengeReceived { match_id: 9, from: "alice".into() })
        );
        assert_eq!(bob.next().await, Some(Event::PresenceChanged));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = Notifier::new(4);
        hub.publish(Recipients::Everyone, Event::PresenceChanged);

        // Subscribing later only sees later events.
        let mut late = hub.subscribe(1);
        hub.to_users(&[1], Event::MatchEnded { match_id: 3, outcome: "bob wins by resignation".into() });
        assert_eq!(
            late.next().await,
            Some(Event::MatchEnded { match_id: 3, outcome: "bob wins by resignation".into() })
        );
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_oldest() {
        let hub = Notifier::new(2);
        let mut sub = hub.subscribe(1);
        for moves in 1..=5 {
            hub.to_users(&[1], Event::MoveMade { match_id: 1, moves, current_turn: Side::White });
        }
        match sub.next().await {
            Some(Event::MoveMade { moves, .. }) => assert_eq!(moves, 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_hub_ends_subscription() {
        let hub = Notifier::new(4);
        let mut sub = hub.subscribe(1);
        drop(hub);
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn test_event_json() {
        let json = serde_json::to_value(Event::MoveMade {
            match_id: 1,
            moves: 2,
            current_turn: Side::Black,
        })
        .unwrap();
        assert_eq!(json["type"], "move_made");
        assert_eq!(json["current_turn"], "black");
    }
}
