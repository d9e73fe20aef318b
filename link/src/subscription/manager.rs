//! `SubscriptionManager` – the set of topics this session wants pushed.

use std::collections::BTreeMap;

use crate::{
    connection::TransportHandle,
    models::{ClientMessage, SubscriptionInfo, Topic},
};

struct TopicEntry {
    subject_id: String,
    requested_at_ms: u64,
    wire_requests: u64,
}

/// Result of [`SubscriptionManager::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    /// The topic was not in the set before.
    pub newly_added: bool,
    /// A subscribe frame was written to the transport.
    pub sent: bool,
}

/// Tracks requested topics and replays them on every `Connected` transition.
///
/// The set only grows: there is no unsubscribe. Re-requesting a topic keeps
/// one entry but still writes a subscribe frame when connected, because the
/// server may have dropped its side independently.
#[derive(Default)]
pub struct SubscriptionManager {
    topics: BTreeMap<Topic, TopicEntry>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `topic` for `subject_id` and, when `link` is connected, ask the
    /// server for it right away.
    ///
    /// Re-requesting a topic for another subject updates the subject used
    /// by later replays.
    pub fn request(
        &mut self,
        topic: Topic,
        subject_id: &str,
        link: Option<&dyn TransportHandle>,
        now_ms: u64,
    ) -> RequestOutcome {
        let mut newly_added = false;
        let entry = self.topics.entry(topic).or_insert_with(|| {
            newly_added = true;
            TopicEntry {
                subject_id: subject_id.to_string(),
                requested_at_ms: now_ms,
                wire_requests: 0,
            }
        });
        if entry.subject_id != subject_id {
            log::debug!(
                "[dashboard-link] Topic '{}' moved from subject '{}' to '{}'",
                topic,
                entry.subject_id,
                subject_id
            );
            entry.subject_id = subject_id.to_string();
        }

        let sent = match link {
            Some(link) if link.is_connected() => send_subscribe(link, topic, entry),
            _ => false,
        };

        RequestOutcome { newly_added, sent }
    }

    /// Write one subscribe frame per topic in the set.
    ///
    /// Returns how many frames the transport accepted.
    pub fn replay_all(&mut self, link: &dyn TransportHandle) -> usize {
        if self.topics.is_empty() {
            return 0;
        }
        log::info!(
            "[dashboard-link] Replaying {} topic subscription(s)",
            self.topics.len()
        );

        let mut sent = 0;
        for (topic, entry) in self.topics.iter_mut() {
            if send_subscribe(link, *topic, entry) {
                sent += 1;
            } else {
                log::debug!("[dashboard-link] Replay of '{}' skipped: transport not connected", topic);
            }
        }
        sent
    }

    pub fn contains(&self, topic: Topic) -> bool {
        self.topics.contains_key(&topic)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Snapshot of every entry, ordered by topic.
    pub fn snapshot(&self) -> Vec<SubscriptionInfo> {
        self.topics
            .iter()
            .map(|(topic, entry)| SubscriptionInfo {
                topic: *topic,
                subject_id: entry.subject_id.clone(),
                requested_at_ms: entry.requested_at_ms,
                wire_requests: entry.wire_requests,
            })
            .collect()
    }
}

fn send_subscribe(link: &dyn TransportHandle, topic: Topic, entry: &mut TopicEntry) -> bool {
    let msg = ClientMessage::Subscribe {
        topic,
        subject_id: entry.subject_id.clone(),
    };
    let sent = link.send(&msg);
    if sent {
        entry.wire_requests += 1;
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingLink {
        connected: AtomicBool,
        sent: Mutex<Vec<ClientMessage>>,
    }

    impl RecordingLink {
        fn connected() -> Self {
            let link = Self::default();
            link.connected.store(true, Ordering::SeqCst);
            link
        }

        fn topics(&self) -> Vec<Topic> {
            self.sent
                .lock()
                .iter()
                .filter_map(|m| match m {
                    ClientMessage::Subscribe { topic, .. } => Some(*topic),
                    _ => None,
                })
                .collect()
        }
    }

    impl TransportHandle for RecordingLink {
        fn send(&self, message: &ClientMessage) -> bool {
            if !self.connected.load(Ordering::SeqCst) {
                return false;
            }
            self.sent.lock().push(message.clone());
            true
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn close(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_request_while_disconnected_only_records() {
        let mut manager = SubscriptionManager::new();
        let outcome = manager.request(Topic::Orders, "m-1", None, 10);
        assert_eq!(outcome, RequestOutcome { newly_added: true, sent: false });
        assert!(manager.contains(Topic::Orders));

        let offline = RecordingLink::default();
        let outcome = manager.request(Topic::Cashback, "m-1", Some(&offline), 11);
        assert!(outcome.newly_added);
        assert!(!outcome.sent);
        assert!(offline.sent.lock().is_empty());
    }

    #[test]
    fn test_duplicate_request_resends_when_connected() {
        let mut manager = SubscriptionManager::new();
        let link = RecordingLink::connected();

        let first = manager.request(Topic::Products, "m-1", Some(&link), 1);
        let second = manager.request(Topic::Products, "m-1", Some(&link), 2);

        assert!(first.newly_added && first.sent);
        assert!(!second.newly_added && second.sent);
        assert_eq!(manager.len(), 1);
        assert_eq!(link.topics(), vec![Topic::Products, Topic::Products]);

        let info = &manager.snapshot()[0];
        assert_eq!(info.requested_at_ms, 1);
        assert_eq!(info.wire_requests, 2);
    }

    #[test]
    fn test_replay_sends_each_topic_once() {
        let mut manager = SubscriptionManager::new();
        manager.request(Topic::Orders, "m-1", None, 1);
        manager.request(Topic::Cashback, "m-1", None, 2);

        let link = RecordingLink::connected();
        assert_eq!(manager.replay_all(&link), 2);

        let mut topics = link.topics();
        topics.sort();
        assert_eq!(topics, vec![Topic::Orders, Topic::Cashback]);
    }

    #[test]
    fn test_replay_uses_latest_subject() {
        let mut manager = SubscriptionManager::new();
        manager.request(Topic::Metrics, "m-old", None, 1);
        manager.request(Topic::Metrics, "m-new", None, 2);

        let link = RecordingLink::connected();
        manager.replay_all(&link);
        assert_eq!(
            *link.sent.lock(),
            vec![ClientMessage::Subscribe {
                topic: Topic::Metrics,
                subject_id: "m-new".to_string(),
            }]
        );
    }

    #[test]
    fn test_replay_on_dead_link_sends_nothing() {
        let mut manager = SubscriptionManager::new();
        manager.request(Topic::Notifications, "m-1", None, 1);
        let link = RecordingLink::default();
        assert_eq!(manager.replay_all(&link), 0);
        assert_eq!(manager.snapshot()[0].wire_requests, 0);
    }

    #[test]
    fn test_replay_empty_set() {
        let mut manager = SubscriptionManager::new();
        let link = RecordingLink::connected();
        assert_eq!(manager.replay_all(&link), 0);
        assert!(manager.is_empty());
    }
}
