//! Event bus with backpressure-aware fan-out
//!
//! Per-symbol topics for trades, depth, and BBO. Each subscriber owns a
//! bounded queue; publishing never waits on a consumer. On overflow the
//! oldest event is dropped and the subscriber sees a `Lagged { missed }`
//! item before its next event. Consecutive depth snapshots for a topic
//! are coalesced to the newest — depth topics never interleave with
//! trades, so coalescing cannot reorder a snapshot past a trade.
//!
//! Dropping a `Subscription` removes the subscriber and releases its
//! buffer on the next publish.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::events::{MarketEvent, Topic};

/// Bus configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Maximum queued events per subscriber.
    pub subscriber_capacity: usize,
    /// Collapse consecutive queued depth snapshots into the newest.
    pub coalesce_depth: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 1024,
            coalesce_depth: true,
        }
    }
}

/// Bounded per-subscriber event queue.
#[derive(Debug)]
struct SubscriberQueue {
    events: VecDeque<MarketEvent>,
    capacity: usize,
    coalesce_depth: bool,
    /// Events dropped since the subscriber last observed the lag.
    missed: u64,
    /// Lifetime drop count, for diagnostics.
    total_dropped: u64,
    closed: bool,
}

impl SubscriberQueue {
    fn new(capacity: usize, coalesce_depth: bool) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            coalesce_depth,
            missed: 0,
            total_dropped: 0,
            closed: false,
        }
    }

    fn push(&mut self, event: MarketEvent) {
        if self.coalesce_depth {
            if let MarketEvent::Depth(_) = event {
                if let Some(back @ MarketEvent::Depth(_)) = self.events.back_mut() {
                    *back = event;
                    return;
                }
            }
        }

        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.missed += 1;
            self.total_dropped += 1;
        }
        self.events.push_back(event);
    }
}

#[derive(Debug)]
struct SubscriberShared {
    queue: Mutex<SubscriberQueue>,
    notify: Notify,
}

/// Fan-out bus for market events.
///
/// Cheap to clone; all clones publish into the same subscriber set.
#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

#[derive(Debug)]
struct BusInner {
    config: BusConfig,
    topics: Mutex<HashMap<Topic, Vec<Arc<SubscriberShared>>>>,
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                config,
                topics: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a subscriber on a topic.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let shared = Arc::new(SubscriberShared {
            queue: Mutex::new(SubscriberQueue::new(
                self.inner.config.subscriber_capacity,
                self.inner.config.coalesce_depth,
            )),
            notify: Notify::new(),
        });

        let mut topics = self.inner.topics.lock().unwrap();
        topics
            .entry(topic.clone())
            .or_default()
            .push(Arc::clone(&shared));
        debug!(symbol = %topic.symbol, kind = ?topic.kind, "subscriber registered");

        Subscription { shared, topic }
    }

    /// Publish an event to all live subscribers of a topic.
    ///
    /// Never blocks on a consumer; closed subscribers are pruned here.
    pub fn publish(&self, topic: &Topic, event: MarketEvent) {
        let mut topics = self.inner.topics.lock().unwrap();
        let Some(subscribers) = topics.get_mut(topic) else {
            return;
        };

        subscribers.retain(|shared| {
            let mut queue = shared.queue.lock().unwrap();
            if queue.closed {
                return false;
            }
            let dropped_before = queue.total_dropped;
            queue.push(event.clone());
            if queue.total_dropped > dropped_before {
                warn!(
                    symbol = %topic.symbol,
                    kind = ?topic.kind,
                    dropped = queue.total_dropped,
                    "subscriber lagging, dropped oldest event"
                );
            }
            drop(queue);
            shared.notify.notify_one();
            true
        });

        if subscribers.is_empty() {
            topics.remove(topic);
        }
    }

    /// Number of live subscribers on a topic.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        let topics = self.inner.topics.lock().unwrap();
        topics
            .get(topic)
            .map(|subs| {
                subs.iter()
                    .filter(|s| !s.queue.lock().unwrap().closed)
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    shared: Arc<SubscriberShared>,
    topic: Topic,
}

impl Subscription {
    /// Receive the next event, waiting if the queue is empty.
    ///
    /// If events were dropped since the last receive, a
    /// `MarketEvent::Lagged` item is delivered first.
    pub async fn recv(&mut self) -> MarketEvent {
        loop {
            {
                let mut queue = self.shared.queue.lock().unwrap();
                if queue.missed > 0 {
                    let missed = queue.missed;
                    queue.missed = 0;
                    return MarketEvent::Lagged { missed };
                }
                if let Some(event) = queue.events.pop_front() {
                    return event;
                }
            }
            // notify_one stores a permit, so an event published between
            // the check above and this await wakes us immediately
            self.shared.notify.notified().await;
        }
    }

    /// Receive without waiting; None if the queue is empty.
    pub fn try_recv(&mut self) -> Option<MarketEvent> {
        let mut queue = self.shared.queue.lock().unwrap();
        if queue.missed > 0 {
            let missed = queue.missed;
            queue.missed = 0;
            return Some(MarketEvent::Lagged { missed });
        }
        queue.events.pop_front()
    }

    /// The topic this subscription is attached to.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Lifetime count of events dropped for this subscriber.
    pub fn total_dropped(&self) -> u64 {
        self.shared.queue.lock().unwrap().total_dropped
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut queue = self.shared.queue.lock().unwrap();
        queue.closed = true;
        queue.events.clear();
    }
}
