//! Dual-class admission queue.
//!
//! Emergency and normal units live in two FIFO lanes guarded by a single mutex,
//! so the cross-lane priority check in [`AdmissionQueue::take_next`] is atomic with
//! respect to concurrent enqueues. The critical section never awaits.
mod error;
pub use error::QueueError;

use std::{
    collections::VecDeque,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tokio::time::Instant;
use tracing::trace;

use junction_model::{Label, Priority};

use crate::unit::{Unit, UnitId, UnitView};

/// Number of waiting units per class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub emergency: usize,
    pub normal: usize,
}

impl QueueDepth {
    #[inline]
    pub fn total(&self) -> usize {
        self.emergency + self.normal
    }
}

impl fmt::Display for QueueDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emergency={} normal={}", self.emergency, self.normal)
    }
}

/// Both lanes plus the arrival counter; only ever touched under the queue mutex.
#[derive(Debug)]
struct Lanes {
    emergency: VecDeque<Unit>,
    normal: VecDeque<Unit>,
    next_seq: u64,
}

impl Lanes {
    fn len(&self) -> usize {
        self.emergency.len() + self.normal.len()
    }

    fn lane_mut(&mut self, priority: Priority) -> &mut VecDeque<Unit> {
        match priority {
            Priority::Emergency => &mut self.emergency,
            Priority::Normal => &mut self.normal,
        }
    }
}

/// Holding area for units waiting to cross.
pub(crate) struct AdmissionQueue {
    lanes: Mutex<Lanes>,
    capacity: Option<usize>,
}

impl AdmissionQueue {
    /// Create a queue; `capacity = None` means unbounded.
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            lanes: Mutex::new(Lanes {
                emergency: VecDeque::new(),
                normal: VecDeque::new(),
                next_seq: 1,
            }),
            capacity,
        }
    }

    // Every operation leaves the lanes consistent before returning, so a poisoned
    // lock only means some unrelated caller panicked; the data is still usable.
    fn lock(&self) -> MutexGuard<'_, Lanes> {
        self.lanes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a unit into its class lane.
    ///
    /// The arrival sequence is assigned under the same lock as the insertion,
    /// so lane order always equals sequence order.
    pub(crate) fn enqueue(
        &self,
        label: impl Into<Label>,
        priority: Priority,
    ) -> Result<UnitId, QueueError> {
        let label = label.into();
        let mut lanes = self.lock();

        if let Some(capacity) = self.capacity {
            if lanes.len() >= capacity {
                return Err(QueueError::Full { capacity });
            }
        }
        let seq = lanes.next_seq;
        lanes.next_seq += 1;

        let unit = Unit::new(seq, label, priority, Instant::now());
        let id = unit.id();
        lanes.lane_mut(priority).push_back(unit);

        trace!(unit = %id, priority = %priority, "unit admitted");
        Ok(id)
    }

    /// Remove and return the next unit to release.
    ///
    /// Head of the emergency lane if any, otherwise head of the normal lane.
    /// `None` only when both lanes are empty at call time.
    pub(crate) fn take_next(&self) -> Option<Unit> {
        let mut lanes = self.lock();
        lanes
            .emergency
            .pop_front()
            .or_else(|| lanes.normal.pop_front())
    }

    /// Owned copy of the waiting units: emergency first, then normal, each in arrival order.
    pub(crate) fn snapshot(&self) -> Vec<UnitView> {
        let lanes = self.lock();
        let now = Instant::now();

        let mut out = Vec::with_capacity(lanes.len());
        out.extend(lanes.emergency.iter().map(|u| u.view(now)));
        out.extend(lanes.normal.iter().map(|u| u.view(now)));
        out
    }

    pub(crate) fn depth(&self) -> QueueDepth {
        let lanes = self.lock();
        QueueDepth {
            emergency: lanes.emergency.len(),
            normal: lanes.normal.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{collections::HashSet, thread};

    fn drain(queue: &AdmissionQueue) -> Vec<Unit> {
        std::iter::from_fn(|| queue.take_next()).collect()
    }

    #[test]
    fn emergency_overtakes_earlier_normal_units() {
        let queue = AdmissionQueue::new(None);
        queue.enqueue("car-1", Priority::Normal).unwrap();
        queue.enqueue("car-2", Priority::Normal).unwrap();
        queue.enqueue("ambulance-1", Priority::Emergency).unwrap();

        let order: Vec<String> = (0..3)
            .map(|_| queue.take_next().expect("unit expected").label)
            .collect();

        assert_eq!(order, ["ambulance-1", "car-1", "car-2"]);
        assert!(queue.take_next().is_none());
    }

    #[test]
    fn fifo_within_each_class() {
        let queue = AdmissionQueue::new(None);
        for i in 0..5 {
            queue.enqueue(format!("car-{i}"), Priority::Normal).unwrap();
            queue.enqueue(format!("fire-{i}"), Priority::Emergency).unwrap();
        }

        let labels: Vec<String> = drain(&queue).into_iter().map(|u| u.label).collect();
        assert_eq!(
            labels,
            [
                "fire-0", "fire-1", "fire-2", "fire-3", "fire-4", "car-0", "car-1", "car-2",
                "car-3", "car-4",
            ]
        );
    }

    #[test]
    fn take_next_is_none_only_when_empty() {
        let queue = AdmissionQueue::new(None);
        assert!(queue.take_next().is_none());

        queue.enqueue("car", Priority::Normal).unwrap();
        assert!(queue.take_next().is_some());
        assert!(queue.take_next().is_none());

        queue.enqueue("ambulance", Priority::Emergency).unwrap();
        assert_eq!(queue.len(), 1);
        assert!(queue.take_next().is_some());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn arrival_seq_spans_both_classes() {
        let queue = AdmissionQueue::new(None);
        let a = queue.enqueue("car", Priority::Normal).unwrap();
        let b = queue.enqueue("ambulance", Priority::Emergency).unwrap();
        let c = queue.enqueue("car", Priority::Normal).unwrap();

        assert_eq!((a.get(), b.get(), c.get()), (1, 2, 3));
    }

    #[test]
    fn snapshot_lists_emergency_first_and_is_detached() {
        let queue = AdmissionQueue::new(None);
        queue.enqueue("car-1", Priority::Normal).unwrap();
        queue.enqueue("ambulance-1", Priority::Emergency).unwrap();
        queue.enqueue("car-2", Priority::Normal).unwrap();

        let snap = queue.snapshot();
        let labels: Vec<&str> = snap.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, ["ambulance-1", "car-1", "car-2"]);
        assert_eq!(snap[0].arrival_seq, 2);

        queue.take_next();
        queue.enqueue("fire-1", Priority::Emergency).unwrap();

        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0].label, "ambulance-1");
        assert_eq!(queue.depth(), QueueDepth { emergency: 1, normal: 2 });
    }

    #[test]
    fn bounded_queue_rejects_when_full() {
        let queue = AdmissionQueue::new(Some(2));
        queue.enqueue("car-1", Priority::Normal).unwrap();
        queue.enqueue("ambulance", Priority::Emergency).unwrap();

        let err = queue.enqueue("car-2", Priority::Normal).unwrap_err();
        assert_eq!(err, QueueError::Full { capacity: 2 });

        queue.take_next();
        let id = queue.enqueue("car-2", Priority::Normal).unwrap();
        // rejected attempts do not consume a sequence number
        assert_eq!(id.get(), 3);
    }

    #[test]
    fn concurrent_enqueue_loses_nothing() {
        let queue = AdmissionQueue::new(None);

        thread::scope(|s| {
            for i in 0..100 {
                let queue = &queue;
                s.spawn(move || {
                    queue.enqueue(format!("car-{i}"), Priority::Normal).unwrap();
                });
            }
        });

        let units = drain(&queue);
        assert_eq!(units.len(), 100);

        let labels: HashSet<&str> = units.iter().map(|u| u.label()).collect();
        assert_eq!(labels.len(), 100);

        assert!(
            units.windows(2).all(|w| w[0].arrival_seq < w[1].arrival_seq),
            "arrival sequence must be strictly increasing in release order"
        );
    }

    #[test]
    fn concurrent_producers_keep_per_producer_fifo() {
        let queue = AdmissionQueue::new(None);

        thread::scope(|s| {
            for p in 0..8 {
                let queue = &queue;
                s.spawn(move || {
                    for j in 0..50 {
                        queue.enqueue(format!("{p}:{j}"), Priority::Normal).unwrap();
                    }
                });
            }
        });

        let mut last_seen = [None::<u32>; 8];
        for unit in drain(&queue) {
            let (p, j) = unit.label().split_once(':').unwrap();
            let (p, j): (usize, u32) = (p.parse().unwrap(), j.parse().unwrap());
            if let Some(prev) = last_seen[p] {
                assert!(j > prev, "producer {p} released {j} after {prev}");
            }
            last_seen[p] = Some(j);
        }
        assert!(last_seen.iter().all(|s| *s == Some(49)));
    }

    #[test]
    fn concurrent_takers_never_share_a_unit() {
        let queue = AdmissionQueue::new(None);
        for i in 0..1_000 {
            let priority = if i % 7 == 0 {
                Priority::Emergency
            } else {
                Priority::Normal
            };
            queue.enqueue(format!("u{i}"), priority).unwrap();
        }

        let taken: Vec<Vec<u64>> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let queue = &queue;
                    s.spawn(move || {
                        std::iter::from_fn(|| queue.take_next())
                            .map(|u| u.arrival_seq())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let all: Vec<u64> = taken.into_iter().flatten().collect();
        let unique: HashSet<u64> = all.iter().copied().collect();
        assert_eq!(all.len(), 1_000);
        assert_eq!(unique.len(), 1_000);
    }
}
