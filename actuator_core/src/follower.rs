//! Leader/follower output mirroring.
//!
//! A leader keeps weak references to its followers' output cells. While it has
//! at least one follower, a background thread copies the leader's most recent
//! output into every follower cell once per synchronization period. The
//! leader's own update tick also pushes its new output immediately.
//!
//! Each `FollowerSync` owns exactly one thread, which is stopped and joined
//! when the sync is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use actuator_traits::clock::Clock;

use crate::ActuatorId;
use crate::atomic::OutputCell;

type Members = Arc<Mutex<Vec<(ActuatorId, Weak<OutputCell>)>>>;

/// Copy `volts` into every live member, pruning dropped followers.
fn broadcast(members: &Members, volts: f64) -> usize {
    let Ok(mut list) = members.lock() else {
        return 0;
    };
    list.retain(|(_, w)| match w.upgrade() {
        Some(cell) => {
            cell.store(volts);
            true
        }
        None => false,
    });
    list.len()
}

/// Periodic synchronization thread for one leader.
pub struct FollowerSync {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl FollowerSync {
    fn spawn<C: Clock + Send + 'static>(
        leader: Arc<OutputCell>,
        members: Members,
        period: Duration,
        clock: C,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("follower sync received shutdown signal");
                    break;
                }
                broadcast(&members, leader.load());
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("follower sync thread exiting cleanly");
        });
        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }
}

impl Drop for FollowerSync {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // The thread exits within one period (it sleeps at most `period`).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("follower sync thread joined"),
                Err(e) => tracing::warn!(?e, "follower sync thread panicked during shutdown"),
            }
        }
    }
}

/// The ordered follower set owned by a leader.
pub struct FollowerSet {
    members: Members,
    sync: Option<FollowerSync>,
    period: Duration,
}

impl FollowerSet {
    pub fn new(period: Duration) -> Self {
        Self {
            members: Arc::new(Mutex::new(Vec::new())),
            sync: None,
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Register a follower; starts the sync thread on the first registration.
    /// Returns false if the follower was already registered.
    pub fn add<C: Clock + Send + 'static>(
        &mut self,
        id: ActuatorId,
        cell: &Arc<OutputCell>,
        leader: &Arc<OutputCell>,
        clock: C,
    ) -> bool {
        {
            let Ok(mut list) = self.members.lock() else {
                return false;
            };
            if list.iter().any(|(m, _)| *m == id) {
                return false;
            }
            list.push((id, Arc::downgrade(cell)));
        }
        cell.store(leader.load());
        if self.sync.is_none() {
            self.sync = Some(FollowerSync::spawn(
                Arc::clone(leader),
                Arc::clone(&self.members),
                self.period,
                clock,
            ));
            tracing::debug!(period_ms = self.period.as_millis() as u64, "follower sync started");
        }
        true
    }

    /// Deregister a follower; stops the sync thread once the set is empty.
    /// Returns false if `id` was not registered.
    pub fn remove(&mut self, id: ActuatorId) -> bool {
        let (removed, empty) = match self.members.lock() {
            Ok(mut list) => {
                let present = list.iter().any(|(m, _)| *m == id);
                list.retain(|(m, w)| *m != id && w.strong_count() > 0);
                (present, list.is_empty())
            }
            Err(_) => (false, false),
        };
        if empty && self.sync.take().is_some() {
            tracing::debug!("follower sync stopped");
        }
        removed
    }

    /// Push `volts` to all followers now. Returns the number of live followers.
    pub fn broadcast(&self, volts: f64) -> usize {
        broadcast(&self.members, volts)
    }

    pub fn ids(&self) -> Vec<ActuatorId> {
        self.members
            .lock()
            .map(|l| {
                l.iter()
                    .filter(|(_, w)| w.strong_count() > 0)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_some()
    }
}

impl Drop for FollowerSet {
    fn drop(&mut self) {
        // Stop the thread before releasing followers so it cannot overwrite the release.
        drop(self.sync.take());
        if let Ok(list) = self.members.lock() {
            for (_, w) in list.iter() {
                if let Some(cell) = w.upgrade() {
                    cell.set_leader(None);
                    cell.store(0.0);
                }
            }
        }
    }
}
