//! Lock-free output cell shared between the control thread and timer threads.
//!
//! The output voltage is the only field written across threads. It is stored
//! as `f64` bits in an `AtomicU64`, so readers always observe a complete value.
//! The link to the leader's cell only changes on follow/unfollow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::ActuatorId;

const NO_LEADER: u64 = 0;

#[derive(Debug, Default)]
pub struct OutputCell {
    volts_bits: AtomicU64,
    /// 0 = not following, otherwise leader id + 1.
    leader: AtomicU64,
    upstream: Mutex<Weak<OutputCell>>,
}

impl OutputCell {
    pub fn new() -> Self {
        Self {
            volts_bits: AtomicU64::new(0.0f64.to_bits()),
            leader: AtomicU64::new(NO_LEADER),
            upstream: Mutex::new(Weak::new()),
        }
    }

    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.volts_bits.load(Ordering::Acquire))
    }

    #[inline]
    pub fn store(&self, volts: f64) {
        self.volts_bits.store(volts.to_bits(), Ordering::Release);
    }

    pub fn leader(&self) -> Option<ActuatorId> {
        match self.leader.load(Ordering::Acquire) {
            NO_LEADER => None,
            n => u32::try_from(n - 1).ok().map(ActuatorId),
        }
    }

    /// Record the leader id. Clearing it also drops the link to the leader's cell.
    pub fn set_leader(&self, leader: Option<ActuatorId>) {
        let v = leader.map_or(NO_LEADER, |id| u64::from(id.0) + 1);
        self.leader.store(v, Ordering::Release);
        if leader.is_none()
            && let Ok(mut up) = self.upstream.lock()
        {
            *up = Weak::new();
        }
    }

    /// Link this cell to the output cell of the leader it follows.
    pub fn set_upstream(&self, leader: &Arc<OutputCell>) {
        if let Ok(mut up) = self.upstream.lock() {
            *up = Arc::downgrade(leader);
        }
    }

    fn upstream(&self) -> Option<Arc<OutputCell>> {
        self.upstream.lock().ok().and_then(|up| up.upgrade())
    }

    /// Whether `id` leads this cell, directly or anywhere up the leader chain.
    pub fn led_by(&self, id: ActuatorId) -> bool {
        if self.leader() == Some(id) {
            return true;
        }
        let mut next = self.upstream();
        while let Some(cell) = next {
            if cell.leader() == Some(id) {
                return true;
            }
            next = cell.upstream();
        }
        false
    }

    #[inline]
    pub fn is_following(&self) -> bool {
        self.leader.load(Ordering::Acquire) != NO_LEADER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_exact_bits() {
        let c = OutputCell::new();
        assert_eq!(c.load(), 0.0);
        c.store(-3.25);
        assert_eq!(c.load(), -3.25);
    }

    #[test]
    fn leader_round_trips_including_zero_id() {
        let c = OutputCell::new();
        assert!(!c.is_following());
        c.set_leader(Some(ActuatorId(0)));
        assert_eq!(c.leader(), Some(ActuatorId(0)));
        c.set_leader(None);
        assert_eq!(c.leader(), None);
    }

    #[test]
    fn led_by_walks_the_whole_chain() {
        let root = Arc::new(OutputCell::new());
        let mid = Arc::new(OutputCell::new());
        let leaf = OutputCell::new();
        mid.set_leader(Some(ActuatorId(1)));
        mid.set_upstream(&root);
        leaf.set_leader(Some(ActuatorId(2)));
        leaf.set_upstream(&mid);

        assert!(leaf.led_by(ActuatorId(2)));
        assert!(leaf.led_by(ActuatorId(1)));
        assert!(!leaf.led_by(ActuatorId(3)));

        mid.set_leader(None);
        assert!(!leaf.led_by(ActuatorId(1)));
    }
}
