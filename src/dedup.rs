use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;

pub const DEFAULT_MAX_TRACKED_TAGS: usize = 10_000;

/// Sliding-window suppression of repeated tag sightings.
///
/// A tag passes when nothing was let through for it during the last
/// `window`. Passing records the time, whether or not the send that follows
/// succeeds.
#[derive(Debug)]
pub struct DedupGate {
    window: Duration,
    max_tracked: usize,
    last_sent: HashMap<String, Instant>,
}

impl DedupGate {
    #[cfg(test)]
    pub fn new(window: Duration) -> Self {
        Self::with_capacity(window, DEFAULT_MAX_TRACKED_TAGS)
    }

    pub fn with_capacity(window: Duration, max_tracked: usize) -> Self {
        DedupGate {
            window,
            max_tracked: max_tracked.max(1),
            last_sent: HashMap::new(),
        }
    }

    pub fn should_send(&mut self, epc: &str, now: Instant) -> bool {
        if let Some(last) = self.last_sent.get(epc) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        } else if self.last_sent.len() >= self.max_tracked {
            self.make_room(now);
        }

        self.last_sent.insert(epc.to_string(), now);
        true
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.last_sent.len()
    }

    fn make_room(&mut self, now: Instant) {
        // An expired entry behaves exactly like an unseen tag.
        let window = self.window;
        self.last_sent
            .retain(|_, last| now.saturating_duration_since(*last) < window);

        if self.last_sent.len() >= self.max_tracked {
            let oldest = self
                .last_sent
                .iter()
                .min_by_key(|(_, last)| **last)
                .map(|(epc, _)| epc.clone());
            if let Some(epc) = oldest {
                debug!("Dedup map full, evicting {}", epc);
                self.last_sent.remove(&epc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_first_sighting_passes() {
        let mut gate = DedupGate::new(secs(60));
        assert!(gate.should_send("A", Instant::now()));
    }

    #[test]
    fn test_window() {
        let t0 = Instant::now();
        let mut gate = DedupGate::new(secs(5));

        assert!(gate.should_send("X", t0));
        assert!(!gate.should_send("X", t0 + secs(3)));
        assert!(gate.should_send("X", t0 + secs(6)));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let t0 = Instant::now();
        let mut gate = DedupGate::new(secs(5));

        assert!(gate.should_send("X", t0));
        assert!(!gate.should_send("X", t0 + Duration::from_millis(4999)));
        assert!(gate.should_send("X", t0 + secs(5)));
    }

    #[test]
    fn test_window_slides_only_on_pass() {
        let t0 = Instant::now();
        let mut gate = DedupGate::new(secs(5));

        assert!(gate.should_send("X", t0));
        assert!(!gate.should_send("X", t0 + secs(4)));
        // Suppressed sightings do not push the window forward.
        assert!(gate.should_send("X", t0 + secs(5)));
    }

    #[test]
    fn test_zero_window_disables_suppression() {
        let t0 = Instant::now();
        let mut gate = DedupGate::new(Duration::ZERO);

        assert!(gate.should_send("X", t0));
        assert!(gate.should_send("X", t0));
    }

    #[test]
    fn test_tags_are_independent() {
        let t0 = Instant::now();
        let mut gate = DedupGate::new(secs(5));

        assert!(gate.should_send("X", t0));
        assert!(gate.should_send("Y", t0 + secs(1)));
        assert!(!gate.should_send("X", t0 + secs(1)));
    }

    #[test]
    fn test_expired_entries_are_swept() {
        let t0 = Instant::now();
        let mut gate = DedupGate::with_capacity(secs(5), 3);

        assert!(gate.should_send("A", t0));
        assert!(gate.should_send("B", t0));
        assert!(gate.should_send("C", t0 + secs(4)));
        assert!(gate.should_send("D", t0 + secs(6)));

        assert_eq!(gate.tracked(), 2);
        assert!(!gate.should_send("C", t0 + secs(7)));
    }

    #[test]
    fn test_oldest_evicted_when_full() {
        let t0 = Instant::now();
        let mut gate = DedupGate::with_capacity(secs(60), 2);

        assert!(gate.should_send("A", t0));
        assert!(gate.should_send("B", t0 + secs(1)));
        assert!(gate.should_send("C", t0 + secs(2)));

        assert_eq!(gate.tracked(), 2);
        assert!(!gate.should_send("B", t0 + secs(3)));
        assert!(!gate.should_send("C", t0 + secs(3)));
        assert!(gate.should_send("A", t0 + secs(3)));
    }
}
