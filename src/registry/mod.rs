//! Target registry: the shared set of pending refresh targets
//!
//! Every operation takes one exclusive lock over the whole map. Cardinality is
//! small (tens of targets) and never handing the same target to two workers
//! matters more than claim throughput.
//!
//! Claim order is arbitrary. Callers must not rely on FIFO or any priority.

mod target;

pub use target::{DEFAULT_SLOT, MetadataKind, Target, target_name};

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: Mutex<HashMap<String, Target>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections never leave the map half-written, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Target>> {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the target keyed by `name`
    ///
    /// Any existing claim state for that name is discarded.
    pub fn add(&self, name: impl Into<String>, connection_id: impl Into<String>, kind: MetadataKind) {
        let name = name.into();
        let target = Target::new(name.clone(), connection_id.into(), kind);

        let replaced = self.lock().insert(name.clone(), target);
        debug!(target_name = %name, replaced = replaced.is_some(), "Target added");
    }

    /// Claim any unoccupied target, marking it occupied
    ///
    /// Returns an owned snapshot of the claimed entry, or `None` when the
    /// registry is empty or every entry is already held by a worker.
    pub fn claim_next(&self) -> Option<Target> {
        let mut targets = self.lock();
        let target = targets.values_mut().find(|t| !t.occupied)?;
        target.occupy();

        debug!(
            target_name = %target.name,
            occupied_count = target.occupied_count,
            "Target claimed"
        );

        Some(target.clone())
    }

    /// Remove the target unconditionally
    pub fn retire(&self, name: &str) {
        if self.lock().remove(name).is_none() {
            debug!(target_name = %name, "Retire of unknown target ignored");
        }
    }

    /// Number of entries present, claimed or not
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Copy of every entry, for diagnostics
    pub fn snapshot(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.lock().values().cloned().collect();
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_concurrent_claims_never_overlap() {
        const TARGETS: usize = 64;
        const CLAIMERS: usize = 16;

        let registry = Arc::new(TargetRegistry::new());
        for i in 0..TARGETS {
            registry.add(format!("t{}", i), format!("conn-{}", i), MetadataKind::Image);
        }

        let barrier = Arc::new(Barrier::new(CLAIMERS));
        let handles: Vec<_> = (0..CLAIMERS)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut claimed = Vec::new();
                    while let Some(target) = registry.claim_next() {
                        claimed.push(target.name);
                    }
                    claimed
                })
            })
            .collect();

        let all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<&String> = all.iter().collect();

        assert_eq!(all.len(), TARGETS);
        assert_eq!(unique.len(), TARGETS);
    }

    #[test]
    fn test_add_resets_claimed_entry() {
        let registry = TargetRegistry::new();
        registry.add("t1", "conn-1", MetadataKind::Image);

        let claimed = registry.claim_next().unwrap();
        assert_eq!(claimed.name, "t1");
        assert!(claimed.occupied);
        assert!(registry.claim_next().is_none());

        registry.add("t1", "conn-1", MetadataKind::Image);
        assert_eq!(registry.count(), 1);

        let reclaimed = registry.claim_next().unwrap();
        assert_eq!(reclaimed.name, "t1");
        assert_eq!(reclaimed.occupied_count, 1);
    }

    #[test]
    fn test_count_tracks_add_and_retire() {
        let registry = TargetRegistry::new();
        for i in 0..5 {
            registry.add(format!("t{}", i), format!("conn-{}", i), MetadataKind::Spec);
        }
        assert_eq!(registry.count(), 5);

        while let Some(target) = registry.claim_next() {
            registry.retire(&target.name);
        }
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let registry = TargetRegistry::new();
        registry.add("a", "conn-a", MetadataKind::Image);
        registry.add("b", "conn-b", MetadataKind::Image);

        let first = registry.claim_next().unwrap();
        let second = registry.claim_next().unwrap();
        assert!(registry.claim_next().is_none());

        let mut names = vec![first.name, second.name];
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_retire_unknown_is_noop() {
        let registry = TargetRegistry::new();
        registry.add("a", "conn-a", MetadataKind::Image);

        registry.retire("missing");
        assert_eq!(registry.count(), 1);

        registry.retire("a");
        registry.retire("a");
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_empty_registry_claims_nothing() {
        let registry = TargetRegistry::new();
        assert!(registry.claim_next().is_none());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_snapshot_reflects_claims() {
        let registry = TargetRegistry::new();
        registry.add("b", "conn-b", MetadataKind::Image);
        registry.add("a", "conn-a", MetadataKind::Spec);

        let claimed = registry.claim_next().unwrap();
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].name, "a");
        assert_eq!(snapshot[1].name, "b");
        let held = snapshot.iter().find(|t| t.name == claimed.name).unwrap();
        assert!(held.occupied);
        assert!(held.first_occupied_time.is_some());
    }
}
