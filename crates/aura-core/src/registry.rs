//! Append-only particle registry.
//!
//! Holds every known [`HyperBit`] in insertion order: hydrated history first
//! (sorted by birth timestamp), then session births in the order they
//! happened. Records are never removed or mutated. Quantum observations
//! made after birth live in a separate overlay keyed by id so the birth
//! record itself stays immutable.

use std::collections::HashMap;

use aura_types::{HyperBit, HyperBitId, QuantumState};
use chrono::{DateTime, Utc};

/// Ordered, append-only collection of birth records.
#[derive(Debug, Default, Clone)]
pub struct ParticleRegistry {
    records: Vec<HyperBit>,
    index: HashMap<HyperBitId, usize>,
    observations: HashMap<HyperBitId, QuantumState>,
    earliest: Option<DateTime<Utc>>,
}

impl ParticleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns `false` and leaves the registry unchanged
    /// when a record with the same id is already present.
    pub fn append(&mut self, bit: HyperBit) -> bool {
        if self.index.contains_key(&bit.id) {
            return false;
        }
        self.earliest = Some(
            self.earliest
                .map_or(bit.timestamp, |earliest| earliest.min(bit.timestamp)),
        );
        self.index.insert(bit.id, self.records.len());
        self.records.push(bit);
        true
    }

    /// Load persisted history. Records are sorted by birth timestamp before
    /// insertion; ids already present are skipped. Returns how many were added.
    pub fn hydrate(&mut self, mut bits: Vec<HyperBit>) -> usize {
        bits.sort_by_key(|b| b.timestamp);
        let mut added = 0_usize;
        for bit in bits {
            if self.append(bit) {
                added = added.saturating_add(1);
            }
        }
        added
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no particle has been born yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HyperBit> {
        self.records.iter()
    }

    /// Look up a record by id.
    pub fn get(&self, id: HyperBitId) -> Option<&HyperBit> {
        self.index.get(&id).and_then(|&i| self.records.get(i))
    }

    /// Whether a record with this id exists.
    pub fn contains(&self, id: HyperBitId) -> bool {
        self.index.contains_key(&id)
    }

    /// Earliest birth timestamp across all records.
    pub const fn earliest_birth(&self) -> Option<DateTime<Utc>> {
        self.earliest
    }

    /// The current quantum state of a particle: the observation if one was
    /// made, otherwise the state sampled at birth.
    pub fn quantum(&self, id: HyperBitId) -> Option<QuantumState> {
        self.observations
            .get(&id)
            .copied()
            .or_else(|| self.get(id).map(|b| b.quantum))
    }

    /// Whether the particle's state has been observed.
    pub fn is_collapsed(&self, id: HyperBitId) -> bool {
        self.quantum(id).is_some_and(|q| q.collapsed)
    }

    /// Record an observation for a known particle. Returns `false` for an
    /// unknown id. A later observation of the same particle is ignored.
    pub fn observe(&mut self, id: HyperBitId, state: QuantumState) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.observations.entry(id).or_insert(state);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aura_types::{ParticleKind, Vec3};
    use chrono::TimeDelta;

    use super::*;
    use crate::physics;

    fn base() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_716_700_000_000).unwrap()
    }

    fn bit_at(offset_ms: i64) -> HyperBit {
        HyperBit {
            id: HyperBitId::new(),
            kind: ParticleKind::Proton,
            physics: physics::properties(ParticleKind::Proton),
            quantum: physics::new_quantum_state(),
            position: Vec3::ZERO,
            velocity: Vec3::new(1.0, 1.0, 1.0),
            timestamp: base() + TimeDelta::milliseconds(offset_ms),
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let mut reg = ParticleRegistry::new();
        let a = bit_at(500);
        let b = bit_at(100);
        let c = bit_at(300);
        let ids = [a.id, b.id, c.id];
        reg.append(a);
        reg.append(b);
        reg.append(c);
        let seen: Vec<_> = reg.iter().map(|b| b.id).collect();
        assert_eq!(seen, ids);
        assert_eq!(reg.earliest_birth(), Some(base() + TimeDelta::milliseconds(100)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut reg = ParticleRegistry::new();
        let a = bit_at(0);
        assert!(reg.append(a.clone()));
        assert!(!reg.append(a));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn hydrate_sorts_by_birth_and_skips_known() {
        let mut reg = ParticleRegistry::new();
        let known = bit_at(50);
        reg.append(known.clone());

        let late = bit_at(900);
        let early = bit_at(10);
        let added = reg.hydrate(vec![late.clone(), known, early.clone()]);
        assert_eq!(added, 2);
        let order: Vec<_> = reg.iter().map(|b| b.id).collect();
        assert_eq!(order.get(1), Some(&early.id));
        assert_eq!(order.get(2), Some(&late.id));
        assert_eq!(reg.earliest_birth(), Some(early.timestamp));
    }

    #[test]
    fn observation_overlays_birth_state() {
        let mut reg = ParticleRegistry::new();
        let a = bit_at(0);
        let id = a.id;
        reg.append(a);
        assert!(!reg.is_collapsed(id));

        let observed = QuantumState {
            amplitude0: 0.0,
            amplitude1: 1.0,
            collapsed: true,
            observed_value: Some(1),
        };
        assert!(reg.observe(id, observed));
        assert!(reg.is_collapsed(id));
        assert_eq!(reg.quantum(id), Some(observed));
        // The birth record is untouched.
        assert!(!reg.get(id).unwrap().quantum.collapsed);
    }

    #[test]
    fn observing_unknown_particle_fails() {
        let mut reg = ParticleRegistry::new();
        assert!(!reg.observe(HyperBitId::new(), physics::new_quantum_state()));
        assert_eq!(reg.quantum(HyperBitId::new()), None);
    }
}
