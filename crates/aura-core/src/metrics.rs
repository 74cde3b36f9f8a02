//! Derived scalar metrics: coherence, entropy, resonance.
//!
//! Metrics are recomputed exactly once per birth, never on tick. Every
//! input is clamped, so none of this can fail.

use aura_types::SystemMetrics;

use crate::physics::SCHUMANN_RESONANCE;

/// Multiplicative coherence decay applied on every birth.
pub const DEFAULT_COHERENCE_DECAY: f64 = 0.99;

/// Floor for the resonance metric (Hz).
pub const RESONANCE_FLOOR: f64 = 0.5;

/// Round to `places` decimal digits.
fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `-c * ln(c + eps)`, rounded to 4 places. Zero for an empty population.
pub fn entropy(population: usize, coherence: f64) -> f64 {
    if population == 0 {
        return 0.0;
    }
    let c = clamp_unit(coherence);
    round_to(-c * (c + f64::EPSILON).ln(), 4)
}

/// `max(0.5, 7.83 + (stability - entropy) * 10)`, rounded to 2 places.
pub fn resonance(stability: f64, entropy: f64) -> f64 {
    let raw = SCHUMANN_RESONANCE + (clamp_unit(stability) - entropy) * 10.0;
    round_to(raw.max(RESONANCE_FLOOR), 2)
}

/// Owner of the current [`SystemMetrics`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsDeriver {
    current: SystemMetrics,
    coherence_decay: f64,
}

impl MetricsDeriver {
    /// Start from an initial stability and coherence with no population.
    pub fn new(stability: f64, coherence: f64, dimension: u32, coherence_decay: f64) -> Self {
        let stability = clamp_unit(stability);
        let entropy = 0.0;
        Self {
            current: SystemMetrics {
                stability,
                entropy,
                coherence: clamp_unit(coherence),
                dimension,
                resonance: resonance(stability, entropy),
            },
            coherence_decay: clamp_unit(coherence_decay),
        }
    }

    /// Current metrics.
    pub const fn current(&self) -> SystemMetrics {
        self.current
    }

    /// Apply one birth. `population` is the count after the birth.
    pub fn on_birth(&mut self, population: usize) -> SystemMetrics {
        let coherence = round_to(self.current.coherence * self.coherence_decay, 3);
        let entropy = entropy(population, coherence);
        self.current.coherence = coherence;
        self.current.entropy = entropy;
        self.current.resonance = resonance(self.current.stability, entropy);
        self.current
    }

    /// Operator-set stability. Resonance follows; coherence does not.
    pub fn set_stability(&mut self, stability: f64) -> SystemMetrics {
        self.current.stability = clamp_unit(stability);
        self.current.resonance = resonance(self.current.stability, self.current.entropy);
        self.current
    }
}

impl Default for MetricsDeriver {
    fn default() -> Self {
        Self::new(0.99, 1.0, 11, DEFAULT_COHERENCE_DECAY)
    }
}
