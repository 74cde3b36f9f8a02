//! Physical constants, the particle attribute table, and birth-time sampling.
//!
//! Everything random about a particle is sampled here, exactly once, when
//! the particle is born. The sampled values are stored in the
//! [`HyperBit`](aura_types::HyperBit) so that the trajectory function never
//! needs a random source.

use aura_types::{ParticleKind, PhysicalProperties, QuantumState, Vec3};
use rand::Rng;

/// Planck constant (J s).
pub const PLANCK: f64 = 6.626_070_15e-34;

/// Speed of light in vacuum (m/s).
pub const LIGHT_SPEED: f64 = 299_792_458.0;

/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Newtonian gravitational constant (m^3 kg^-1 s^-2).
pub const G_CONSTANT: f64 = 6.674_30e-11;

/// Fine-structure constant.
pub const FINE_STRUCTURE: f64 = 1.0 / 137.035_999;

/// Schumann resonance (Hz), the base frequency for resonance metrics.
pub const SCHUMANN_RESONANCE: f64 = 7.83;

/// Default per-axis velocity magnitude bound.
pub const DEFAULT_VELOCITY_SPEED: f64 = 5.0;

/// Static attributes for a particle kind (Particle Data Group approximations).
pub const fn properties(kind: ParticleKind) -> PhysicalProperties {
    match kind {
        ParticleKind::Electron => PhysicalProperties {
            mass: 9.109_383_56e-31,
            charge: -1.602_176_63e-19,
            spin: 0.5,
        },
        ParticleKind::Proton => PhysicalProperties {
            mass: 1.672_621_9e-27,
            charge: 1.602_176_63e-19,
            spin: 0.5,
        },
        ParticleKind::Neutron => PhysicalProperties {
            mass: 1.674_927_471e-27,
            charge: 0.0,
            spin: 0.5,
        },
        ParticleKind::Photon => PhysicalProperties {
            mass: 0.0,
            charge: 0.0,
            spin: 1.0,
        },
        ParticleKind::Higgs => PhysicalProperties {
            mass: 2.2e-25,
            charge: 0.0,
            spin: 0.0,
        },
    }
}

/// A fresh, uncollapsed equal superposition.
pub fn new_quantum_state() -> QuantumState {
    let amplitude = 0.5_f64.sqrt();
    QuantumState {
        amplitude0: amplitude,
        amplitude1: amplitude,
        collapsed: false,
        observed_value: None,
    }
}

/// Sample a velocity vector with each axis uniform in `[-speed/2, speed/2)`.
pub fn sample_velocity(rng: &mut impl Rng, speed: f64) -> Vec3 {
    Vec3 {
        x: (rng.random::<f64>() - 0.5) * speed,
        y: (rng.random::<f64>() - 0.5) * speed,
        z: (rng.random::<f64>() - 0.5) * speed,
    }
}

/// Observe a quantum state, producing a collapsed copy.
///
/// The probability of outcome 1 is the average of `amplitude1^2` and
/// `bias` (clamped to `[0, 1]`). The resulting amplitudes are one-hot on
/// the observed outcome. An already-collapsed state is returned unchanged.
pub fn collapse_state(state: &QuantumState, bias: f64, rng: &mut impl Rng) -> QuantumState {
    if state.collapsed {
        return *state;
    }
    let probability1 = state.amplitude1 * state.amplitude1;
    let bias = if bias.is_finite() { bias.clamp(0.0, 1.0) } else { 0.5 };
    let adjusted = (probability1 + bias) / 2.0;
    observed_state(rng.random::<f64>() < adjusted)
}

/// The collapsed state for an observed outcome: `true` is `|1>`.
pub fn observed_state(one: bool) -> QuantumState {
    QuantumState {
        amplitude0: if one { 0.0 } else { 1.0 },
        amplitude1: if one { 1.0 } else { 0.0 },
        collapsed: true,
        observed_value: Some(u8::from(one)),
    }
}
