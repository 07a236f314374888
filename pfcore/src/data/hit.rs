use std::cmp::Reverse;

use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// PDG code of the photon.
pub const PDG_PHOTON: i32 = 22;
/// PDG code of the neutron.
pub const PDG_NEUTRON: i32 = 2112;
/// PDG code of the electron.
pub const PDG_ELECTRON: i32 = 11;

/// A single particle crossing of a scoring plane, as recorded by simulation.
///
/// # Description
///
/// Scoring-plane hits are read-only inputs. The detector region a hit belongs to
/// is given by the collection it is stored in, not by a field on the hit.
/// A selected hit is reused directly as the track record handed to particle flow.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringPlaneHit {
    /// Momentum (px, py, pz) in MeV.
    pub momentum: Vector3<f64>,
    /// Crossing position (x, y, z) in mm.
    pub position: Vector3<f64>,
    pub pdg_id: i32,
    /// Geant track identifier of the particle that produced the hit; 1 is the primary.
    pub track_id: i32,
    /// Total energy of the particle at the crossing, 0 if unknown.
    #[serde(default)]
    pub energy: f64,
}

impl ScoringPlaneHit {
    /// Constructs a new `ScoringPlaneHit`.
    ///
    /// # Arguments
    ///
    /// * `momentum` - momentum components (px, py, pz).
    /// * `position` - crossing position (x, y, z).
    /// * `pdg_id` - particle species.
    /// * `track_id` - originating track identifier.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use pfcore::data::hit::ScoringPlaneHit;
    /// let hit = ScoringPlaneHit::new([0.0, 0.0, 5.0], [0.0, 0.0, 240.05], 11, 1);
    /// assert_eq!(hit.p(), 5.0);
    /// ```
    pub fn new(momentum: [f64; 3], position: [f64; 3], pdg_id: i32, track_id: i32) -> Self {
        ScoringPlaneHit {
            momentum: Vector3::from(momentum),
            position: Vector3::from(position),
            pdg_id,
            track_id,
            energy: 0.0,
        }
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    /// Momentum magnitude sqrt(px² + py² + pz²).
    pub fn p(&self) -> f64 {
        self.momentum.norm()
    }

    pub fn pz(&self) -> f64 {
        self.momentum.z
    }

    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Energy attributed to the track: the recorded energy if known, the momentum magnitude otherwise.
    pub fn track_energy(&self) -> f64 {
        if self.energy > 0.0 {
            self.energy
        } else {
            self.p()
        }
    }

    pub fn is_primary(&self, primary_track_id: i32) -> bool {
        self.track_id == primary_track_id
    }
}

/// Stable sort by descending momentum magnitude; equal magnitudes keep their input order.
pub fn sort_by_momentum(hits: &mut [ScoringPlaneHit]) {
    hits.sort_by_key(|h| Reverse(OrderedFloat(h.p())));
}
