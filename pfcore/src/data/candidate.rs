use std::fmt;
use std::fmt::{Display, Formatter};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::data::cluster::CaloSystem;

/// Which detector signatures a particle-flow candidate was built from.
///
/// # Description
///
/// The numeric identifier follows the particle-flow convention of a bit per subsystem:
/// track = 1, EM calorimeter = 2, hadronic calorimeter = 4.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateKind {
    pub track: bool,
    pub ecal: bool,
    pub hcal: bool,
}

impl CandidateKind {
    pub const TRACK_BIT: u8 = 1;
    pub const ECAL_BIT: u8 = 2;
    pub const HCAL_BIT: u8 = 4;

    pub fn track_only() -> Self {
        CandidateKind { track: true, ecal: false, hcal: false }
    }

    pub fn ecal_only() -> Self {
        CandidateKind { track: false, ecal: true, hcal: false }
    }

    pub fn hcal_only() -> Self {
        CandidateKind { track: false, ecal: false, hcal: true }
    }

    pub fn track_hcal() -> Self {
        CandidateKind { track: true, ecal: false, hcal: true }
    }

    /// Returns the bitmask identifier of this kind.
    pub fn pid(&self) -> u8 {
        let mut pid = 0;
        if self.track {
            pid |= Self::TRACK_BIT;
        }
        if self.ecal {
            pid |= Self::ECAL_BIT;
        }
        if self.hcal {
            pid |= Self::HCAL_BIT;
        }
        pid
    }

    /// Returns the `CandidateKind` corresponding to the given bitmask. Unknown bits are ignored.
    pub fn from_pid(pid: u8) -> Self {
        CandidateKind {
            track: pid & Self::TRACK_BIT != 0,
            ecal: pid & Self::ECAL_BIT != 0,
            hcal: pid & Self::HCAL_BIT != 0,
        }
    }

    pub fn is_combined(&self) -> bool {
        [self.track, self.ecal, self.hcal].iter().filter(|&&b| b).count() > 1
    }

    pub fn is_empty(&self) -> bool {
        self.pid() == 0
    }
}

impl Display for CandidateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.track {
            parts.push("Track");
        }
        if self.ecal {
            parts.push("ECal");
        }
        if self.hcal {
            parts.push("HCal");
        }
        if parts.is_empty() {
            write!(f, "Empty")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// A reconstructed particle: the fused track and/or calorimeter signature of one particle.
///
/// Cluster references are indices into the event's EM and hadronic cluster collections,
/// the track reference an index into the track collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleCandidate {
    pub kind: CandidateKind,
    /// Final candidate energy in MeV.
    pub energy: f64,
    pub momentum: Vector3<f64>,

    pub track_energy: f64,
    pub ecal_energy: f64,
    pub ecal_raw_energy: f64,
    pub hcal_energy: f64,
    pub hcal_raw_energy: f64,

    pub track_index: Option<usize>,
    pub ecal_cluster: Option<usize>,
    pub hcal_cluster: Option<usize>,

    pub track_position: Option<Vector3<f64>>,
    pub ecal_position: Option<Vector3<f64>>,
    pub hcal_position: Option<Vector3<f64>>,

    pub truth_pdg_id: Option<i32>,
}

impl Default for ParticleCandidate {
    fn default() -> Self {
        ParticleCandidate {
            kind: CandidateKind::default(),
            energy: 0.0,
            momentum: Vector3::zeros(),
            track_energy: 0.0,
            ecal_energy: 0.0,
            ecal_raw_energy: 0.0,
            hcal_energy: 0.0,
            hcal_raw_energy: 0.0,
            track_index: None,
            ecal_cluster: None,
            hcal_cluster: None,
            track_position: None,
            ecal_position: None,
            hcal_position: None,
            truth_pdg_id: None,
        }
    }
}

impl ParticleCandidate {
    pub fn pid(&self) -> u8 {
        self.kind.pid()
    }

    pub fn p(&self) -> f64 {
        self.momentum.norm()
    }

    /// Cluster references held by this candidate, EM first.
    pub fn cluster_refs(&self) -> impl Iterator<Item = (CaloSystem, usize)> + '_ {
        self.ecal_cluster
            .map(|i| (CaloSystem::Ecal, i))
            .into_iter()
            .chain(self.hcal_cluster.map(|i| (CaloSystem::Hcal, i)))
    }
}
