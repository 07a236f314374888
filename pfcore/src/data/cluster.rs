use std::fmt;
use std::fmt::{Display, Formatter};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Calorimeter subsystem a cluster was reconstructed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaloSystem {
    Ecal,
    Hcal,
}

impl Display for CaloSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CaloSystem::Ecal => write!(f, "ECal"),
            CaloSystem::Hcal => write!(f, "HCal"),
        }
    }
}

/// An aggregated calorimeter energy deposit.
///
/// The cluster's identity within an event is its index in the collection it was read from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaloCluster {
    /// Deposited (uncorrected) energy in MeV.
    pub energy: f64,
    /// Energy-weighted centroid (x, y, z) in mm.
    pub centroid: Vector3<f64>,
}

impl CaloCluster {
    pub fn new(energy: f64, centroid: [f64; 3]) -> Self {
        CaloCluster {
            energy,
            centroid: Vector3::from(centroid),
        }
    }
}

/// Returns the index of the most energetic cluster, first one on ties.
pub fn leading_cluster(clusters: &[CaloCluster]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, c) in clusters.iter().enumerate() {
        match best {
            Some(b) if clusters[b].energy >= c.energy => {}
            _ => best = Some(i),
        }
    }
    best
}
