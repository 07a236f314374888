//! Job configuration.
//!
//! Every section has defaults matching the standard detector setup, so a configuration
//! file only needs to name what it changes.

use std::path::Path;
use std::sync::Arc;

use pfcore::algorithm::correction::EnergyCorrectionCurve;
use serde::{Deserialize, Serialize};

use crate::error::{RecoError, RecoResult};

/// What to do when an optional input collection is absent from an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCollectionPolicy {
    /// Abort the event.
    #[default]
    Fatal,
    /// Treat the collection as empty.
    Skip,
}

/// How the track to hadronic-cluster distance is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDistance {
    /// Transverse distance at the cluster depth after straight-line extrapolation of the track.
    #[default]
    Projected,
    /// Plain 3D distance between the scoring-plane position and the cluster centroid.
    Euclidean,
}

/// A scoring-plane region: where its hits are stored and where its plane sits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub collection: String,
    /// Nominal depth of the scoring plane (mm).
    #[serde(default = "default_plane_z")]
    pub plane_z: f64,
    /// Accepted |z - plane_z| (mm), inclusive.
    #[serde(default = "default_plane_tolerance")]
    pub plane_tolerance: f64,
}

fn default_plane_z() -> f64 {
    240.0
}

fn default_plane_tolerance() -> f64 {
    0.1
}

impl RegionConfig {
    pub fn new(collection: &str) -> Self {
        RegionConfig {
            collection: collection.to_string(),
            plane_z: default_plane_z(),
            plane_tolerance: default_plane_tolerance(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSelectorConfig {
    pub truth_tracking: bool,
    pub input_pass: String,
    pub output_collection: String,
    pub ecal_region: RegionConfig,
    pub hcal_region: RegionConfig,
    pub hcal_region_policy: MissingCollectionPolicy,
    pub primary_track_id: i32,
    pub excluded_pdg_ids: Vec<i32>,
}

impl Default for TrackSelectorConfig {
    fn default() -> Self {
        Self {
            truth_tracking: true,
            input_pass: String::new(),
            output_collection: "PFTracks".to_string(),
            ecal_region: RegionConfig::new("EcalScoringPlaneHits"),
            hcal_region: RegionConfig::new("HcalScoringPlaneHits"),
            // a missing collection aborts the event, as the collection accessor does
            hcal_region_policy: MissingCollectionPolicy::Fatal,
            primary_track_id: 1,
            excluded_pdg_ids: vec![22, 2112],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFlowConfig {
    pub input_track_collection: String,
    pub input_ecal_collection: String,
    pub input_hcal_collection: String,
    /// Pass of the cluster collections; empty matches any pass.
    pub input_pass: String,
    /// Pass of the track collection; the job's own pass when unset.
    pub input_track_pass: Option<String>,
    pub output_collection: String,

    /// Fuse everything in the event into one candidate.
    pub single_particle: bool,

    // track + hadronic cluster matching
    pub tk_had_calo_match_dist: f64,
    pub tk_had_calo_min_energy_ratio: f64,
    pub tk_had_calo_max_energy_ratio: f64,
    pub match_distance: MatchDistance,

    /// Origin used to give calorimeter-only candidates a direction.
    pub vertex: [f64; 3],
}

impl Default for ParticleFlowConfig {
    fn default() -> Self {
        Self {
            input_track_collection: "PFTracks".to_string(),
            input_ecal_collection: "PFEcalClusters".to_string(),
            input_hcal_collection: "PFHcalClusters".to_string(),
            input_pass: String::new(),
            input_track_pass: None,
            output_collection: "PFCandidates".to_string(),
            single_particle: false,
            tk_had_calo_match_dist: 100.0,
            tk_had_calo_min_energy_ratio: 0.5,
            tk_had_calo_max_energy_ratio: 2.0,
            match_distance: MatchDistance::Projected,
            vertex: [0.0, 0.0, 0.0],
        }
    }
}

/// Correction curves for both calorimeters; no knots means no correction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub ecal: EnergyCorrectionCurve,
    pub hcal: EnergyCorrectionCurve,
}

/// Read-only calibration shared by every event worker for the lifetime of a job.
#[derive(Clone, Debug)]
pub struct Calibration {
    pub ecal: Arc<EnergyCorrectionCurve>,
    pub hcal: Arc<EnergyCorrectionCurve>,
}

impl Calibration {
    pub fn identity() -> Self {
        Calibration {
            ecal: Arc::new(EnergyCorrectionCurve::identity()),
            hcal: Arc::new(EnergyCorrectionCurve::identity()),
        }
    }
}

impl From<&CalibrationConfig> for Calibration {
    fn from(config: &CalibrationConfig) -> Self {
        Calibration {
            ecal: Arc::new(config.ecal.clone()),
            hcal: Arc::new(config.hcal.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub pass_name: String,
    /// Worker threads for event dispatch, 0 lets rayon decide.
    pub num_threads: usize,
    pub track_selector: TrackSelectorConfig,
    pub particle_flow: ParticleFlowConfig,
    pub calibration: CalibrationConfig,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            pass_name: "reco".to_string(),
            num_threads: 0,
            track_selector: TrackSelectorConfig::default(),
            particle_flow: ParticleFlowConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

fn require_name(field: &str, value: &str) -> RecoResult<()> {
    if value.trim().is_empty() {
        return Err(RecoError::InvalidConfig(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> RecoResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(RecoError::InvalidConfig(format!(
            "{} must be finite and non-negative, got {}",
            field, value
        )));
    }
    Ok(())
}

impl RegionConfig {
    fn validate(&self, region: &str) -> RecoResult<()> {
        require_name(&format!("{}.collection", region), &self.collection)?;
        if !self.plane_z.is_finite() {
            return Err(RecoError::InvalidConfig(format!("{}.plane_z must be finite", region)));
        }
        require_non_negative(&format!("{}.plane_tolerance", region), self.plane_tolerance)
    }
}

impl TrackSelectorConfig {
    pub fn validate(&self) -> RecoResult<()> {
        require_name("track_selector.output_collection", &self.output_collection)?;
        self.ecal_region.validate("track_selector.ecal_region")?;
        self.hcal_region.validate("track_selector.hcal_region")?;
        if self.output_collection == self.ecal_region.collection
            || self.output_collection == self.hcal_region.collection
        {
            return Err(RecoError::InvalidConfig(format!(
                "track output collection '{}' collides with an input collection",
                self.output_collection
            )));
        }
        Ok(())
    }
}

impl ParticleFlowConfig {
    pub fn validate(&self) -> RecoResult<()> {
        require_name("particle_flow.input_track_collection", &self.input_track_collection)?;
        require_name("particle_flow.input_ecal_collection", &self.input_ecal_collection)?;
        require_name("particle_flow.input_hcal_collection", &self.input_hcal_collection)?;
        require_name("particle_flow.output_collection", &self.output_collection)?;
        require_non_negative("particle_flow.tk_had_calo_match_dist", self.tk_had_calo_match_dist)?;
        require_non_negative("particle_flow.tk_had_calo_min_energy_ratio", self.tk_had_calo_min_energy_ratio)?;
        require_non_negative("particle_flow.tk_had_calo_max_energy_ratio", self.tk_had_calo_max_energy_ratio)?;
        if self.tk_had_calo_min_energy_ratio > self.tk_had_calo_max_energy_ratio {
            return Err(RecoError::InvalidConfig(format!(
                "energy ratio band is empty: min {} > max {}",
                self.tk_had_calo_min_energy_ratio, self.tk_had_calo_max_energy_ratio
            )));
        }
        if self.vertex.iter().any(|v| !v.is_finite()) {
            return Err(RecoError::InvalidConfig("particle_flow.vertex must be finite".to_string()));
        }
        let inputs = [
            &self.input_track_collection,
            &self.input_ecal_collection,
            &self.input_hcal_collection,
        ];
        if inputs.iter().any(|name| **name == self.output_collection) {
            return Err(RecoError::InvalidConfig(format!(
                "candidate output collection '{}' collides with an input collection",
                self.output_collection
            )));
        }
        Ok(())
    }
}

impl ProcessConfig {
    pub fn from_json_str(json: &str) -> RecoResult<Self> {
        let config: ProcessConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> RecoResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> RecoResult<()> {
        require_name("pass_name", &self.pass_name)?;
        self.track_selector.validate()?;
        self.particle_flow.validate()
    }

    pub fn to_json_pretty(&self) -> RecoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.track_selector.truth_tracking);
        assert_eq!(config.track_selector.ecal_region.plane_z, 240.0);
        assert_eq!(config.track_selector.hcal_region.plane_tolerance, 0.1);
        assert_eq!(config.track_selector.excluded_pdg_ids, vec![22, 2112]);
        assert_eq!(config.track_selector.hcal_region_policy, MissingCollectionPolicy::Fatal);
        assert_eq!(config.particle_flow.output_collection, "PFCandidates");
        assert_eq!(config.particle_flow.input_track_pass, None);
        assert_eq!(MatchDistance::default(), MatchDistance::Projected);
        assert_eq!(MissingCollectionPolicy::default(), MissingCollectionPolicy::Fatal);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "pass_name": "pf",
            "track_selector": { "hcal_region_policy": "skip", "hcal_region": { "collection": "HcalSP", "plane_z": 250.0 } },
            "particle_flow": { "tk_had_calo_match_dist": 50.0, "match_distance": "euclidean", "input_track_pass": "sim" },
            "calibration": { "hcal": { "energies": [1.0, 2.0], "factors": [1.2, 1.1] } }
        }"#;
        let config = ProcessConfig::from_json_str(json).unwrap();
        assert_eq!(config.pass_name, "pf");
        assert_eq!(config.track_selector.hcal_region_policy, MissingCollectionPolicy::Skip);
        assert_eq!(config.track_selector.hcal_region.collection, "HcalSP");
        assert_eq!(config.track_selector.hcal_region.plane_z, 250.0);
        assert_eq!(config.track_selector.ecal_region.collection, "EcalScoringPlaneHits");
        assert_eq!(config.track_selector.hcal_region.plane_tolerance, 0.1);
        assert_eq!(config.particle_flow.tk_had_calo_match_dist, 50.0);
        assert_eq!(config.particle_flow.match_distance, MatchDistance::Euclidean);
        assert_eq!(config.particle_flow.input_track_pass.as_deref(), Some("sim"));
        assert_eq!(config.particle_flow.tk_had_calo_max_energy_ratio, 2.0);
        assert!(config.calibration.ecal.is_identity());
        assert_eq!(config.calibration.hcal.len(), 2);
    }

    #[test]
    fn test_invalid_ratio_band() {
        let mut config = ProcessConfig::default();
        config.particle_flow.tk_had_calo_min_energy_ratio = 3.0;
        assert!(matches!(config.validate(), Err(RecoError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_curve_rejected_on_load() {
        let json = r#"{ "calibration": { "ecal": { "energies": [2.0, 1.0], "factors": [1.0, 1.0] } } }"#;
        assert!(matches!(ProcessConfig::from_json_str(json), Err(RecoError::Json(_))));
    }

    #[test]
    fn test_output_collision() {
        let mut config = ProcessConfig::default();
        config.particle_flow.output_collection = "PFTracks".to_string();
        assert!(config.validate().is_err());

        let mut config = ProcessConfig::default();
        config.track_selector.output_collection = "EcalScoringPlaneHits".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trip_default() {
        let config = ProcessConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(ProcessConfig::from_json_str(&json).unwrap(), config);
    }
}
