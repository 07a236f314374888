//! Particle-flow candidate building.
//!
//! Tracks are matched to hadronic clusters by proximity and energy/momentum
//! plausibility, cluster energies are corrected with the job's calibration curves,
//! and every input track or cluster ends up in exactly one candidate.

use nalgebra::Vector3;
use pfcore::algorithm::kinematics::{calo_momentum, energy_momentum_ratio, euclidean_distance, projected_distance};
use pfcore::data::candidate::ParticleCandidate;
use pfcore::data::cluster::{leading_cluster, CaloCluster};
use pfcore::data::hit::ScoringPlaneHit;
use tracing::{debug, error};

use crate::config::{Calibration, MatchDistance, ParticleFlowConfig};
use crate::error::{RecoError, RecoResult};
use crate::event::store::CollectionStore;

/// An accepted track to hadronic-cluster association.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackClusterMatch {
    pub track: usize,
    pub cluster: usize,
    pub distance: f64,
    pub energy_ratio: f64,
}

#[derive(Clone, Debug)]
pub struct ParticleFlowBuilder {
    config: ParticleFlowConfig,
    calibration: Calibration,
    vertex: Vector3<f64>,
}

impl ParticleFlowBuilder {
    pub const NAME: &'static str = "ParticleFlowBuilder";

    pub fn new(config: ParticleFlowConfig, calibration: Calibration) -> Self {
        let vertex = Vector3::from(config.vertex);
        ParticleFlowBuilder { config, calibration, vertex }
    }

    pub fn config(&self) -> &ParticleFlowConfig {
        &self.config
    }

    pub fn fill_track(&self, cand: &mut ParticleCandidate, index: usize, tk: &ScoringPlaneHit) {
        cand.kind.track = true;
        cand.track_index = Some(index);
        cand.track_energy = tk.track_energy();
        cand.momentum = tk.momentum;
        cand.track_position = Some(tk.position);
        cand.truth_pdg_id = Some(tk.pdg_id);
    }

    pub fn fill_ecal(&self, cand: &mut ParticleCandidate, index: usize, em: &CaloCluster) {
        cand.kind.ecal = true;
        cand.ecal_cluster = Some(index);
        cand.ecal_raw_energy = em.energy;
        cand.ecal_energy = self.calibration.ecal.correct(em.energy);
        cand.ecal_position = Some(em.centroid);
    }

    pub fn fill_hcal(&self, cand: &mut ParticleCandidate, index: usize, had: &CaloCluster) {
        cand.kind.hcal = true;
        cand.hcal_cluster = Some(index);
        cand.hcal_raw_energy = had.energy;
        cand.hcal_energy = self.calibration.hcal.correct(had.energy);
        cand.hcal_position = Some(had.centroid);
    }

    fn distance(&self, tk: &ScoringPlaneHit, cluster: &CaloCluster) -> f64 {
        match self.config.match_distance {
            MatchDistance::Projected => projected_distance(tk, &cluster.centroid),
            MatchDistance::Euclidean => euclidean_distance(&tk.position, &cluster.centroid),
        }
    }

    /// Greedy track to hadronic-cluster matching in track order.
    ///
    /// Each track looks at the nearest still-unmatched cluster within the distance threshold
    /// (lower index on ties) and keeps it only if the corrected cluster energy over the track
    /// momentum lies inside the configured ratio band. Returns one entry per track.
    pub fn match_tracks(&self, tracks: &[ScoringPlaneHit], hcal: &[CaloCluster]) -> Vec<Option<TrackClusterMatch>> {
        let mut used = vec![false; hcal.len()];
        let mut matches = Vec::with_capacity(tracks.len());

        for (i, tk) in tracks.iter().enumerate() {
            let mut nearest: Option<(usize, f64)> = None;
            for (j, cluster) in hcal.iter().enumerate() {
                if used[j] {
                    continue;
                }
                let d = self.distance(tk, cluster);
                if !(d <= self.config.tk_had_calo_match_dist) {
                    continue;
                }
                match nearest {
                    Some((_, best)) if best <= d => {}
                    _ => nearest = Some((j, d)),
                }
            }

            let accepted = nearest.and_then(|(j, distance)| {
                let energy_ratio = energy_momentum_ratio(self.calibration.hcal.correct(hcal[j].energy), tk.p());
                if energy_ratio >= self.config.tk_had_calo_min_energy_ratio
                    && energy_ratio <= self.config.tk_had_calo_max_energy_ratio
                {
                    Some(TrackClusterMatch { track: i, cluster: j, distance, energy_ratio })
                } else {
                    debug!(track = i, cluster = j, energy_ratio, "nearest hadronic cluster outside energy ratio band");
                    None
                }
            });

            match &accepted {
                Some(m) => {
                    used[m.cluster] = true;
                    debug!(track = i, cluster = m.cluster, distance = m.distance, "track matched to hadronic cluster");
                }
                None => debug!(track = i, "no hadronic cluster match"),
            }
            matches.push(accepted);
        }
        matches
    }

    /// Build the candidate collection for one event.
    ///
    /// Order: track-seeded candidates in track order, then unmatched hadronic clusters,
    /// then EM clusters, each in collection order.
    pub fn build(&self, tracks: &[ScoringPlaneHit], ecal: &[CaloCluster], hcal: &[CaloCluster]) -> Vec<ParticleCandidate> {
        if self.config.single_particle {
            return self.build_single_particle(tracks, ecal, hcal).into_iter().collect();
        }

        let mut candidates = Vec::with_capacity(tracks.len() + ecal.len() + hcal.len());
        let mut hcal_used = vec![false; hcal.len()];

        for (i, (tk, matched)) in tracks.iter().zip(self.match_tracks(tracks, hcal)).enumerate() {
            let mut cand = ParticleCandidate::default();
            self.fill_track(&mut cand, i, tk);
            match matched {
                Some(m) => {
                    self.fill_hcal(&mut cand, m.cluster, &hcal[m.cluster]);
                    hcal_used[m.cluster] = true;
                    cand.energy = cand.hcal_energy;
                }
                None => cand.energy = cand.track_energy,
            }
            candidates.push(cand);
        }

        for (j, had) in hcal.iter().enumerate().filter(|(j, _)| !hcal_used[*j]) {
            let mut cand = ParticleCandidate::default();
            self.fill_hcal(&mut cand, j, had);
            cand.energy = cand.hcal_energy;
            cand.momentum = calo_momentum(cand.energy, &self.vertex, &had.centroid);
            candidates.push(cand);
        }

        for (k, em) in ecal.iter().enumerate() {
            let mut cand = ParticleCandidate::default();
            self.fill_ecal(&mut cand, k, em);
            cand.energy = cand.ecal_energy;
            cand.momentum = calo_momentum(cand.energy, &self.vertex, &em.centroid);
            candidates.push(cand);
        }

        candidates
    }

    /// Merge the leading track, EM cluster and hadronic cluster into a single candidate.
    pub fn build_single_particle(&self, tracks: &[ScoringPlaneHit], ecal: &[CaloCluster], hcal: &[CaloCluster]) -> Option<ParticleCandidate> {
        let mut cand = ParticleCandidate::default();
        if let Some(tk) = tracks.first() {
            self.fill_track(&mut cand, 0, tk);
        }
        if let Some(k) = leading_cluster(ecal) {
            self.fill_ecal(&mut cand, k, &ecal[k]);
        }
        if let Some(j) = leading_cluster(hcal) {
            self.fill_hcal(&mut cand, j, &hcal[j]);
        }
        if cand.kind.is_empty() {
            return None;
        }

        cand.energy = if cand.kind.ecal || cand.kind.hcal {
            cand.ecal_energy + cand.hcal_energy
        } else {
            cand.track_energy
        };

        if !cand.kind.track {
            let position = match (cand.ecal_position, cand.hcal_position) {
                (Some(em), Some(had)) => {
                    if cand.hcal_energy > cand.ecal_energy { had } else { em }
                }
                (Some(em), None) => em,
                (None, Some(had)) => had,
                (None, None) => self.vertex,
            };
            cand.momentum = calo_momentum(cand.energy, &self.vertex, &position);
        }
        Some(cand)
    }

    /// Read tracks and clusters from the event and publish the candidate collection.
    ///
    /// Any failure aborts the event and is logged here; nothing is published on error.
    pub fn produce<S: CollectionStore>(&self, event: &mut S) -> RecoResult<usize> {
        self.try_produce(event).map_err(|e| {
            error!(producer = Self::NAME, error = %e, "Event aborted");
            e
        })
    }

    fn try_produce<S: CollectionStore>(&self, event: &mut S) -> RecoResult<usize> {
        let track_pass = self
            .config
            .input_track_pass
            .clone()
            .unwrap_or_else(|| event.pass_name().to_string());
        let pass = self.config.input_pass.as_str();
        let inputs = [
            (&self.config.input_track_collection, track_pass.as_str()),
            (&self.config.input_ecal_collection, pass),
            (&self.config.input_hcal_collection, pass),
        ];
        if let Some((name, pass)) = inputs.iter().find(|(name, pass)| !event.exists(name, pass)) {
            return Err(RecoError::missing(name, pass));
        }

        let candidates = {
            let tracks = event.get::<ScoringPlaneHit>(&self.config.input_track_collection, &track_pass)?;
            let ecal = event.get::<CaloCluster>(&self.config.input_ecal_collection, pass)?;
            let hcal = event.get::<CaloCluster>(&self.config.input_hcal_collection, pass)?;
            debug!(
                n_tracks = tracks.len(),
                n_ecal = ecal.len(),
                n_hcal = hcal.len(),
                "building particle-flow candidates"
            );
            self.build(tracks, ecal, hcal)
        };

        let n_candidates = candidates.len();
        event.put(&self.config.output_collection, candidates)?;
        Ok(n_candidates)
    }
}

/// Kinds of the candidates in a collection, counted by bitmask identifier.
pub fn count_by_pid(candidates: &[ParticleCandidate]) -> [usize; 8] {
    let mut counts = [0usize; 8];
    for cand in candidates {
        counts[(cand.pid() & 0x7) as usize] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use pfcore::algorithm::correction::EnergyCorrectionCurve;
    use pfcore::data::candidate::CandidateKind;
    use pfcore::data::cluster::CaloSystem;
    use pfcore::data::hit::PDG_ELECTRON;

    use crate::event::store::Event;

    fn track(p: [f64; 3], pos: [f64; 3]) -> ScoringPlaneHit {
        ScoringPlaneHit::new(p, pos, PDG_ELECTRON, 1)
    }

    fn calibration() -> Calibration {
        Calibration {
            ecal: Arc::new(EnergyCorrectionCurve::new(vec![1.0, 10.0], vec![1.1, 1.05]).unwrap()),
            hcal: Arc::new(EnergyCorrectionCurve::new(vec![1.0, 10.0], vec![1.2, 1.0]).unwrap()),
        }
    }

    fn builder() -> ParticleFlowBuilder {
        ParticleFlowBuilder::new(ParticleFlowConfig::default(), calibration())
    }

    fn assert_unique_inputs(candidates: &[ParticleCandidate]) {
        let mut clusters = HashSet::new();
        let mut tracks = HashSet::new();
        for cand in candidates {
            for r in cand.cluster_refs() {
                assert!(clusters.insert(r), "cluster {:?} used twice", r);
            }
            if let Some(t) = cand.track_index {
                assert!(tracks.insert(t), "track {} used twice", t);
            }
        }
    }

    #[test]
    fn test_track_matched_to_nearby_hadronic_cluster() {
        let b = builder();
        let tracks = vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])];
        let hcal = vec![CaloCluster::new(2.8, [10.0, 0.0, 900.0])];

        let candidates = b.build(&tracks, &[], &hcal);
        assert_eq!(candidates.len(), 1);

        let cand = &candidates[0];
        assert_eq!(cand.kind, CandidateKind::track_hcal());
        assert_eq!(cand.pid(), 5);
        assert!((cand.energy - b.calibration.hcal.correct(2.8)).abs() < 1e-12);
        assert_eq!(cand.hcal_raw_energy, 2.8);
        assert_eq!(cand.momentum, tracks[0].momentum);
        assert_eq!(cand.track_index, Some(0));
        assert_eq!(cand.hcal_cluster, Some(0));
    }

    #[test]
    fn test_cluster_too_far_gives_separate_candidates() {
        let b = builder();
        let tracks = vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])];
        let hcal = vec![CaloCluster::new(2.8, [500.0, 0.0, 900.0])];

        let candidates = b.build(&tracks, &[], &hcal);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].kind, CandidateKind::track_only());
        assert_eq!(candidates[0].energy, 3.0);
        assert_eq!(candidates[1].kind, CandidateKind::hcal_only());
        assert!((candidates[1].p() - candidates[1].energy).abs() < 1e-9);
    }

    #[test]
    fn test_implausible_energy_ratio_rejected() {
        let b = builder();
        let tracks = vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])];
        let small = vec![CaloCluster::new(0.5, [0.0, 0.0, 900.0])];
        let large = vec![CaloCluster::new(20.0, [0.0, 0.0, 900.0])];

        assert_eq!(b.match_tracks(&tracks, &small), vec![None]);
        assert_eq!(b.match_tracks(&tracks, &large), vec![None]);
        assert_eq!(b.build(&tracks, &[], &large).len(), 2);
    }

    #[test]
    fn test_no_fallback_after_ratio_rejection() {
        let b = builder();
        let tracks = vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])];
        // nearest fails the ratio band, the farther one alone would pass it
        let hcal = vec![
            CaloCluster::new(20.0, [0.0, 0.0, 900.0]),
            CaloCluster::new(2.8, [20.0, 0.0, 900.0]),
        ];
        assert!(b.match_tracks(&tracks, &hcal[1..])[0].is_some());
        assert_eq!(b.match_tracks(&tracks, &hcal), vec![None]);

        let candidates = b.build(&tracks, &[], &hcal);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].kind, CandidateKind::track_only());
        assert_eq!(candidates[0].energy, 3.0);
        assert_eq!(candidates[1].kind, CandidateKind::hcal_only());
        assert_eq!(candidates[1].hcal_cluster, Some(0));
        assert_eq!(candidates[2].kind, CandidateKind::hcal_only());
        assert_eq!(candidates[2].hcal_cluster, Some(1));
    }

    #[test]
    fn test_energy_ratio_band_is_inclusive() {
        let b = ParticleFlowBuilder::new(ParticleFlowConfig::default(), Calibration::identity());
        let tracks = vec![track([0.0, 0.0, 4.0], [0.0, 0.0, 240.0])];
        let ratio_of = |energy: f64| {
            b.match_tracks(&tracks, &[CaloCluster::new(energy, [0.0, 0.0, 900.0])])[0].map(|m| m.energy_ratio)
        };

        assert_eq!(ratio_of(2.0), Some(0.5));
        assert_eq!(ratio_of(8.0), Some(2.0));
        assert_eq!(ratio_of(1.99), None);
        assert_eq!(ratio_of(8.01), None);
    }

    #[test]
    fn test_distance_tie_goes_to_lower_index() {
        let b = builder();
        let tracks = vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])];
        let left = CaloCluster::new(2.8, [-10.0, 0.0, 900.0]);
        let right = CaloCluster::new(2.8, [10.0, 0.0, 900.0]);

        let m = b.match_tracks(&tracks, &[left.clone(), right.clone()])[0].unwrap();
        assert_eq!(m.cluster, 0);
        assert_eq!(m.distance, 10.0);
        assert_eq!(b.match_tracks(&tracks, &[right, left])[0].map(|m| m.cluster), Some(0));
    }

    #[test]
    fn test_nearest_cluster_wins_and_is_consumed_once() {
        let b = builder();
        let tracks = vec![
            track([0.0, 0.0, 5.0], [0.0, 0.0, 240.0]),
            track([0.0, 0.0, 4.0], [0.0, 0.0, 240.0]),
        ];
        let hcal = vec![
            CaloCluster::new(4.0, [30.0, 0.0, 900.0]),
            CaloCluster::new(4.5, [5.0, 0.0, 900.0]),
        ];

        let matches = b.match_tracks(&tracks, &hcal);
        assert_eq!(matches[0].map(|m| m.cluster), Some(1));
        assert_eq!(matches[1].map(|m| m.cluster), Some(0));

        let candidates = b.build(&tracks, &[], &hcal);
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.kind == CandidateKind::track_hcal()));
        assert_unique_inputs(&candidates);
    }

    #[test]
    fn test_projected_distance_follows_track_direction() {
        let b = builder();
        // track heading to x = 66 at z = 900
        let tracks = vec![track([0.3, 0.0, 3.0], [0.0, 0.0, 240.0])];
        let hcal = vec![CaloCluster::new(2.8, [66.0, 0.0, 900.0])];
        assert!(b.match_tracks(&tracks, &hcal)[0].is_some());

        let config = ParticleFlowConfig {
            match_distance: MatchDistance::Euclidean,
            ..Default::default()
        };
        let euclid = ParticleFlowBuilder::new(config, calibration());
        assert!(euclid.match_tracks(&tracks, &hcal)[0].is_none());
    }

    #[test]
    fn test_em_clusters_emitted_with_correction() {
        let b = builder();
        let ecal = vec![
            CaloCluster::new(2.0, [0.0, 0.0, 300.0]),
            CaloCluster::new(5.0, [0.0, 10.0, 300.0]),
        ];
        let candidates = b.build(&[], &ecal, &[]);
        assert_eq!(candidates.len(), 2);
        for (cand, em) in candidates.iter().zip(ecal.iter()) {
            assert_eq!(cand.kind, CandidateKind::ecal_only());
            assert!((cand.energy - b.calibration.ecal.correct(em.energy)).abs() < 1e-12);
            assert!(cand.energy > em.energy);
        }
        assert_eq!(candidates[1].ecal_cluster, Some(1));
    }

    #[test]
    fn test_candidate_order() {
        let b = builder();
        let tracks = vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])];
        let ecal = vec![CaloCluster::new(1.0, [0.0, 0.0, 300.0])];
        let hcal = vec![
            CaloCluster::new(9.0, [400.0, 0.0, 900.0]),
            CaloCluster::new(2.8, [0.0, 0.0, 900.0]),
        ];
        let pids: Vec<u8> = b.build(&tracks, &ecal, &hcal).iter().map(|c| c.pid()).collect();
        assert_eq!(pids, vec![5, 4, 2]);
    }

    #[test]
    fn test_no_double_counting_many_inputs() {
        let b = builder();
        let tracks: Vec<_> = (0..4)
            .map(|i| track([0.0, 0.0, 2.0 + i as f64], [i as f64 * 3.0, 0.0, 240.0]))
            .collect();
        let hcal: Vec<_> = (0..6)
            .map(|j| CaloCluster::new(2.0 + j as f64 * 0.5, [j as f64 * 2.0, 1.0, 900.0]))
            .collect();
        let ecal: Vec<_> = (0..3).map(|k| CaloCluster::new(1.0, [0.0, k as f64, 300.0])).collect();

        let candidates = b.build(&tracks, &ecal, &hcal);
        assert_unique_inputs(&candidates);

        let n_hcal_refs = candidates
            .iter()
            .flat_map(|c| c.cluster_refs())
            .filter(|(system, _)| *system == CaloSystem::Hcal)
            .count();
        assert_eq!(n_hcal_refs, hcal.len());
        assert_eq!(candidates.iter().filter(|c| c.kind.track).count(), tracks.len());
        assert_eq!(candidates.iter().filter(|c| c.kind.ecal).count(), ecal.len());
    }

    #[test]
    fn test_build_is_idempotent() {
        let b = builder();
        let tracks = vec![
            track([0.0, 0.0, 5.0], [0.0, 0.0, 240.0]),
            track([0.0, 0.0, 2.0], [50.0, 0.0, 240.0]),
        ];
        let ecal = vec![CaloCluster::new(1.5, [0.0, 0.0, 300.0])];
        let hcal = vec![
            CaloCluster::new(4.0, [0.0, 0.0, 900.0]),
            CaloCluster::new(2.2, [52.0, 0.0, 900.0]),
        ];
        assert_eq!(b.build(&tracks, &ecal, &hcal), b.build(&tracks, &ecal, &hcal));
    }

    #[test]
    fn test_single_particle_mode() {
        let config = ParticleFlowConfig { single_particle: true, ..Default::default() };
        let b = ParticleFlowBuilder::new(config, calibration());
        let tracks = vec![track([0.0, 0.0, 4.0], [0.0, 0.0, 240.0])];
        let ecal = vec![
            CaloCluster::new(1.0, [0.0, 0.0, 300.0]),
            CaloCluster::new(3.0, [0.0, 0.0, 300.0]),
        ];
        let hcal = vec![CaloCluster::new(0.5, [0.0, 0.0, 900.0])];

        let candidates = b.build(&tracks, &ecal, &hcal);
        assert_eq!(candidates.len(), 1);
        let cand = &candidates[0];
        assert_eq!(cand.pid(), 7);
        assert_eq!(cand.ecal_cluster, Some(1));
        let expected = b.calibration.ecal.correct(3.0) + b.calibration.hcal.correct(0.5);
        assert!((cand.energy - expected).abs() < 1e-12);
        assert_eq!(cand.momentum, tracks[0].momentum);

        assert!(b.build(&[], &[], &[]).is_empty());

        let calo_only = b.build(&[], &[], &hcal);
        assert_eq!(calo_only[0].pid(), 4);
        assert!((calo_only[0].momentum.z - calo_only[0].energy).abs() < 1e-9);
    }

    #[test]
    fn test_produce_reads_and_publishes() {
        let b = builder();
        let mut event = Event::new(3, "reco");
        event.put("PFTracks", vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])]).unwrap();
        event.insert("PFEcalClusters", "sim", vec![CaloCluster::new(1.0, [0.0, 0.0, 300.0])]).unwrap();
        event.insert("PFHcalClusters", "sim", vec![CaloCluster::new(2.8, [0.0, 0.0, 900.0])]).unwrap();

        assert_eq!(b.produce(&mut event).unwrap(), 2);
        let candidates = event.get::<ParticleCandidate>("PFCandidates", "reco").unwrap();
        assert_eq!(count_by_pid(candidates)[5], 1);
        assert_eq!(count_by_pid(candidates)[2], 1);
    }

    #[test]
    fn test_produce_missing_input_is_fatal() {
        let b = builder();
        let mut event = Event::new(3, "reco");
        event.put("PFTracks", Vec::<ScoringPlaneHit>::new()).unwrap();
        event.insert("PFEcalClusters", "sim", Vec::<CaloCluster>::new()).unwrap();

        match b.produce(&mut event) {
            Err(RecoError::MissingInputCollection { name, .. }) => assert_eq!(name, "PFHcalClusters"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!event.exists("PFCandidates", ""));
    }

    fn event_with_clusters(tracks_pass: &str, tracks: Vec<ScoringPlaneHit>) -> Event {
        let mut event = Event::new(5, "reco");
        event.insert("PFTracks", tracks_pass, tracks).unwrap();
        event.insert("PFEcalClusters", "sim", Vec::<CaloCluster>::new()).unwrap();
        event.insert("PFHcalClusters", "sim", vec![CaloCluster::new(2.8, [0.0, 0.0, 900.0])]).unwrap();
        event
    }

    #[test]
    fn test_tracks_read_from_job_pass() {
        let b = builder();
        let mut event = event_with_clusters("sim", vec![track([0.0, 0.0, 50.0], [0.0, 0.0, 240.0])]);
        event.put("PFTracks", vec![track([0.0, 0.0, 3.0], [0.0, 0.0, 240.0])]).unwrap();

        assert_eq!(b.produce(&mut event).unwrap(), 1);
        let candidates = event.get::<ParticleCandidate>("PFCandidates", "reco").unwrap();
        assert_eq!(candidates[0].pid(), 5);
        assert_eq!(candidates[0].track_energy, 3.0);
    }

    #[test]
    fn test_explicit_track_pass() {
        let config = ParticleFlowConfig {
            input_track_pass: Some("sim".to_string()),
            ..Default::default()
        };
        let b = ParticleFlowBuilder::new(config, calibration());
        let mut event = event_with_clusters("sim", vec![track([0.0, 0.0, 50.0], [0.0, 0.0, 240.0])]);

        assert_eq!(b.produce(&mut event).unwrap(), 2);
        let candidates = event.get::<ParticleCandidate>("PFCandidates", "reco").unwrap();
        assert_eq!(candidates[0].kind, CandidateKind::track_only());
        assert_eq!(candidates[0].track_energy, 50.0);
        assert_eq!(candidates[1].kind, CandidateKind::hcal_only());
    }

    #[test]
    fn test_ambiguous_cluster_pass_aborts_event() {
        let b = builder();
        let mut event = event_with_clusters("reco", Vec::new());
        event.insert("PFHcalClusters", "overlay", Vec::<CaloCluster>::new()).unwrap();

        assert!(matches!(
            b.produce(&mut event),
            Err(RecoError::AmbiguousCollection { .. })
        ));
        assert!(!event.exists("PFCandidates", ""));
    }
}
