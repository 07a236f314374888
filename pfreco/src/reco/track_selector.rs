//! Truth-level track selection.
//!
//! Picks the first scoring-plane hit of the primary particle in each detector region
//! and publishes the selected hits, ordered by descending momentum, as the track
//! collection consumed by particle flow.

use pfcore::data::hit::{sort_by_momentum, ScoringPlaneHit};
use tracing::{debug, error};

use crate::config::{MissingCollectionPolicy, RegionConfig, TrackSelectorConfig};
use crate::error::{RecoError, RecoResult};
use crate::event::store::CollectionStore;

/// Stateless hit predicate for one scoring-plane region.
#[derive(Clone, Debug, PartialEq)]
pub struct HitSelection {
    pub plane_z: f64,
    pub plane_tolerance: f64,
    pub primary_track_id: i32,
    pub excluded_pdg_ids: Vec<i32>,
}

impl HitSelection {
    pub fn new(region: &RegionConfig, config: &TrackSelectorConfig) -> Self {
        HitSelection {
            plane_z: region.plane_z,
            plane_tolerance: region.plane_tolerance,
            primary_track_id: config.primary_track_id,
            excluded_pdg_ids: config.excluded_pdg_ids.clone(),
        }
    }

    #[inline]
    pub fn is_primary(&self, hit: &ScoringPlaneHit) -> bool {
        hit.is_primary(self.primary_track_id)
    }

    /// Hit was recorded on this region's plane and not on a neighbouring surface.
    #[inline]
    pub fn on_plane(&self, hit: &ScoringPlaneHit) -> bool {
        (self.plane_z - hit.z()).abs() <= self.plane_tolerance
    }

    /// Forward-going flux only, no backscatter.
    #[inline]
    pub fn is_forward(&self, hit: &ScoringPlaneHit) -> bool {
        hit.pz() > 0.0
    }

    #[inline]
    pub fn is_track_species(&self, hit: &ScoringPlaneHit) -> bool {
        !self.excluded_pdg_ids.contains(&hit.pdg_id)
    }

    pub fn accepts(&self, hit: &ScoringPlaneHit) -> bool {
        self.is_primary(hit) && self.on_plane(hit) && self.is_forward(hit) && self.is_track_species(hit)
    }

    /// First accepted hit in collection order.
    pub fn select<'a>(&self, hits: &'a [ScoringPlaneHit]) -> Option<&'a ScoringPlaneHit> {
        hits.iter().find(|hit| self.accepts(hit))
    }
}

/// Produces the particle-flow track collection from the ECal and HCal scoring planes.
#[derive(Clone, Debug)]
pub struct TrackSelector {
    config: TrackSelectorConfig,
    ecal: HitSelection,
    hcal: HitSelection,
}

impl TrackSelector {
    pub const NAME: &'static str = "TrackSelector";

    pub fn new(config: TrackSelectorConfig) -> Self {
        let ecal = HitSelection::new(&config.ecal_region, &config);
        let hcal = HitSelection::new(&config.hcal_region, &config);
        TrackSelector { config, ecal, hcal }
    }

    /// Select at most one track per region and order them by descending momentum.
    ///
    /// Returns no tracks when truth tracking is disabled.
    pub fn select(&self, ecal_hits: &[ScoringPlaneHit], hcal_hits: Option<&[ScoringPlaneHit]>) -> Vec<ScoringPlaneHit> {
        if !self.config.truth_tracking {
            return Vec::new();
        }

        let mut tracks: Vec<ScoringPlaneHit> = Vec::with_capacity(2);
        match self.ecal.select(ecal_hits) {
            Some(hit) => tracks.push(hit.clone()),
            None => debug!(region = "ecal", n_hits = ecal_hits.len(), "no eligible scoring-plane hit"),
        }
        if let Some(hits) = hcal_hits {
            match self.hcal.select(hits) {
                Some(hit) => tracks.push(hit.clone()),
                None => debug!(region = "hcal", n_hits = hits.len(), "no eligible scoring-plane hit"),
            }
        }

        sort_by_momentum(&mut tracks);
        tracks
    }

    /// Read both regions from the event and publish the selected tracks.
    ///
    /// A missing ECal scoring-plane collection aborts the event; a missing HCal one aborts
    /// or is skipped according to the configured policy. Failures are logged here and
    /// nothing is published on error.
    pub fn produce<S: CollectionStore>(&self, event: &mut S) -> RecoResult<usize> {
        self.try_produce(event).map_err(|e| {
            error!(producer = Self::NAME, error = %e, "Event aborted");
            e
        })
    }

    fn try_produce<S: CollectionStore>(&self, event: &mut S) -> RecoResult<usize> {
        let pass = &self.config.input_pass;
        let ecal_name = &self.config.ecal_region.collection;
        let hcal_name = &self.config.hcal_region.collection;

        if !event.exists(ecal_name, pass) {
            return Err(RecoError::missing(ecal_name, pass));
        }

        let tracks = {
            let ecal_hits = event.get::<ScoringPlaneHit>(ecal_name, pass)?;
            let hcal_hits = if event.exists(hcal_name, pass) {
                Some(event.get::<ScoringPlaneHit>(hcal_name, pass)?)
            } else {
                match self.config.hcal_region_policy {
                    MissingCollectionPolicy::Fatal => return Err(RecoError::missing(hcal_name, pass)),
                    MissingCollectionPolicy::Skip => {
                        debug!(producer = Self::NAME, collection = %hcal_name, "collection absent, region skipped");
                        None
                    }
                }
            };
            self.select(ecal_hits, hcal_hits)
        };

        let n_tracks = tracks.len();
        event.put(&self.config.output_collection, tracks)?;
        Ok(n_tracks)
    }
}
