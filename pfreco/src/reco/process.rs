//! Job-level sequencing of the reconstruction producers.

use std::fmt;
use std::fmt::{Display, Formatter};

use pfcore::data::candidate::{CandidateKind, ParticleCandidate};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use crate::config::{Calibration, ProcessConfig};
use crate::error::{RecoError, RecoResult};
use crate::event::store::{CollectionStore, Event};
use crate::reco::particle_flow::{count_by_pid, ParticleFlowBuilder};
use crate::reco::track_selector::TrackSelector;

/// What one event contributed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventReport {
    pub n_tracks: usize,
    pub n_candidates: usize,
    pub candidates_by_pid: [usize; 8],
}

/// Counters accumulated over a job, reported once processing ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub events_seen: usize,
    pub events_processed: usize,
    pub events_failed: usize,
    pub n_tracks: usize,
    pub n_candidates: usize,
    pub candidates_by_pid: [usize; 8],
}

impl RunSummary {
    pub fn add(&mut self, report: &RecoResult<EventReport>) {
        self.events_seen += 1;
        match report {
            Ok(r) => {
                self.events_processed += 1;
                self.n_tracks += r.n_tracks;
                self.n_candidates += r.n_candidates;
                for (total, n) in self.candidates_by_pid.iter_mut().zip(r.candidates_by_pid.iter()) {
                    *total += n;
                }
            }
            Err(_) => self.events_failed += 1,
        }
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "events: {} seen, {} processed, {} failed; tracks: {}; candidates: {}",
            self.events_seen, self.events_processed, self.events_failed, self.n_tracks, self.n_candidates
        )?;
        for (pid, n) in self.candidates_by_pid.iter().enumerate().filter(|(_, n)| **n > 0) {
            write!(f, " [{}: {}]", CandidateKind::from_pid(pid as u8), n)?;
        }
        Ok(())
    }
}

/// The track selector followed by the particle-flow builder, sharing one calibration.
#[derive(Clone, Debug)]
pub struct Process {
    pub pass_name: String,
    num_threads: usize,
    track_selector: TrackSelector,
    particle_flow: ParticleFlowBuilder,
}

impl Process {
    pub fn new(config: &ProcessConfig) -> RecoResult<Self> {
        config.validate()?;
        let calibration = Calibration::from(&config.calibration);
        info!(
            pass = %config.pass_name,
            ecal_knots = calibration.ecal.len(),
            hcal_knots = calibration.hcal.len(),
            "configured particle-flow process"
        );
        Ok(Process {
            pass_name: config.pass_name.clone(),
            num_threads: config.num_threads,
            track_selector: TrackSelector::new(config.track_selector.clone()),
            particle_flow: ParticleFlowBuilder::new(config.particle_flow.clone(), calibration),
        })
    }

    /// Run both producers on one event. The first error aborts the event.
    pub fn process_event<S: CollectionStore>(&self, event: &mut S) -> RecoResult<EventReport> {
        let n_tracks = self.track_selector.produce(event)?;
        let n_candidates = self.particle_flow.produce(event)?;

        let candidates = event.get::<ParticleCandidate>(&self.particle_flow.config().output_collection, event.pass_name())?;
        Ok(EventReport {
            n_tracks,
            n_candidates,
            candidates_by_pid: count_by_pid(candidates),
        })
    }

    /// Process events in parallel, keeping input order.
    ///
    /// Events that fail are dropped whole; only fully processed events are returned.
    pub fn run(&self, events: Vec<Event>) -> RecoResult<(Vec<Event>, RunSummary)> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .map_err(|e| RecoError::InvalidConfig(format!("failed to build thread pool: {}", e)))?;

        let results: Vec<(Event, RecoResult<EventReport>)> = pool.install(|| {
            events
                .into_par_iter()
                .map(|mut event| {
                    let report = self.process_event(&mut event);
                    (event, report)
                })
                .collect()
        });

        let mut summary = RunSummary::default();
        let mut processed = Vec::with_capacity(results.len());
        for (event, report) in results {
            summary.add(&report);
            match report {
                Ok(_) => processed.push(event),
                Err(e) => warn!(event = event.number, error = %e, "event skipped"),
            }
        }

        info!("{}", summary);
        Ok((processed, summary))
    }
}
