//! JSON-lines event files.
//!
//! One event per line:
//!
//! ```json
//! {"event": 1, "collections": [
//!   {"kind": "scoring_plane_hits", "name": "EcalScoringPlaneHits", "pass": "sim", "items": [...]},
//!   {"kind": "calo_clusters", "name": "PFHcalClusters", "pass": "sim", "items": [...]}
//! ]}
//! ```

use std::io::{BufRead, Write};

use pfcore::data::candidate::ParticleCandidate;
use pfcore::data::cluster::CaloCluster;
use pfcore::data::hit::ScoringPlaneHit;
use serde::{Deserialize, Serialize};

use crate::error::RecoResult;
use crate::event::store::{CollectionStore, Event};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionRecord {
    ScoringPlaneHits {
        name: String,
        #[serde(default)]
        pass: String,
        items: Vec<ScoringPlaneHit>,
    },
    CaloClusters {
        name: String,
        #[serde(default)]
        pass: String,
        items: Vec<CaloCluster>,
    },
    ParticleCandidates {
        name: String,
        #[serde(default)]
        pass: String,
        items: Vec<ParticleCandidate>,
    },
}

impl CollectionRecord {
    pub fn name(&self) -> &str {
        match self {
            CollectionRecord::ScoringPlaneHits { name, .. }
            | CollectionRecord::CaloClusters { name, .. }
            | CollectionRecord::ParticleCandidates { name, .. } => name,
        }
    }

    pub fn pass(&self) -> &str {
        match self {
            CollectionRecord::ScoringPlaneHits { pass, .. }
            | CollectionRecord::CaloClusters { pass, .. }
            | CollectionRecord::ParticleCandidates { pass, .. } => pass,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CollectionRecord::ScoringPlaneHits { items, .. } => items.len(),
            CollectionRecord::CaloClusters { items, .. } => items.len(),
            CollectionRecord::ParticleCandidates { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the collection into the event under its recorded pass.
    pub fn insert_into(self, event: &mut Event) -> RecoResult<()> {
        match self {
            CollectionRecord::ScoringPlaneHits { name, pass, items } => event.insert(&name, &pass, items),
            CollectionRecord::CaloClusters { name, pass, items } => event.insert(&name, &pass, items),
            CollectionRecord::ParticleCandidates { name, pass, items } => event.insert(&name, &pass, items),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event: u64,
    #[serde(default)]
    pub collections: Vec<CollectionRecord>,
}

impl EventRecord {
    /// Build an in-memory event whose outputs will be published under `pass_name`.
    pub fn into_event(self, pass_name: &str) -> RecoResult<Event> {
        let mut event = Event::new(self.event, pass_name);
        for collection in self.collections {
            collection.insert_into(&mut event)?;
        }
        Ok(event)
    }

    /// Collect the reconstruction outputs of a processed event.
    pub fn from_outputs(event: &Event, track_collection: &str, candidate_collection: &str) -> RecoResult<Self> {
        let pass = event.pass_name();
        let tracks = event.get::<ScoringPlaneHit>(track_collection, pass)?;
        let candidates = event.get::<ParticleCandidate>(candidate_collection, pass)?;
        Ok(EventRecord {
            event: event.number,
            collections: vec![
                CollectionRecord::ScoringPlaneHits {
                    name: track_collection.to_string(),
                    pass: pass.to_string(),
                    items: tracks.to_vec(),
                },
                CollectionRecord::ParticleCandidates {
                    name: candidate_collection.to_string(),
                    pass: pass.to_string(),
                    items: candidates.to_vec(),
                },
            ],
        })
    }
}

/// Read all events from a JSON-lines source, skipping blank lines.
pub fn read_events<R: BufRead>(reader: R, pass_name: &str) -> RecoResult<Vec<Event>> {
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EventRecord = serde_json::from_str(&line)?;
        events.push(record.into_event(pass_name)?);
    }
    Ok(events)
}

pub fn write_records<W: Write>(mut writer: W, records: &[EventRecord]) -> RecoResult<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
