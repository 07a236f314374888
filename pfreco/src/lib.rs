// src/lib.rs
pub mod error;
pub mod config;

pub mod event {
    pub mod store;
    pub mod io;
}

pub mod reco {
    pub mod track_selector;
    pub mod particle_flow;
    pub mod process;
}
