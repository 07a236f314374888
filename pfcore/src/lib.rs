// data module
pub mod data {
    pub mod hit;
    pub mod cluster;
    pub mod candidate;
}

// algorithm module
pub mod algorithm {
    pub mod correction;
    pub mod kinematics;
}
