use nalgebra::Vector3;

use crate::data::hit::ScoringPlaneHit;

/// Straight-line extrapolation of a track to the plane `z = z_target`.
///
/// Returns `None` if the track does not move forward (pz <= 0).
pub fn project_to_z(hit: &ScoringPlaneHit, z_target: f64) -> Option<Vector3<f64>> {
    let pz = hit.pz();
    if pz <= 0.0 {
        return None;
    }
    let dz = z_target - hit.z();
    Some(Vector3::new(
        hit.position.x + hit.momentum.x / pz * dz,
        hit.position.y + hit.momentum.y / pz * dz,
        z_target,
    ))
}

/// Transverse distance between a track extrapolated to `point.z` and `point`.
///
/// Falls back to the plain euclidean distance for tracks that cannot be extrapolated.
pub fn projected_distance(hit: &ScoringPlaneHit, point: &Vector3<f64>) -> f64 {
    match project_to_z(hit, point.z) {
        Some(projected) => (projected - point).norm(),
        None => euclidean_distance(&hit.position, point),
    }
}

#[inline]
pub fn euclidean_distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}

/// Momentum of a massless particle of energy `energy` travelling from `vertex` to `position`.
///
/// Returns the zero vector when the direction is undefined.
pub fn calo_momentum(energy: f64, vertex: &Vector3<f64>, position: &Vector3<f64>) -> Vector3<f64> {
    let direction = position - vertex;
    let norm = direction.norm();
    if norm <= 0.0 || !norm.is_finite() {
        return Vector3::zeros();
    }
    direction * (energy / norm)
}

/// Energy-to-momentum ratio; infinite for a track without momentum.
#[inline]
pub fn energy_momentum_ratio(energy: f64, p: f64) -> f64 {
    if p > 0.0 {
        energy / p
    } else {
        f64::INFINITY
    }
}
