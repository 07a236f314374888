//! Calorimeter energy-correction curves.
//!
//! A curve maps a raw deposited energy to an estimate of the true energy. Knots carry
//! a multiplicative correction factor; between knots the corrected energy is linearly
//! interpolated, so a curve that is non-decreasing at its knots is non-decreasing
//! everywhere. Curves are loaded once per job and only ever queried afterwards.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("knot length mismatch: {energies} energies, {factors} factors")]
    LengthMismatch { energies: usize, factors: usize },

    #[error("knot energies must be strictly increasing (index {index})")]
    NotIncreasing { index: usize },

    #[error("correction factor at index {index} must be finite and positive, got {value}")]
    InvalidFactor { index: usize, value: f64 },

    #[error("knot energy at index {index} is not finite")]
    NonFiniteEnergy { index: usize },

    #[error("corrected energy decreases between knots {index} and {}", .index + 1)]
    NotMonotonic { index: usize },
}

/// Piecewise-linear correction factor as a function of raw energy.
///
/// # Description
///
/// Inside the knot range `correct` interpolates linearly between the corrected knot
/// energies `e_i * f_i`; outside it the first/last factor is applied. `factor(e)` is
/// `correct(e) / e`. A curve without knots is the identity correction.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveKnots", into = "CurveKnots")]
pub struct EnergyCorrectionCurve {
    energies: Vec<f64>,
    factors: Vec<f64>,
}

/// Raw knot table, as stored in calibration data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveKnots {
    #[serde(default)]
    pub energies: Vec<f64>,
    #[serde(default)]
    pub factors: Vec<f64>,
}

impl EnergyCorrectionCurve {
    /// Constructs a new `EnergyCorrectionCurve`, validating the knots.
    ///
    /// # Arguments
    ///
    /// * `energies` - raw energies of the knots, strictly increasing.
    /// * `factors` - correction factor at each knot, finite and positive.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use pfcore::algorithm::correction::EnergyCorrectionCurve;
    /// let curve = EnergyCorrectionCurve::new(vec![1.0, 3.0], vec![1.2, 1.1]).unwrap();
    /// assert!((curve.correct(2.0) - 2.25).abs() < 1e-12);
    /// ```
    pub fn new(energies: Vec<f64>, factors: Vec<f64>) -> Result<Self, CurveError> {
        if energies.len() != factors.len() {
            return Err(CurveError::LengthMismatch {
                energies: energies.len(),
                factors: factors.len(),
            });
        }
        if let Some(index) = energies.iter().position(|e| !e.is_finite()) {
            return Err(CurveError::NonFiniteEnergy { index });
        }
        if let Some((index, &value)) = factors
            .iter()
            .enumerate()
            .find(|(_, f)| !f.is_finite() || **f <= 0.0)
        {
            return Err(CurveError::InvalidFactor { index, value });
        }
        for (index, (a, b)) in energies.iter().tuple_windows().enumerate() {
            if b <= a {
                return Err(CurveError::NotIncreasing { index: index + 1 });
            }
        }
        for (index, ((e0, f0), (e1, f1))) in energies
            .iter()
            .zip(factors.iter())
            .tuple_windows()
            .enumerate()
        {
            if e1 * f1 < e0 * f0 {
                return Err(CurveError::NotMonotonic { index });
            }
        }
        Ok(EnergyCorrectionCurve { energies, factors })
    }

    pub fn identity() -> Self {
        EnergyCorrectionCurve::default()
    }

    pub fn is_identity(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Correction factor at the given raw energy.
    pub fn factor(&self, raw_energy: f64) -> f64 {
        match self.interior(raw_energy) {
            Some(corrected) => corrected / raw_energy,
            None => self.edge_factor(raw_energy),
        }
    }

    /// Corrected energy for the given raw deposited energy.
    pub fn correct(&self, raw_energy: f64) -> f64 {
        match self.interior(raw_energy) {
            Some(corrected) => corrected,
            None => raw_energy * self.edge_factor(raw_energy),
        }
    }

    fn edge_factor(&self, raw_energy: f64) -> f64 {
        match (self.factors.first(), self.factors.last()) {
            (Some(&first), _) if raw_energy <= self.energies[0] => first,
            (_, Some(&last)) => last,
            _ => 1.0,
        }
    }

    /// Interpolated corrected energy, `None` outside the open knot range.
    fn interior(&self, raw_energy: f64) -> Option<f64> {
        let n = self.energies.len();
        if n < 2 || !(raw_energy > self.energies[0] && raw_energy < self.energies[n - 1]) {
            return None;
        }
        // first knot strictly above raw_energy; 1 <= hi <= n - 1 here
        let hi = self.energies.partition_point(|&e| e <= raw_energy);
        let lo = hi - 1;
        let (e0, e1) = (self.energies[lo], self.energies[hi]);
        let (c0, c1) = (e0 * self.factors[lo], e1 * self.factors[hi]);
        Some(c0 + (c1 - c0) * (raw_energy - e0) / (e1 - e0))
    }
}

impl TryFrom<CurveKnots> for EnergyCorrectionCurve {
    type Error = CurveError;

    fn try_from(knots: CurveKnots) -> Result<Self, Self::Error> {
        EnergyCorrectionCurve::new(knots.energies, knots.factors)
    }
}

impl From<EnergyCorrectionCurve> for CurveKnots {
    fn from(curve: EnergyCorrectionCurve) -> Self {
        CurveKnots {
            energies: curve.energies,
            factors: curve.factors,
        }
    }
}
