//! Errors reported by the sampling pipeline.
//!
//! Failures of individual evaluations never show up here: they are
//! absorbed by the sampler.  Only malformed requests and a sampling
//! pass that could not find a single valid point are reported.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The domain bounds are not finite or not increasing.
    #[error("invalid domain [{min}, {max}]: bounds must be finite \
             with min < max")]
    InvalidDomain { min: f64, max: f64 },

    /// The zoom level of the density context is unusable.
    #[error("invalid density context: pixels per domain unit = \
             {pixels_per_unit} must be finite and > 0")]
    InvalidDensity { pixels_per_unit: f64 },

    /// Every attempt (the uniform pass and each rung of the fallback
    /// ladder) failed to produce a valid point.
    #[error("could not evaluate the function over [{min}, {max}] \
             (tried {attempts:?} samples)")]
    NoValidSamples { min: f64, max: f64, attempts: Vec<usize> },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Check that [`min`, `max`] is a usable domain.
pub(crate) fn check_domain(min: f64, max: f64) -> Result<()> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(Error::InvalidDomain { min, max })
    }
}
