//! Engine error types.

use thiserror::Error;

/// Errors surfaced by solver construction and stepping.
///
/// Wiring problems (unknown species, bad dimension, non-positive time step)
/// are caught eagerly, before the first step runs. Instability is detected
/// per step and aborts the run. Empty neighborhoods are never errors: an
/// accumulation over zero pairs simply leaves the destination field at its
/// initialized value.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameters or wiring, detected before the first step.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A non-finite value appeared in a destination field after a group
    /// finished evaluating.
    #[error("numerical instability: non-finite `{field}` on `{species}` at step {step}")]
    NumericalInstability {
        /// Species whose field went non-finite.
        species: String,
        /// Name of the offending field.
        field: &'static str,
        /// Step index at which the scan tripped.
        step: u64,
    },

    /// A neighbor index was consulted after a structural particle mutation
    /// (push, append, remove, extract) without a rebuild in between.
    #[error("neighbor index is stale: particle sets changed after the last rebuild")]
    StaleIndex,

    /// A snapshot writer reported a failure.
    #[error("output error: {0}")]
    Output(String),
}
