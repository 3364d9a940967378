//! Per-image encoding pipeline.
//!
//! Glue layer wiring the stages together:
//! pupil → safe zone → spectrum/waveform → features → latent code.
//!
//! Algorithmic primitives live in `crate::pupil`, `crate::ring`,
//! `crate::spectral`, `crate::features` and `crate::latent`. This layer owns
//! stage order and confidence propagation. Confidence is carried to the
//! result and never feeds the encoding.

mod result;
mod run;

pub use result::IrisAnalysis;
pub use run::run;
