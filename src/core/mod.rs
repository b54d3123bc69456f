//! Core glint modelling and correction modules

pub mod validation;
pub mod cox_munk;
pub mod glint_field;
pub mod correction;
pub mod scaling;
pub mod deglint;

// Re-export main types
pub use cox_munk::{CoxMunkParams, SlopeStatistics, GlintSample, fresnel_reflectance, glint_sample};
pub use glint_field::{coxmunk_backend, coxmunk_backend_with_params, validate_geometry};
pub use correction::{CorrectionEngine, CorrectionParams};
pub use scaling::FixedPointScaling;
pub use deglint::{GlintCorrector, CoxMunkOptions, CoxMunkProduct, DeglintConfig};
