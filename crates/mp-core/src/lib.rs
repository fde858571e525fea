//! mp-core: stable foundation for matpath.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact arena IDs for RVE phases)
//! - voigt (6-component tensor notation + frame rotation operators)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod voigt;

pub use error::{MpError, MpResult};
pub use ids::*;
pub use numeric::*;
pub use voigt::*;
