//! Law lookup by name.

use mp_phase::MaterialProps;

use crate::elastic::LinearElastic;
use crate::error::{LawError, LawResult};
use crate::traits::MaterialLaw;

/// Names understood by [`law_from_props`].
pub const KNOWN_LAWS: [&str; 2] = ["ELISO", "ELORT"];

pub fn law_from_props(material: &MaterialProps) -> LawResult<Box<dyn MaterialLaw>> {
    match material.law.trim().to_ascii_uppercase().as_str() {
        "ELISO" => Ok(Box::new(LinearElastic::isotropic(&material.props)?)),
        "ELORT" => Ok(Box::new(LinearElastic::orthotropic(&material.props)?)),
        _ => Err(LawError::UnknownLaw {
            name: material.law.clone(),
        }),
    }
}
