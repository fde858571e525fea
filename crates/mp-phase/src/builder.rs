//! Incremental RVE builder.

use mp_core::{FrameRotation, PhaseId, Real, ensure_all_finite};

use crate::error::{PhaseError, PhaseResult};
use crate::material::{Geometry, GeometryKind, MaterialProps};
use crate::state::{KindTag, StatePair};
use crate::tree::{PhaseNode, RveTree};

const FRACTION_TOL: Real = 1e-6;

struct PendingPhase {
    geometry: Geometry,
    material: MaterialProps,
    parent: Option<PhaseId>,
}

/// Builder for an [`RveTree`].
///
/// The root is supplied up front; sub-phases are attached with
/// [`RveBuilder::add_phase`]. [`RveBuilder::build`] validates the topology
/// and allocates one state pair per phase.
pub struct RveBuilder {
    phases: Vec<PendingPhase>,
}

impl RveBuilder {
    pub fn new(material: MaterialProps) -> Self {
        Self {
            phases: vec![PendingPhase {
                geometry: Geometry::default(),
                material,
                parent: None,
            }],
        }
    }

    pub fn root() -> PhaseId {
        PhaseId::ROOT
    }

    /// Attach a sub-phase under `parent` and return its id.
    pub fn add_phase(
        &mut self,
        parent: PhaseId,
        geometry: Geometry,
        material: MaterialProps,
    ) -> PhaseResult<PhaseId> {
        if parent.index() >= self.phases.len() {
            return Err(PhaseError::UnknownPhase(parent));
        }
        let id = PhaseId::from_index(self.phases.len());
        self.phases.push(PendingPhase {
            geometry,
            material,
            parent: Some(parent),
        });
        Ok(id)
    }

    /// Validate and freeze the tree, creating states of the given kind.
    pub fn build(self, tag: KindTag, temperature: Real) -> PhaseResult<RveTree> {
        let mut nodes: Vec<PhaseNode> = Vec::with_capacity(self.phases.len());
        for (index, pending) in self.phases.into_iter().enumerate() {
            let id = PhaseId::from_index(index);
            validate_phase(id, &pending.geometry, &pending.material)?;
            if let Some(parent) = pending.parent {
                nodes[parent.index()].children.push(id);
            }
            nodes.push(PhaseNode {
                id,
                rotation: FrameRotation::from_orientation(&pending.material.orientation),
                state: StatePair::new(tag, pending.material.nstatev, temperature),
                geometry: pending.geometry,
                material: pending.material,
                parent: pending.parent,
                children: Vec::new(),
            });
        }

        for node in &nodes {
            if node.children.is_empty() {
                continue;
            }
            let sum: Real = node
                .children
                .iter()
                .map(|c| nodes[c.index()].geometry.concentration)
                .sum();
            if (sum - 1.0).abs() > FRACTION_TOL {
                return Err(PhaseError::FractionSum {
                    phase: node.id,
                    sum,
                });
            }
        }

        Ok(RveTree { nodes })
    }
}

fn validate_phase(id: PhaseId, geometry: &Geometry, material: &MaterialProps) -> PhaseResult<()> {
    let c = geometry.concentration;
    if !(c > 0.0 && c <= 1.0) {
        return Err(PhaseError::InvalidGeometry {
            phase: id,
            what: format!("concentration {c} outside (0, 1]"),
        });
    }
    if let GeometryKind::Ellipsoid { axes } = geometry.kind {
        if axes.iter().any(|a| !(*a > 0.0)) {
            return Err(PhaseError::InvalidGeometry {
                phase: id,
                what: "ellipsoid semi-axes must be positive".to_string(),
            });
        }
    }
    if material.law.trim().is_empty() {
        return Err(PhaseError::InvalidMaterial {
            phase: id,
            what: "empty law name".to_string(),
        });
    }
    ensure_all_finite(&material.props, "material props")?;
    let o = material.orientation;
    ensure_all_finite(&[o.psi, o.theta, o.phi], "orientation")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elastic() -> MaterialProps {
        MaterialProps::new("ELISO", vec![70_000.0, 0.3, 0.0])
    }

    #[test]
    fn single_phase_tree() {
        let rve = RveBuilder::new(elastic())
            .build(KindTag::Mechanical, 293.15)
            .unwrap();
        assert_eq!(rve.len(), 1);
        assert!(rve.root().is_leaf());
        assert_eq!(rve.global().temperature, 293.15);
    }

    #[test]
    fn children_are_linked_in_insertion_order() {
        let mut b = RveBuilder::new(elastic());
        let a = b
            .add_phase(RveBuilder::root(), Geometry::general(0.4), elastic())
            .unwrap();
        let c = b
            .add_phase(RveBuilder::root(), Geometry::general(0.6), elastic())
            .unwrap();
        let rve = b.build(KindTag::Mechanical, 0.0).unwrap();
        assert_eq!(rve.root().children(), &[a, c]);
        assert_eq!(rve.node(c).unwrap().parent(), Some(PhaseId::ROOT));
    }

    #[test]
    fn sibling_fractions_must_sum_to_one() {
        let mut b = RveBuilder::new(elastic());
        b.add_phase(RveBuilder::root(), Geometry::general(0.4), elastic())
            .unwrap();
        let err = b.build(KindTag::Mechanical, 0.0).unwrap_err();
        assert!(matches!(err, PhaseError::FractionSum { .. }));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut b = RveBuilder::new(elastic());
        let err = b
            .add_phase(PhaseId::from_index(7), Geometry::general(1.0), elastic())
            .unwrap_err();
        assert_eq!(err, PhaseError::UnknownPhase(PhaseId::from_index(7)));
    }

    #[test]
    fn bad_ellipsoid_axes_are_rejected() {
        let mut b = RveBuilder::new(elastic());
        b.add_phase(
            RveBuilder::root(),
            Geometry {
                kind: GeometryKind::Ellipsoid {
                    axes: [1.0, 0.0, 1.0],
                },
                concentration: 1.0,
            },
            elastic(),
        )
        .unwrap();
        assert!(matches!(
            b.build(KindTag::Mechanical, 0.0),
            Err(PhaseError::InvalidGeometry { .. })
        ));
    }
}
