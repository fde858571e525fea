//! Arena-backed RVE tree.

use mp_core::{FrameRotation, PhaseId};

use crate::error::{PhaseError, PhaseResult};
use crate::material::{Geometry, MaterialProps};
use crate::state::{KindTag, StatePair, StateVariables};

/// One phase of the RVE.
#[derive(Debug, Clone)]
pub struct PhaseNode {
    pub(crate) id: PhaseId,
    pub(crate) geometry: Geometry,
    pub(crate) material: MaterialProps,
    pub(crate) rotation: FrameRotation,
    pub(crate) parent: Option<PhaseId>,
    pub(crate) children: Vec<PhaseId>,
    pub state: StatePair,
}

impl PhaseNode {
    pub fn id(&self) -> PhaseId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn material(&self) -> &MaterialProps {
        &self.material
    }

    pub fn rotation(&self) -> &FrameRotation {
        &self.rotation
    }

    pub fn parent(&self) -> Option<PhaseId> {
        self.parent
    }

    pub fn children(&self) -> &[PhaseId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Rotate the material-frame state into the global frame.
    pub fn local2global(&mut self) -> PhaseResult<()> {
        let PhaseNode {
            id,
            rotation,
            state,
            ..
        } = self;
        if state.global.tag() != state.local.tag() {
            return Err(PhaseError::KindMismatch { phase: *id });
        }
        state.global.assign_to_global(&state.local, rotation);
        Ok(())
    }

    /// Rotate the global-frame state into the material frame.
    pub fn global2local(&mut self) -> PhaseResult<()> {
        let PhaseNode {
            id,
            rotation,
            state,
            ..
        } = self;
        if state.global.tag() != state.local.tag() {
            return Err(PhaseError::KindMismatch { phase: *id });
        }
        state.local.assign_to_local(&state.global, rotation);
        Ok(())
    }
}

/// The representative volume element. Index 0 is always the root.
#[derive(Debug, Clone)]
pub struct RveTree {
    pub(crate) nodes: Vec<PhaseNode>,
}

impl RveTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &PhaseNode {
        &self.nodes[0]
    }

    pub fn root_mut(&mut self) -> &mut PhaseNode {
        &mut self.nodes[0]
    }

    /// Global-frame state of the root, the quantity the solver drives.
    pub fn global(&self) -> &StateVariables {
        &self.nodes[0].state.global
    }

    pub fn global_mut(&mut self) -> &mut StateVariables {
        &mut self.nodes[0].state.global
    }

    pub fn node(&self, id: PhaseId) -> PhaseResult<&PhaseNode> {
        self.nodes
            .get(id.index())
            .ok_or(PhaseError::UnknownPhase(id))
    }

    pub fn node_mut(&mut self, id: PhaseId) -> PhaseResult<&mut PhaseNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or(PhaseError::UnknownPhase(id))
    }

    pub fn nodes(&self) -> &[PhaseNode] {
        &self.nodes
    }

    pub fn kind(&self) -> KindTag {
        self.global().tag()
    }

    /// Phase ids in top-down (pre-order) traversal order.
    pub fn preorder(&self) -> Vec<PhaseId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![PhaseId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            let children = &self.nodes[id.index()].children;
            stack.extend(children.iter().rev().copied());
        }
        order
    }

    /// Restore every phase to its last checkpoint.
    pub fn to_start(&mut self) {
        for id in self.preorder() {
            self.nodes[id.index()].state.to_start();
        }
    }

    /// Commit every phase's current state as the new checkpoint.
    pub fn set_start(&mut self) {
        for id in self.preorder() {
            self.nodes[id.index()].state.set_start();
        }
    }

    /// Switch every phase to a different state payload.
    pub fn retag(&mut self, tag: KindTag) {
        for node in &mut self.nodes {
            node.state.retag(tag);
        }
    }

    /// Zero tangent operators and flux in every phase.
    pub fn reset_tangents(&mut self) {
        for node in &mut self.nodes {
            node.state.global.reset_tangents();
            node.state.local.reset_tangents();
        }
    }

    pub fn local2global(&mut self, id: PhaseId) -> PhaseResult<()> {
        self.node_mut(id)?.local2global()
    }

    pub fn global2local(&mut self, id: PhaseId) -> PhaseResult<()> {
        self.node_mut(id)?.global2local()
    }
}
