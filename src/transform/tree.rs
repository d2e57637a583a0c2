//! The transform tree: a [`Hierarchy`] of [`TransformNode`]s plus the
//! invalidation policy that keeps their global matrices honest.
use std::cell::Cell;

use crate::{
    config::Config,
    error::{Result, TransformError},
    transform::{
        components::{DirtyFlags, GlobalTransform, LocalTransform, TransformNode},
        hierarchy::{Hierarchy, NodeId},
        space::{Space, Space3},
        systems::{Counters, Propagation, RecomputeStats},
    },
};

/// Tree of nodes with local transforms and lazily derived global matrices.
///
/// Reads take `&self` and refresh caches on demand; writes take `&mut self` and
/// only mark state stale. The tree is single-threaded: callers sharing it across
/// threads must serialise access themselves.
#[derive(Debug)]
pub struct TransformTree<S: Space = Space3> {
    pub(crate) hierarchy: Hierarchy<TransformNode<S>>,
    pub(crate) propagation: Propagation,
    pub(crate) counters: Counters,
    pub(crate) clock: Cell<u64>,
}

impl<S: Space> Default for TransformTree<S> {
    fn default() -> Self {
        Self::with_propagation(Propagation::default())
    }
}

impl<S: Space> TransformTree<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_propagation(propagation: Propagation) -> Self {
        TransformTree {
            hierarchy: Hierarchy::new(),
            propagation,
            counters: Counters::default(),
            clock: Cell::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_propagation(config.propagation)
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    /// Read-only view of the ownership structure.
    pub fn hierarchy(&self) -> &Hierarchy<TransformNode<S>> {
        &self.hierarchy
    }

    pub fn len(&self) -> usize {
        self.hierarchy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hierarchy.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.hierarchy.contains(id)
    }

    pub fn create_root(&mut self) -> NodeId {
        self.create_root_with(LocalTransform::default())
    }

    pub fn create_root_with(&mut self, local: LocalTransform<S>) -> NodeId {
        self.hierarchy.insert_root(TransformNode::new(local))
    }

    pub fn create_child(&mut self, parent: NodeId) -> Result<NodeId> {
        self.create_child_with(parent, LocalTransform::default())
    }

    pub fn create_child_with(&mut self, parent: NodeId, local: LocalTransform<S>) -> Result<NodeId> {
        self.hierarchy.insert_child(parent, TransformNode::new(local))
    }

    pub fn node(&self, id: NodeId) -> Result<&TransformNode<S>> {
        self.hierarchy.try_get(id)
    }

    pub fn local_transform(&self, id: NodeId) -> Result<LocalTransform<S>> {
        Ok(*self.node(id)?.local())
    }

    pub fn position(&self, id: NodeId) -> Result<S::Vector> {
        Ok(self.node(id)?.local().position())
    }

    pub fn scale(&self, id: NodeId) -> Result<S::Vector> {
        Ok(self.node(id)?.local().scale())
    }

    pub fn rotation(&self, id: NodeId) -> Result<S::Angles> {
        Ok(self.node(id)?.local().rotation())
    }

    pub fn set_position(&mut self, id: NodeId, position: S::Vector) -> Result<()> {
        if self.hierarchy.try_get_mut(id)?.set_position(position) {
            self.local_changed(id)?;
        }
        Ok(())
    }

    pub fn set_position_axis(&mut self, id: NodeId, axis: usize, value: f32) -> Result<()> {
        check_index(axis, S::AXES)?;
        if self.hierarchy.try_get_mut(id)?.set_position_axis(axis, value) {
            self.local_changed(id)?;
        }
        Ok(())
    }

    pub fn set_scale(&mut self, id: NodeId, scale: S::Vector) -> Result<()> {
        if self.hierarchy.try_get_mut(id)?.set_scale(scale) {
            self.local_changed(id)?;
        }
        Ok(())
    }

    pub fn set_scale_axis(&mut self, id: NodeId, axis: usize, value: f32) -> Result<()> {
        check_index(axis, S::AXES)?;
        if self.hierarchy.try_get_mut(id)?.set_scale_axis(axis, value) {
            self.local_changed(id)?;
        }
        Ok(())
    }

    /// Sets every rotation angle; each is wrapped into one full turn.
    pub fn set_rotation(&mut self, id: NodeId, rotation: S::Angles) -> Result<()> {
        if self.hierarchy.try_get_mut(id)?.set_rotation(rotation) {
            self.local_changed(id)?;
        }
        Ok(())
    }

    pub fn set_rotation_axis(&mut self, id: NodeId, plane: usize, angle: f32) -> Result<()> {
        check_index(plane, S::PLANES)?;
        if self.hierarchy.try_get_mut(id)?.set_rotation_axis(plane, angle) {
            self.local_changed(id)?;
        }
        Ok(())
    }

    /// Replaces position, scale and rotation together. Counts as one change.
    pub fn set_local_transform(&mut self, id: NodeId, local: LocalTransform<S>) -> Result<()> {
        let node = self.hierarchy.try_get_mut(id)?;
        let moved = node.set_position(local.position());
        let scaled = node.set_scale(local.scale());
        let rotated = node.set_rotation(local.rotation());
        if moved || scaled || rotated {
            self.local_changed(id)?;
        }
        Ok(())
    }

    /// Moves `id` so that its global position becomes `position`, solving for
    /// the local position through the inverse of the parent's global matrix.
    /// Only the parent's matrix must be invertible; the node's own scale is not
    /// checked, so a zero-scale node still accepts a global position.
    pub fn set_global_position(&mut self, id: NodeId, position: S::Vector) -> Result<()> {
        let local = match self.hierarchy.parent(id)? {
            None => position,
            Some(parent) => {
                let parent_global = self.resolve_global(parent)?;
                let inverse = S::try_inverse(&parent_global.0).ok_or_else(|| {
                    log::warn!(
                        "Cannot place node {} globally: parent {} has a singular global matrix",
                        id,
                        parent
                    );
                    TransformError::SingularMatrix { node: id }
                })?;
                S::transform_point(&inverse, &position)
            }
        };
        self.set_position(id, local)
    }

    pub fn scale_translation_matrix(&self, id: NodeId) -> Result<S::Matrix> {
        Ok(self.node(id)?.scale_translation_matrix(&self.counters))
    }

    pub fn rotation_matrix(&self, id: NodeId) -> Result<S::Matrix> {
        Ok(self.node(id)?.rotation_matrix(&self.counters))
    }

    pub fn local_matrix(&self, id: NodeId) -> Result<S::Matrix> {
        Ok(self.node(id)?.local_matrix(&self.counters))
    }

    pub fn global_transform(&self, id: NodeId) -> Result<GlobalTransform<S>> {
        self.resolve_global(id)
    }

    pub fn global_matrix(&self, id: NodeId) -> Result<S::Matrix> {
        Ok(self.resolve_global(id)?.0)
    }

    pub fn global_position(&self, id: NodeId) -> Result<S::Vector> {
        self.resolve_global(id)?;
        Ok(self.node(id)?.global_position())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.hierarchy.parent(id)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        self.hierarchy.children(id)
    }

    pub fn is_root(&self, id: NodeId) -> Result<bool> {
        self.hierarchy.is_root(id)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.hierarchy.parent(child)? == Some(parent) {
            return Ok(());
        }
        self.hierarchy.add_child(parent, child)?;
        self.moved(child)
    }

    pub fn remove_and_orphan(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.hierarchy.remove_and_orphan(parent, child)?;
        self.moved(child)
    }

    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<()> {
        self.add_child(new_parent, node)
    }

    /// Destroys `node` and everything below it. Returns how many nodes went.
    pub fn destroy(&mut self, node: NodeId) -> Result<usize> {
        self.hierarchy.destroy(node)
    }

    /// Reorders `node` among its siblings. Sibling order has no effect on
    /// transforms.
    pub fn set_index(&mut self, node: NodeId, index: usize) -> Result<()> {
        self.hierarchy.set_index(node, index)
    }

    pub fn flags(&self, id: NodeId) -> Result<DirtyFlags> {
        Ok(self.node(id)?.flags())
    }

    pub fn stats(&self) -> RecomputeStats {
        self.counters.snapshot()
    }

    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}

fn check_index(axis: usize, axes: usize) -> Result<()> {
    if axis < axes {
        Ok(())
    } else {
        Err(TransformError::AxisOutOfRange { axis, axes })
    }
}
