//! Invalidation and lazy recomputation of global transforms.
//!
//! Writers only flip flags. Reads walk up the parent chain as far as the active
//! [`Propagation`] policy requires and rebuild exactly the stale caches on the way
//! back down.
use std::cell::Cell;

use derivative::Derivative;
use serde::Deserialize;

use crate::{
    error::Result,
    transform::{
        components::{GlobalTransform, TransformNode},
        space::Space,
        NodeId, TransformTree,
    },
};

/// How far an ancestor's change travels before the next read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Derivative)]
#[derivative(Default)]
pub enum Propagation {
    /// A local change flags the direct children only; each recompute flags the
    /// next level. Reads must go top-down to see the latest ancestors.
    OneHop,
    /// A local change flags the whole subtree at once.
    Eager,
    /// Nothing is pushed. Every global matrix remembers the stamp of the parent
    /// matrix it was composed against and is rebuilt when that stamp moves.
    #[derivative(Default)]
    Generational,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) scale_translation: Cell<u64>,
    pub(crate) rotation: Cell<u64>,
    pub(crate) local: Cell<u64>,
    pub(crate) global: Cell<u64>,
    pub(crate) notifications: Cell<u64>,
}

impl Counters {
    pub(crate) fn bump(counter: &Cell<u64>) {
        counter.set(counter.get() + 1);
    }

    pub(crate) fn snapshot(&self) -> RecomputeStats {
        RecomputeStats {
            scale_translation_builds: self.scale_translation.get(),
            rotation_builds: self.rotation.get(),
            local_builds: self.local.get(),
            global_builds: self.global.get(),
            notifications: self.notifications.get(),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in &[
            &self.scale_translation,
            &self.rotation,
            &self.local,
            &self.global,
            &self.notifications,
        ] {
            counter.set(0);
        }
    }
}

/// Work done by a [`TransformTree`] since creation or the last reset.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RecomputeStats {
    pub scale_translation_builds: u64,
    pub rotation_builds: u64,
    pub local_builds: u64,
    pub global_builds: u64,
    /// Individual `parent` flags pushed onto children.
    pub notifications: u64,
}

impl RecomputeStats {
    pub fn total_builds(&self) -> u64 {
        self.scale_translation_builds + self.rotation_builds + self.local_builds + self.global_builds
    }
}

impl<S: Space> TransformTree<S> {
    /// Pushes an effective local change of `id` towards its descendants.
    pub(crate) fn local_changed(&self, id: NodeId) -> Result<()> {
        match self.propagation {
            Propagation::OneHop => {
                if !self.hierarchy.try_get(id)?.flags().children_notified {
                    self.notify_children(id)?;
                }
            }
            Propagation::Eager => self.flag_subtree(id)?,
            Propagation::Generational => {}
        }
        Ok(())
    }

    /// `id` now hangs somewhere else, or nowhere.
    pub(crate) fn moved(&self, id: NodeId) -> Result<()> {
        self.hierarchy
            .try_get(id)?
            .update_flags(|flags| flags.parent = true);
        if self.propagation == Propagation::Eager {
            self.flag_subtree(id)?;
        }
        Ok(())
    }

    fn notify_children(&self, id: NodeId) -> Result<()> {
        for child in self.hierarchy.children(id)? {
            self.hierarchy
                .try_get(*child)?
                .update_flags(|flags| flags.parent = true);
            Counters::bump(&self.counters.notifications);
        }
        self.hierarchy
            .try_get(id)?
            .update_flags(|flags| flags.children_notified = true);
        log::trace!("Node {} notified its children", id);
        Ok(())
    }

    // A flagged node always has a fully flagged subtree, so the walk stops there.
    fn flag_subtree(&self, id: NodeId) -> Result<()> {
        let mut stack = self.hierarchy.children(id)?.to_vec();
        while let Some(current) = stack.pop() {
            let node = self.hierarchy.try_get(current)?;
            if node.flags().parent {
                continue;
            }
            node.update_flags(|flags| flags.parent = true);
            Counters::bump(&self.counters.notifications);
            stack.extend_from_slice(self.hierarchy.children(current)?);
        }
        Ok(())
    }

    /// Brings the global matrix of `id` up to date as far as the policy allows
    /// and returns it.
    pub(crate) fn resolve_global(&self, id: NodeId) -> Result<GlobalTransform<S>> {
        for current in self.stale_path(id)?.into_iter().rev() {
            self.refresh(current)?;
        }
        Ok(self.hierarchy.try_get(id)?.global())
    }

    /// `id` and the ancestors that may need a rebuild before it, nearest first.
    fn stale_path(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut path = vec![id];
        match self.propagation {
            Propagation::OneHop | Propagation::Eager => {
                if !is_stale(self.hierarchy.try_get(id)?) {
                    return Ok(path);
                }
                for above in self.hierarchy.ancestors(id)? {
                    if !is_stale(self.hierarchy.try_get(above)?) {
                        break;
                    }
                    path.push(above);
                }
            }
            Propagation::Generational => path.extend(self.hierarchy.ancestors(id)?),
        }
        Ok(path)
    }

    /// Rebuilds the global matrix of `id` if it is stale. The parent must
    /// already be up to date.
    fn refresh(&self, id: NodeId) -> Result<()> {
        let node = self.hierarchy.try_get(id)?;

        let parent = match self.hierarchy.parent(id)? {
            Some(parent) => parent,
            None => {
                if is_stale(node) {
                    let local = node.local_matrix(&self.counters);
                    self.store(id, node, GlobalTransform(local), node.local().position(), 0);
                    if self.propagation == Propagation::OneHop {
                        self.notify_children(id)?;
                    }
                }
                return Ok(());
            }
        };
        let parent_node = self.hierarchy.try_get(parent)?;

        match self.propagation {
            Propagation::OneHop | Propagation::Eager => {
                if is_stale(node) {
                    self.compose(id, node, parent_node);
                    if self.propagation == Propagation::OneHop {
                        parent_node.update_flags(|flags| flags.children_notified = false);
                        self.notify_children(id)?;
                    }
                }
            }
            Propagation::Generational => {
                if is_stale(node) || node.parent_stamp() != parent_node.stamp() {
                    self.compose(id, node, parent_node);
                }
            }
        }
        Ok(())
    }

    fn compose(&self, id: NodeId, node: &TransformNode<S>, parent: &TransformNode<S>) {
        let parent_global = parent.global();
        let local = node.local_matrix(&self.counters);
        let position = S::transform_point(&parent_global.0, &node.local().position());
        let parent_stamp = parent.stamp();
        self.store(
            id,
            node,
            GlobalTransform(parent_global.0 * local),
            position,
            parent_stamp,
        );
    }

    fn store(
        &self,
        id: NodeId,
        node: &TransformNode<S>,
        global: GlobalTransform<S>,
        position: S::Vector,
        parent_stamp: u64,
    ) {
        debug_assert!(
            global.is_finite(),
            "Node {} had a non-finite global transform",
            id
        );
        let stamp = self.clock.get() + 1;
        self.clock.set(stamp);
        node.store_global(global, position, stamp, parent_stamp);
        Counters::bump(&self.counters.global);
        log::trace!("Rebuilt global transform of node {} (stamp {})", id, stamp);
    }
}

fn is_stale<S: Space>(node: &TransformNode<S>) -> bool {
    let flags = node.flags();
    flags.parent || flags.global || flags.local
}
