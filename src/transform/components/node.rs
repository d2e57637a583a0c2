//! Per-node transform state and its cached derived matrices.
use std::cell::Cell;

use crate::transform::{
    components::{GlobalTransform, LocalTransform},
    space::{wrap_angle, wrap_angles, Space, Space3},
    systems::Counters,
};

/// Which cached values of a node are stale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DirtyFlags {
    /// Scale or position changed since the scale/translation matrix was built.
    pub scale_translation: bool,
    /// Rotation changed since the rotation matrix was built.
    pub rotation: bool,
    /// The local matrix must be rebuilt from its two parts.
    pub local: bool,
    /// The node's own local transform changed since its global matrix was built.
    pub global: bool,
    /// An ancestor changed since the global matrix was built.
    pub parent: bool,
    /// Direct children already carry `parent` for the pending local change.
    pub children_notified: bool,
}

impl DirtyFlags {
    fn fresh() -> Self {
        DirtyFlags {
            scale_translation: true,
            rotation: true,
            local: true,
            global: true,
            parent: true,
            children_notified: false,
        }
    }

    /// No cache of the node needs rebuilding.
    pub fn is_clean(&self) -> bool {
        !(self.scale_translation || self.rotation || self.local || self.global || self.parent)
    }
}

/// A node of the transform tree: local state plus lazily rebuilt caches.
///
/// The caches sit in `Cell`s so reads can refresh them through a shared
/// reference. Writers go through [`crate::TransformTree`], which owns the
/// invalidation protocol.
#[derive(Debug)]
pub struct TransformNode<S: Space = Space3> {
    local: LocalTransform<S>,
    scale_translation: Cell<S::Matrix>,
    rotation: Cell<S::Matrix>,
    local_matrix: Cell<S::Matrix>,
    global: Cell<GlobalTransform<S>>,
    global_position: Cell<S::Vector>,
    flags: Cell<DirtyFlags>,
    stamp: Cell<u64>,
    parent_stamp: Cell<u64>,
}

impl<S: Space> TransformNode<S> {
    pub(crate) fn new(local: LocalTransform<S>) -> Self {
        TransformNode {
            local,
            scale_translation: Cell::new(S::identity()),
            rotation: Cell::new(S::identity()),
            local_matrix: Cell::new(S::identity()),
            global: Cell::new(GlobalTransform::default()),
            global_position: Cell::new(local.position),
            flags: Cell::new(DirtyFlags::fresh()),
            stamp: Cell::new(0),
            parent_stamp: Cell::new(0),
        }
    }

    pub fn local(&self) -> &LocalTransform<S> {
        &self.local
    }

    pub fn flags(&self) -> DirtyFlags {
        self.flags.get()
    }

    pub(crate) fn update_flags(&self, update: impl FnOnce(&mut DirtyFlags)) {
        let mut flags = self.flags.get();
        update(&mut flags);
        self.flags.set(flags);
    }

    pub(crate) fn set_position(&mut self, position: S::Vector) -> bool {
        if self.local.position == position {
            return false;
        }
        self.local.position = position;
        self.mark_scale_translation();
        true
    }

    pub(crate) fn set_position_axis(&mut self, axis: usize, value: f32) -> bool {
        let mut position = self.local.position;
        position[axis] = value;
        self.set_position(position)
    }

    pub(crate) fn set_scale(&mut self, scale: S::Vector) -> bool {
        if self.local.scale == scale {
            return false;
        }
        self.local.scale = scale;
        self.mark_scale_translation();
        true
    }

    pub(crate) fn set_scale_axis(&mut self, axis: usize, value: f32) -> bool {
        let mut scale = self.local.scale;
        scale[axis] = value;
        self.set_scale(scale)
    }

    pub(crate) fn set_rotation(&mut self, rotation: S::Angles) -> bool {
        let rotation = wrap_angles::<S>(rotation);
        if self.local.rotation == rotation {
            return false;
        }
        self.local.rotation = rotation;
        self.update_flags(|flags| {
            flags.rotation = true;
            flags.local = true;
            flags.global = true;
        });
        true
    }

    pub(crate) fn set_rotation_axis(&mut self, plane: usize, angle: f32) -> bool {
        let mut rotation = self.local.rotation;
        rotation[plane] = wrap_angle(angle);
        self.set_rotation(rotation)
    }

    fn mark_scale_translation(&self) {
        self.update_flags(|flags| {
            flags.scale_translation = true;
            flags.local = true;
            flags.global = true;
        });
    }

    pub(crate) fn scale_translation_matrix(&self, counters: &Counters) -> S::Matrix {
        if self.flags().scale_translation {
            self.scale_translation
                .set(self.local.scale_translation_matrix());
            self.update_flags(|flags| flags.scale_translation = false);
            Counters::bump(&counters.scale_translation);
        }
        self.scale_translation.get()
    }

    pub(crate) fn rotation_matrix(&self, counters: &Counters) -> S::Matrix {
        if self.flags().rotation {
            self.rotation.set(self.local.rotation_matrix());
            self.update_flags(|flags| flags.rotation = false);
            Counters::bump(&counters.rotation);
        }
        self.rotation.get()
    }

    pub(crate) fn local_matrix(&self, counters: &Counters) -> S::Matrix {
        if self.flags().local {
            let matrix = self.scale_translation_matrix(counters) * self.rotation_matrix(counters);
            self.local_matrix.set(matrix);
            self.update_flags(|flags| flags.local = false);
            Counters::bump(&counters.local);
        }
        self.local_matrix.get()
    }

    pub(crate) fn global(&self) -> GlobalTransform<S> {
        self.global.get()
    }

    pub(crate) fn global_position(&self) -> S::Vector {
        self.global_position.get()
    }

    /// Stamp of the cached global matrix.
    pub(crate) fn stamp(&self) -> u64 {
        self.stamp.get()
    }

    /// Parent stamp the cached global matrix was composed against.
    pub(crate) fn parent_stamp(&self) -> u64 {
        self.parent_stamp.get()
    }

    pub(crate) fn store_global(
        &self,
        global: GlobalTransform<S>,
        position: S::Vector,
        stamp: u64,
        parent_stamp: u64,
    ) {
        self.global.set(global);
        self.global_position.set(position);
        self.stamp.set(stamp);
        self.parent_stamp.set(parent_stamp);
        self.update_flags(|flags| {
            flags.global = false;
            flags.parent = false;
        });
    }
}
