//! Transform hierarchy: local transforms, lazily derived global matrices.

pub use self::{
    components::{DirtyFlags, GlobalTransform, LocalTransform, TransformNode},
    hierarchy::{Ancestors, Hierarchy, NodeId},
    space::{wrap_angle, wrap_angles, Space, Space2, Space3},
    systems::{Propagation, RecomputeStats},
    tree::TransformTree,
};

pub mod components;
pub mod hierarchy;
pub mod space;
mod systems;
mod tree;
