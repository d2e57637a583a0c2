//! Value types and per-node state for the transform tree.

pub use self::{
    node::{DirtyFlags, TransformNode},
    transform::{GlobalTransform, LocalTransform},
};

mod node;
mod transform;
