//! A tree of nodes carrying local position, scale and rotation, with local and
//! global transformation matrices derived on demand and cached until something
//! they depend on changes.
//!
//! ```
//! use nalgebra::Vector3;
//! use transform_tree::{LocalTransform, TransformTree};
//!
//! let mut tree: TransformTree = TransformTree::new();
//! let root = tree.create_root();
//! let child = tree
//!     .create_child_with(root, LocalTransform::from_position(Vector3::new(5.0, 0.0, 0.0)))
//!     .unwrap();
//!
//! tree.set_position(root, Vector3::new(0.0, 10.0, 0.0)).unwrap();
//! assert_eq!(tree.global_position(child).unwrap(), Vector3::new(5.0, 10.0, 0.0));
//! ```

pub mod config;
pub mod error;
pub mod transform;

pub use crate::{
    config::Config,
    error::{ErrorKind, Result, TransformError},
    transform::{
        DirtyFlags, GlobalTransform, Hierarchy, LocalTransform, NodeId, Propagation,
        RecomputeStats, Space, Space2, Space3, TransformNode, TransformTree,
    },
};
