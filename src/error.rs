//! Errors reported by the hierarchy and the transform tree.
use failure::Fail;

use crate::transform::NodeId;

/// Broad classes of failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request is well-formed but would break the tree or the math
    /// (cycles, singular matrices).
    InvalidOperation,
    /// The request names something that does not exist or is out of range.
    PreconditionViolation,
}

#[derive(Debug, Clone, PartialEq, Fail)]
pub enum TransformError {
    #[fail(display = "node {} cannot become a child of itself", node)]
    SelfParent { node: NodeId },
    #[fail(
        display = "node {} is an ancestor of node {}, attaching it there would create a cycle",
        child, parent
    )]
    Cycle { parent: NodeId, child: NodeId },
    #[fail(
        display = "global matrix above node {} is singular and cannot be inverted",
        node
    )]
    SingularMatrix { node: NodeId },
    #[fail(display = "node {} does not exist in this tree", node)]
    StaleNode { node: NodeId },
    #[fail(display = "node {} is not a child of node {}", child, parent)]
    NotAChild { parent: NodeId, child: NodeId },
    #[fail(
        display = "axis {} is out of range for a transform with {} axes",
        axis, axes
    )]
    AxisOutOfRange { axis: usize, axes: usize },
    #[fail(display = "index {} is out of range for {} siblings", index, len)]
    IndexOutOfRange { index: usize, len: usize },
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::SelfParent { .. }
            | TransformError::Cycle { .. }
            | TransformError::SingularMatrix { .. } => ErrorKind::InvalidOperation,
            TransformError::StaleNode { .. }
            | TransformError::NotAChild { .. }
            | TransformError::AxisOutOfRange { .. }
            | TransformError::IndexOutOfRange { .. } => ErrorKind::PreconditionViolation,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
