//! Local and global transform values.
use crate::transform::space::{wrap_angles, Space, Space3};

/// Cached transform of a node relative to the root coordinate space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlobalTransform<S: Space = Space3>(pub S::Matrix);

impl<S: Space> GlobalTransform<S> {
    pub fn is_finite(&self) -> bool {
        S::is_finite(&self.0)
    }
}

impl<S: Space> Default for GlobalTransform<S> {
    fn default() -> Self {
        GlobalTransform(S::identity())
    }
}

/// Position, scale and rotation of a node relative to its parent.
///
/// Rotation angles are always kept inside one full turn; the constructor and
/// [`LocalTransform::with_rotation`] wrap whatever they are given.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalTransform<S: Space = Space3> {
    pub(crate) position: S::Vector,
    pub(crate) scale: S::Vector,
    pub(crate) rotation: S::Angles,
}

impl<S: Space> LocalTransform<S> {
    pub fn new(position: S::Vector, scale: S::Vector, rotation: S::Angles) -> Self {
        LocalTransform {
            position,
            scale,
            rotation: wrap_angles::<S>(rotation),
        }
    }

    pub fn from_position(position: S::Vector) -> Self {
        LocalTransform {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: S::Vector) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: S::Angles) -> Self {
        self.rotation = wrap_angles::<S>(rotation);
        self
    }

    pub fn position(&self) -> S::Vector {
        self.position
    }

    pub fn scale(&self) -> S::Vector {
        self.scale
    }

    pub fn rotation(&self) -> S::Angles {
        self.rotation
    }

    pub fn scale_translation_matrix(&self) -> S::Matrix {
        S::scale_translation(&self.scale, &self.position)
    }

    pub fn rotation_matrix(&self) -> S::Matrix {
        S::rotation(&self.rotation)
    }

    /// Scale/translation applied after rotation.
    pub fn to_matrix(&self) -> S::Matrix {
        self.scale_translation_matrix() * self.rotation_matrix()
    }
}

impl<S: Space> Default for LocalTransform<S> {
    fn default() -> Self {
        LocalTransform {
            position: S::zero(),
            scale: S::unit_scale(),
            rotation: S::zero_angles(),
        }
    }
}
