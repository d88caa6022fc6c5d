//! Math type re-exports and transform helpers.
//!
//! Host scenes hand out world-space transforms; archive transform samples
//! want translation, scale and a rotation expressed as angle (degrees) plus
//! unit axis. The conversion lives here.

pub use glam::{Mat4, Quat, Vec3};

use serde::{Deserialize, Serialize};

/// Baked world-space transform of a scene object.
///
/// `lossy_scale` is the global scale approximation a host reports once the
/// hierarchy contains rotation and non-uniform scale; it cannot always be
/// represented exactly by a single vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub lossy_scale: Vec3,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        lossy_scale: Vec3::ONE,
    };

    /// Create from translation, rotation and scale.
    #[inline]
    pub fn from_trs(position: Vec3, rotation: Quat, lossy_scale: Vec3) -> Self {
        Self { position, rotation, lossy_scale }
    }

    /// Rotation as (angle in degrees, unit axis).
    #[inline]
    pub fn angle_axis(&self) -> (f32, Vec3) {
        angle_axis_degrees(self.rotation)
    }

    /// Compose into a 4x4 matrix (scale, then rotate, then translate).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.lossy_scale, self.rotation, self.position)
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Decompose a rotation into an angle in degrees and a unit axis.
///
/// Identity (or a denormalized near-identity) yields `(0, +X)`. The angle is
/// in `[0, 360]`, the quaternion is not re-signed first.
pub fn angle_axis_degrees(rotation: Quat) -> (f32, Vec3) {
    let q = if rotation.is_finite() && rotation.length_squared() > 0.0 {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    };
    let (axis, angle) = q.to_axis_angle();
    (angle.to_degrees(), axis)
}
