//! Capture-target adapters.
//!
//! Each adapter binds one weakly-held scene object to one shape handle in
//! the archive and pushes a sample per [`CaptureTarget::capture`] call. An
//! adapter whose object is gone reports [`CaptureOutcome::Skipped`] without
//! touching the backend.
//!
//! - [`TransformAdapter`] - baked world transform of any scene node
//! - [`CameraAdapter`] - camera lens parameters
//! - [`MeshAdapter`] / [`SkinnedMeshAdapter`] - positions + first submesh indices
//! - [`CustomAdapter`] - forwards to a user [`CustomRecorder`](crate::scene::CustomRecorder)

mod camera;
mod custom;
mod mesh;
mod transform;

pub use camera::{camera_sample, CameraAdapter};
pub use custom::CustomAdapter;
pub use mesh::{write_mesh, MeshAdapter, SkinnedMeshAdapter, CAPTURED_SUBMESH};
pub use transform::{xform_sample, TransformAdapter};

use serde::Serialize;
use std::fmt;

use crate::archive::ArchiveBackend;
use crate::util::Result;

/// Which adapter a registry entry is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TargetKind {
    Transform,
    Camera,
    Mesh,
    SkinnedMesh,
    Custom,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transform => "transform",
            Self::Camera => "camera",
            Self::Mesh => "mesh",
            Self::SkinnedMesh => "skinned-mesh",
            Self::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// Result of one adapter pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A sample went to the backend.
    Written,
    /// Bound object no longer exists; nothing was written.
    Skipped,
}

/// Binding between one scene object and the archive.
pub trait CaptureTarget {
    fn kind(&self) -> TargetKind;

    /// Name of the bound object, as it was at bind time.
    fn name(&self) -> &str;

    /// Push one sample for the backend's current time.
    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> Result<CaptureOutcome>;
}

impl fmt::Debug for dyn CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.name())
    }
}
