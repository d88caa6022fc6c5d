//! Host scene capability.
//!
//! The recorder does not own a scene graph. A host exposes its capturable
//! objects through [`Scene`], one enumeration per kind, and the session
//! keeps only weak references to what it discovers. Once a host drops its
//! last strong reference the object reads as destroyed and its adapters
//! stop writing.
//!
//! [`memory::MemoryScene`] is a minimal host used by tests and the demo.

pub mod memory;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::archive::{ArchiveBackend, NodeHandle};
use crate::util::{Result, Vec3, WorldTransform};

pub use memory::MemoryScene;

/// Anything with a name and a world transform.
pub trait SceneNode {
    fn name(&self) -> String;
    fn world_transform(&self) -> WorldTransform;
}

/// A camera.
pub trait CameraTarget: SceneNode {
    fn camera_state(&self) -> CameraState;
}

/// A static mesh renderer.
pub trait MeshRendererTarget: SceneNode {
    /// Mesh assigned to the renderer, if any.
    fn shared_mesh(&self) -> Option<Rc<Mesh>>;
}

/// A skinned mesh renderer.
pub trait SkinnedMeshTarget: SceneNode {
    /// Mesh as deformed for the current frame.
    fn evaluated_mesh(&self) -> Option<Rc<Mesh>>;
}

/// User-supplied recorder that writes its own sub-hierarchy.
pub trait CustomRecorder {
    fn name(&self) -> String;

    /// Called once at session start with the archive root.
    fn set_parent(&mut self, archive: &mut dyn ArchiveBackend, parent: NodeHandle) -> Result<()>;

    /// Called once per captured frame.
    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> Result<()>;
}

/// Shared handle the host keeps for a custom recorder.
pub type CustomRecorderRef = Rc<RefCell<dyn CustomRecorder>>;

/// Enumerates every live object of each capturable kind.
pub trait Scene {
    fn cameras(&self) -> Vec<Rc<dyn CameraTarget>>;
    fn mesh_renderers(&self) -> Vec<Rc<dyn MeshRendererTarget>>;
    fn skinned_mesh_renderers(&self) -> Vec<Rc<dyn SkinnedMeshTarget>>;
    fn custom_recorders(&self) -> Vec<CustomRecorderRef>;
}

/// Camera parameters as the host exposes them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub aspect: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    pub focus_distance: f32,
    /// Film height in centimeters.
    pub vertical_aperture: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            field_of_view: 60.0,
            aspect: 16.0 / 9.0,
            near_clip: 0.3,
            far_clip: 1000.0,
            focus_distance: 10.0,
            vertical_aperture: 2.4,
        }
    }
}

/// Vertex positions plus one triangle index list per submesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    submeshes: Vec<Vec<u32>>,
}

impl Mesh {
    /// Single-submesh mesh.
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, submeshes: vec![indices] }
    }

    pub fn with_submeshes(vertices: Vec<Vec3>, submeshes: Vec<Vec<u32>>) -> Self {
        Self { vertices, submeshes }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Index list of a submesh; empty when out of range.
    pub fn indices(&self, submesh: usize) -> &[u32] {
        self.submeshes.get(submesh).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Unit cube, 8 vertices, 12 triangles.
    pub fn cube() -> Self {
        let vertices = vec![
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 6, 2, 3, 7, 6, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self::new(vertices, indices)
    }
}
