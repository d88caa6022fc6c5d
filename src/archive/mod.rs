//! Archive capability.
//!
//! The recorder never writes archive bytes itself. Everything that touches
//! the output file goes through [`ArchiveBackend`]: context lifetime, opening
//! the archive, building the object hierarchy, adding typed shapes and
//! pushing one sample per shape per frame.
//!
//! All handles are opaque and owned by the backend. A handle stays valid
//! until the context it was created under is destroyed.
//!
//! [`memory::MemoryArchive`] is an in-process backend that keeps everything
//! it receives, which is what the tests and the demo binary record into.

pub mod memory;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ArchiveConfig;
use crate::util::{Result, Vec3};

pub use memory::MemoryArchive;

/// Context allocated by [`ArchiveBackend::create_context`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextHandle(pub u32);

/// Object in an archive hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle {
    pub context: ContextHandle,
    pub index: u32,
}

/// Transform shape attached to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XformHandle(pub NodeHandle);

/// Camera shape attached to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraHandle(pub NodeHandle);

/// Polygon mesh shape attached to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub NodeHandle);

/// Transform sample: translation, scale and angle/axis rotation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct XformSampleData {
    pub translation: Vec3,
    pub scale: Vec3,
    /// Degrees.
    pub rotation_angle: f32,
    pub rotation_axis: Vec3,
    pub inherits: bool,
}

/// Camera sample.
///
/// Apertures are in centimeters and focal length in millimeters, so the
/// vertical field of view is `2 * atan(vertical_aperture / (2 * focal_length / 10))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraSampleData {
    pub focal_length: f32,
    pub horizontal_aperture: f32,
    pub vertical_aperture: f32,
    pub near_clipping_plane: f32,
    pub far_clipping_plane: f32,
    pub focus_distance: f32,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub aspect_ratio: f32,
}

/// Polygon mesh sample borrowing the host's buffers.
#[derive(Clone, Copy, Debug)]
pub struct PolyMeshSampleData<'a> {
    pub positions: &'a [Vec3],
    pub indices: &'a [u32],
    pub vertex_count: usize,
    pub index_count: usize,
}

impl<'a> PolyMeshSampleData<'a> {
    /// Sample over whole buffers; counts follow the slice lengths.
    pub fn new(positions: &'a [Vec3], indices: &'a [u32]) -> Self {
        Self {
            positions,
            indices,
            vertex_count: positions.len(),
            index_count: indices.len(),
        }
    }

    /// Positions as a flat `xyz` float buffer.
    pub fn positions_flat(&self) -> &'a [f32] {
        let positions: &'a [Vec3] = self.positions;
        bytemuck::cast_slice(&positions[..self.vertex_count.min(positions.len())])
    }

    /// Indices limited to `index_count`.
    pub fn indices(&self) -> &'a [u32] {
        let indices: &'a [u32] = self.indices;
        &indices[..self.index_count.min(indices.len())]
    }
}

/// The writer side of an archive.
///
/// Calls are synchronous and made from the thread driving the session.
pub trait ArchiveBackend {
    /// Allocate a context configured by `config`; `None` on refusal.
    fn create_context(&mut self, config: &ArchiveConfig) -> Option<ContextHandle>;

    /// Release a context, flushing and closing its archive.
    fn destroy_context(&mut self, context: ContextHandle);

    /// Open the output archive for `context`.
    fn open_archive(&mut self, context: ContextHandle, path: &Path) -> bool;

    /// Top object of the archive opened under `context`.
    fn root_object(&mut self, context: ContextHandle) -> Result<NodeHandle>;

    /// Create a named child object under `parent`.
    fn create_object(&mut self, parent: NodeHandle, name: &str) -> Result<NodeHandle>;

    fn add_xform(&mut self, node: NodeHandle) -> Result<XformHandle>;
    fn write_xform_sample(&mut self, xform: XformHandle, sample: &XformSampleData) -> Result<()>;

    fn add_camera(&mut self, node: NodeHandle) -> Result<CameraHandle>;
    fn write_camera_sample(
        &mut self,
        camera: CameraHandle,
        sample: &CameraSampleData,
    ) -> Result<()>;

    fn add_polymesh(&mut self, node: NodeHandle) -> Result<MeshHandle>;
    fn write_polymesh_sample(
        &mut self,
        mesh: MeshHandle,
        sample: &PolyMeshSampleData<'_>,
    ) -> Result<()>;

    /// Time stamped on every sample written until the next call.
    fn set_time(&mut self, context: ContextHandle, time: f64) -> Result<()>;
}

macro_rules! forward_backend {
    ($($ty:ty),*) => {
        $(
            impl<A: ArchiveBackend + ?Sized> ArchiveBackend for $ty {
                fn create_context(&mut self, config: &ArchiveConfig) -> Option<ContextHandle> {
                    (**self).create_context(config)
                }

                fn destroy_context(&mut self, context: ContextHandle) {
                    (**self).destroy_context(context)
                }

                fn open_archive(&mut self, context: ContextHandle, path: &Path) -> bool {
                    (**self).open_archive(context, path)
                }

                fn root_object(&mut self, context: ContextHandle) -> Result<NodeHandle> {
                    (**self).root_object(context)
                }

                fn create_object(&mut self, parent: NodeHandle, name: &str) -> Result<NodeHandle> {
                    (**self).create_object(parent, name)
                }

                fn add_xform(&mut self, node: NodeHandle) -> Result<XformHandle> {
                    (**self).add_xform(node)
                }

                fn write_xform_sample(
                    &mut self,
                    xform: XformHandle,
                    sample: &XformSampleData,
                ) -> Result<()> {
                    (**self).write_xform_sample(xform, sample)
                }

                fn add_camera(&mut self, node: NodeHandle) -> Result<CameraHandle> {
                    (**self).add_camera(node)
                }

                fn write_camera_sample(
                    &mut self,
                    camera: CameraHandle,
                    sample: &CameraSampleData,
                ) -> Result<()> {
                    (**self).write_camera_sample(camera, sample)
                }

                fn add_polymesh(&mut self, node: NodeHandle) -> Result<MeshHandle> {
                    (**self).add_polymesh(node)
                }

                fn write_polymesh_sample(
                    &mut self,
                    mesh: MeshHandle,
                    sample: &PolyMeshSampleData<'_>,
                ) -> Result<()> {
                    (**self).write_polymesh_sample(mesh, sample)
                }

                fn set_time(&mut self, context: ContextHandle, time: f64) -> Result<()> {
                    (**self).set_time(context, time)
                }
            }
        )*
    };
}

forward_backend!(Box<A>, &mut A);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polymesh_sample_counts() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let indices = [0u32, 1, 2];
        let sample = PolyMeshSampleData::new(&positions, &indices);
        assert_eq!(sample.vertex_count, 3);
        assert_eq!(sample.index_count, 3);
        assert_eq!(sample.positions_flat().len(), 9);
        assert_eq!(sample.positions_flat()[3], 1.0);
    }
}
