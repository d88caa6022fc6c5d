//! Mesh and skinned mesh adapters.
//!
//! Only submesh [`CAPTURED_SUBMESH`] is written per sample. Other submeshes
//! are neither merged nor iterated.

use std::rc::{Rc, Weak};

use super::{CaptureOutcome, CaptureTarget, TargetKind};
use crate::archive::{ArchiveBackend, MeshHandle, PolyMeshSampleData};
use crate::scene::{Mesh, MeshRendererTarget, SkinnedMeshTarget};
use crate::util::Result;

/// Submesh whose indices are captured.
pub const CAPTURED_SUBMESH: usize = 0;

/// Write one geometry sample: all vertex positions plus the index list of
/// [`CAPTURED_SUBMESH`] (empty if the mesh has no submeshes).
pub fn write_mesh(archive: &mut dyn ArchiveBackend, handle: MeshHandle, mesh: &Mesh) -> Result<()> {
    let sample = PolyMeshSampleData::new(mesh.vertices(), mesh.indices(CAPTURED_SUBMESH));
    archive.write_polymesh_sample(handle, &sample)
}

/// Captures the shared mesh of a static renderer.
pub struct MeshAdapter {
    target: Weak<dyn MeshRendererTarget>,
    mesh: MeshHandle,
    name: String,
}

impl MeshAdapter {
    pub fn new(target: &Rc<dyn MeshRendererTarget>, mesh: MeshHandle) -> Self {
        Self {
            target: Rc::downgrade(target),
            mesh,
            name: target.name(),
        }
    }
}

impl CaptureTarget for MeshAdapter {
    fn kind(&self) -> TargetKind {
        TargetKind::Mesh
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> Result<CaptureOutcome> {
        let Some(mesh) = self.target.upgrade().and_then(|t| t.shared_mesh()) else {
            return Ok(CaptureOutcome::Skipped);
        };
        write_mesh(archive, self.mesh, &mesh)?;
        Ok(CaptureOutcome::Written)
    }
}

/// Captures the per-frame evaluated mesh of a skinned renderer.
pub struct SkinnedMeshAdapter {
    target: Weak<dyn SkinnedMeshTarget>,
    mesh: MeshHandle,
    name: String,
}

impl SkinnedMeshAdapter {
    pub fn new(target: &Rc<dyn SkinnedMeshTarget>, mesh: MeshHandle) -> Self {
        Self {
            target: Rc::downgrade(target),
            mesh,
            name: target.name(),
        }
    }
}

impl CaptureTarget for SkinnedMeshAdapter {
    fn kind(&self) -> TargetKind {
        TargetKind::SkinnedMesh
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> Result<CaptureOutcome> {
        let Some(mesh) = self.target.upgrade().and_then(|t| t.evaluated_mesh()) else {
            return Ok(CaptureOutcome::Skipped);
        };
        write_mesh(archive, self.mesh, &mesh)?;
        Ok(CaptureOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::memory::SampleValue;
    use crate::archive::{MemoryArchive, NodeHandle};
    use crate::config::ArchiveConfig;
    use crate::scene::{MemoryScene, Scene};
    use crate::util::{Vec3, WorldTransform};
    use std::path::Path;

    fn polymesh_node(archive: &mut MemoryArchive) -> (NodeHandle, MeshHandle) {
        let ctx = archive.create_context(&ArchiveConfig::default()).unwrap();
        assert!(archive.open_archive(ctx, Path::new("m.abc")));
        let root = archive.root_object(ctx).unwrap();
        let node = archive.create_object(root, "quad").unwrap();
        let mesh = archive.add_polymesh(node).unwrap();
        (node, mesh)
    }

    #[test]
    fn test_only_first_submesh_is_written() {
        let mut archive = MemoryArchive::new();
        let (node, handle) = polymesh_node(&mut archive);

        let mut scene = MemoryScene::new();
        let quad = Mesh::with_submeshes(
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        );
        scene.add_mesh_renderer("quad", WorldTransform::IDENTITY, Some(quad));
        let mut adapter = MeshAdapter::new(&scene.mesh_renderers()[0], handle);
        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Written);

        let record = archive.archive(node.context).unwrap();
        let samples = &record.objects[node.index as usize].samples;
        match &samples[0].value {
            SampleValue::PolyMesh { positions, indices } => {
                assert_eq!(positions.len(), 4);
                assert_eq!(indices, &vec![0, 1, 2]);
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_renderer_without_mesh_is_skipped() {
        let mut archive = MemoryArchive::new();
        let (_node, handle) = polymesh_node(&mut archive);

        let mut scene = MemoryScene::new();
        scene.add_skinned_mesh_renderer("body", WorldTransform::IDENTITY, None);
        let mut adapter = SkinnedMeshAdapter::new(&scene.skinned_mesh_renderers()[0], handle);
        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Skipped);
        assert_eq!(archive.write_count(), 0);

        scene.set_mesh("body", Some(Mesh::cube()));
        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Written);
        assert_eq!(archive.write_count(), 1);
    }

    #[test]
    fn test_mesh_without_submeshes_writes_empty_indices() {
        let mut archive = MemoryArchive::new();
        let (node, handle) = polymesh_node(&mut archive);
        let points = Mesh::with_submeshes(vec![Vec3::ZERO, Vec3::ONE], Vec::new());
        write_mesh(&mut archive, handle, &points).unwrap();

        let record = archive.archive(node.context).unwrap();
        match &record.objects[node.index as usize].samples[0].value {
            SampleValue::PolyMesh { positions, indices } => {
                assert_eq!(positions.len(), 2);
                assert!(indices.is_empty());
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }
}
