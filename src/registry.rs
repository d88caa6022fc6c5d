//! Capture registry.
//!
//! Built once when a session begins and never changed afterwards. Discovery
//! walks the scene in a fixed kind order (cameras, mesh renderers, skinned
//! mesh renderers, custom recorders) and, for every object except custom
//! recorders, creates two archive nodes:
//!
//! ```text
//! root
//! └── <name>_trans   (xform shape)   -> TransformAdapter
//!     └── <name>     (camera/mesh)   -> shape adapter
//! ```
//!
//! Custom recorders get the root node through `set_parent` and build their
//! own sub-hierarchy. Capture passes run in insertion order.
//!
//! Duplicate object names get `_1`, `_2`... suffixes. Names a custom recorder
//! creates under the root are not reserved: a recorder that adds a node
//! called `cube_trans` next to a mesh renderer `cube` makes discovery fail
//! with [`Error::SessionBegin`].

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::archive::{ArchiveBackend, NodeHandle};
use crate::capture::{
    CameraAdapter, CaptureOutcome, CaptureTarget, CustomAdapter, MeshAdapter, SkinnedMeshAdapter,
    TargetKind, TransformAdapter,
};
use crate::config::RecorderConfig;
use crate::scene::{Scene, SceneNode};
use crate::util::{Error, Result};

/// Counts from one capture pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub written: usize,
    pub skipped: usize,
}

/// Hands out distinct names for children of the archive root.
#[derive(Debug, Default)]
struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    /// `name`, or `name_1`, `name_2`... if that base name was already handed
    /// out. The caller derives both the `_trans` node and the shape node from
    /// the returned base.
    fn allocate(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut n = 0;
        while self.taken.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{}", name, n);
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Ordered adapters of one session.
#[derive(Default)]
pub struct Registry {
    targets: Vec<Box<dyn CaptureTarget>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover capture targets and create their archive nodes under `root`.
    ///
    /// Kinds disabled in `config` are skipped. Any backend failure aborts
    /// discovery with [`Error::SessionBegin`].
    pub fn discover(
        scene: &dyn Scene,
        archive: &mut dyn ArchiveBackend,
        root: NodeHandle,
        config: &RecorderConfig,
    ) -> Result<Self> {
        let mut registry = Self::new();
        let mut names = NameAllocator::default();

        if config.capture_camera {
            for camera in scene.cameras() {
                registry.bind_pair(archive, root, &mut names, &camera, |archive, node| {
                    let handle = archive.add_camera(node)?;
                    let adapter: Box<dyn CaptureTarget> =
                        Box::new(CameraAdapter::new(&camera, handle));
                    Ok(adapter)
                })?;
            }
        }

        if config.capture_mesh_renderer {
            for renderer in scene.mesh_renderers() {
                registry.bind_pair(archive, root, &mut names, &renderer, |archive, node| {
                    let handle = archive.add_polymesh(node)?;
                    let adapter: Box<dyn CaptureTarget> =
                        Box::new(MeshAdapter::new(&renderer, handle));
                    Ok(adapter)
                })?;
            }
        }

        if config.capture_skinned_mesh_renderer {
            for renderer in scene.skinned_mesh_renderers() {
                registry.bind_pair(archive, root, &mut names, &renderer, |archive, node| {
                    let handle = archive.add_polymesh(node)?;
                    let adapter: Box<dyn CaptureTarget> =
                        Box::new(SkinnedMeshAdapter::new(&renderer, handle));
                    Ok(adapter)
                })?;
            }
        }

        if config.capture_custom_recorders {
            for recorder in scene.custom_recorders() {
                let adapter = CustomAdapter::new(&recorder);
                let name = adapter.name();
                recorder
                    .try_borrow_mut()
                    .map_err(|_| Error::begin(format!("custom recorder '{}' is borrowed", name)))?
                    .set_parent(archive, root)
                    .map_err(|e| Error::begin(format!("custom recorder '{}': {}", name, e)))?;
                debug!(name = adapter.name(), "bound custom recorder");
                registry.targets.push(Box::new(adapter));
            }
        }

        Ok(registry)
    }

    /// Transform node under `root`, shape node under the transform node.
    fn bind_pair<T, F>(
        &mut self,
        archive: &mut dyn ArchiveBackend,
        root: NodeHandle,
        names: &mut NameAllocator,
        target: &Rc<T>,
        make_shape: F,
    ) -> Result<()>
    where
        T: ?Sized + SceneNode + 'static,
        F: FnOnce(&mut dyn ArchiveBackend, NodeHandle) -> Result<Box<dyn CaptureTarget>>,
    {
        let name = names.allocate(&target.name());
        let fail = |e: Error| Error::begin(format!("'{}': {}", name, e));

        let trans = archive.create_object(root, &format!("{}_trans", name)).map_err(fail)?;
        let xform = archive.add_xform(trans).map_err(fail)?;
        self.targets.push(Box::new(TransformAdapter::new(target, xform)));

        let shape = archive.create_object(trans, &name).map_err(fail)?;
        let adapter = make_shape(archive, shape).map_err(fail)?;
        debug!(name = %name, kind = %adapter.kind(), "bound capture target");
        self.targets.push(adapter);
        Ok(())
    }

    /// Run every adapter once, in insertion order.
    ///
    /// Dead targets are counted and skipped; the first backend error stops
    /// the pass.
    pub fn capture_all(&mut self, archive: &mut dyn ArchiveBackend) -> Result<PassReport> {
        let mut report = PassReport::default();
        for target in &mut self.targets {
            match target.capture(archive) {
                Ok(CaptureOutcome::Written) => report.written += 1,
                Ok(CaptureOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    let what = format!("{} '{}'", target.kind(), target.name());
                    return Err(Error::capture(format!("{}: {}", what, e)));
                }
            }
        }
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Adapter kinds in capture order.
    pub fn kinds(&self) -> Vec<TargetKind> {
        self.targets.iter().map(|t| t.kind()).collect()
    }

    /// Bound object names in capture order.
    pub fn names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.targets.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::config::ArchiveConfig;
    use crate::scene::{CameraState, Mesh, MemoryScene};
    use crate::util::WorldTransform;
    use std::path::Path;

    fn root(archive: &mut MemoryArchive) -> NodeHandle {
        let ctx = archive.create_context(&ArchiveConfig::default()).unwrap();
        assert!(archive.open_archive(ctx, Path::new("r.abc")));
        archive.root_object(ctx).unwrap()
    }

    #[test]
    fn test_name_allocator() {
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate("cube"), "cube");
        assert_eq!(names.allocate("cube"), "cube_1");
        assert_eq!(names.allocate("cube"), "cube_2");
        assert_eq!(names.allocate("cube_1"), "cube_1_1");
    }

    #[test]
    fn test_duplicate_names_get_distinct_nodes() {
        let mut archive = MemoryArchive::new();
        let root = root(&mut archive);
        let mut scene = MemoryScene::new();
        scene.add_mesh_renderer("rock", WorldTransform::IDENTITY, Some(Mesh::cube()));
        scene.add_mesh_renderer("rock", WorldTransform::IDENTITY, Some(Mesh::cube()));

        let registry = Registry::discover(&scene, &mut archive, root, &RecorderConfig::default())
            .expect("discovery failed");
        assert_eq!(registry.len(), 4);

        let record = archive.archive(root.context).unwrap();
        assert!(record.find("rock_trans/rock").is_some());
        assert!(record.find("rock_1_trans/rock_1").is_some());
    }

    struct Squatter;

    impl crate::scene::CustomRecorder for Squatter {
        fn name(&self) -> String {
            "squatter".to_string()
        }

        fn set_parent(
            &mut self,
            archive: &mut dyn ArchiveBackend,
            parent: NodeHandle,
        ) -> Result<()> {
            archive.create_object(parent, "cube_trans").map(|_| ())
        }

        fn capture(&mut self, _archive: &mut dyn ArchiveBackend) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_custom_node_clashing_with_transform_node_fails_discovery() {
        let mut archive = MemoryArchive::new();
        let root = root(&mut archive);
        let mut scene = MemoryScene::new();
        scene.add_mesh_renderer("cube", WorldTransform::IDENTITY, Some(Mesh::cube()));
        scene.add_custom_recorder(Squatter);

        let config = RecorderConfig::default();
        let err = Registry::discover(&scene, &mut archive, root, &config).unwrap_err();
        match err {
            Error::SessionBegin(msg) => assert!(msg.contains("squatter"), "got {}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_disabled_kinds_are_not_discovered() {
        let mut archive = MemoryArchive::new();
        let root = root(&mut archive);
        let mut scene = MemoryScene::new();
        scene.add_camera("cam", WorldTransform::IDENTITY, CameraState::default());
        scene.add_mesh_renderer("cube", WorldTransform::IDENTITY, Some(Mesh::cube()));

        let config = RecorderConfig { capture_camera: false, ..RecorderConfig::default() };
        let registry = Registry::discover(&scene, &mut archive, root, &config).unwrap();
        assert_eq!(registry.kinds(), vec![TargetKind::Transform, TargetKind::Mesh]);
        assert_eq!(registry.names(), vec!["cube", "cube"]);
    }

    #[test]
    fn test_node_failure_is_a_begin_error() {
        let mut archive = MemoryArchive::new();
        let root = root(&mut archive);
        archive.failures_mut().objects_before_failure = Some(1);
        let mut scene = MemoryScene::new();
        scene.add_camera("cam", WorldTransform::IDENTITY, CameraState::default());

        let config = RecorderConfig::default();
        let err = Registry::discover(&scene, &mut archive, root, &config).unwrap_err();
        assert!(matches!(err, Error::SessionBegin(_)), "got {:?}", err);
    }

    #[test]
    fn test_capture_error_names_the_target() {
        let mut archive = MemoryArchive::new();
        let root = root(&mut archive);
        let mut scene = MemoryScene::new();
        scene.add_mesh_renderer("cube", WorldTransform::IDENTITY, Some(Mesh::cube()));
        let config = RecorderConfig::default();
        let mut registry = Registry::discover(&scene, &mut archive, root, &config).unwrap();

        archive.failures_mut().writes_before_failure = Some(1);
        let err = registry.capture_all(&mut archive).unwrap_err();
        match err {
            Error::Capture(msg) => assert!(msg.contains("mesh 'cube'"), "msg = {}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
