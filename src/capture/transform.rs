//! World transform adapter.

use std::rc::{Rc, Weak};

use super::{CaptureOutcome, CaptureTarget, TargetKind};
use crate::archive::{ArchiveBackend, XformHandle, XformSampleData};
use crate::scene::SceneNode;
use crate::util::{Result, WorldTransform};

/// Sample for a baked world transform.
///
/// Hierarchy is flattened on capture, so samples never inherit the parent.
pub fn xform_sample(transform: &WorldTransform) -> XformSampleData {
    let (rotation_angle, rotation_axis) = transform.angle_axis();
    XformSampleData {
        translation: transform.position,
        scale: transform.lossy_scale,
        rotation_angle,
        rotation_axis,
        inherits: false,
    }
}

/// Captures the world transform of any scene node.
///
/// Generic over the node trait object so one adapter serves cameras,
/// renderers and anything else implementing [`SceneNode`].
pub struct TransformAdapter<T: ?Sized + SceneNode> {
    target: Weak<T>,
    xform: XformHandle,
    name: String,
}

impl<T: ?Sized + SceneNode> TransformAdapter<T> {
    pub fn new(target: &Rc<T>, xform: XformHandle) -> Self {
        Self {
            target: Rc::downgrade(target),
            xform,
            name: target.name(),
        }
    }
}

impl<T: ?Sized + SceneNode> CaptureTarget for TransformAdapter<T> {
    fn kind(&self) -> TargetKind {
        TargetKind::Transform
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> Result<CaptureOutcome> {
        let Some(target) = self.target.upgrade() else {
            return Ok(CaptureOutcome::Skipped);
        };
        let sample = xform_sample(&target.world_transform());
        archive.write_xform_sample(self.xform, &sample)?;
        Ok(CaptureOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::memory::SampleValue;
    use crate::archive::MemoryArchive;
    use crate::config::ArchiveConfig;
    use crate::scene::{MemoryScene, Scene, CameraState};
    use crate::util::{Quat, Vec3};
    use std::path::Path;

    #[test]
    fn test_xform_sample_is_world_space_and_non_inheriting() {
        let t = WorldTransform::from_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_x(std::f32::consts::PI),
            Vec3::new(2.0, 2.0, 0.5),
        );
        let s = xform_sample(&t);
        assert!(!s.inherits);
        assert_eq!(s.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.scale, Vec3::new(2.0, 2.0, 0.5));
        assert!((s.rotation_angle - 180.0).abs() < 1e-3);
        assert!((s.rotation_axis - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_dead_target_skips_without_backend_calls() {
        let mut archive = MemoryArchive::new();
        let ctx = archive.create_context(&ArchiveConfig::default()).unwrap();
        assert!(archive.open_archive(ctx, Path::new("t.abc")));
        let root = archive.root_object(ctx).unwrap();
        let node = archive.create_object(root, "cam_trans").unwrap();
        let xform = archive.add_xform(node).unwrap();

        let mut scene = MemoryScene::new();
        scene.add_camera("cam", WorldTransform::IDENTITY, CameraState::default());
        let mut adapter = TransformAdapter::new(&scene.cameras()[0], xform);

        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Written);
        let calls_before = archive.calls().len();

        scene.destroy("cam");
        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Skipped);
        assert_eq!(archive.calls().len(), calls_before);

        let record = archive.archive(ctx).unwrap();
        let samples = &record.find("cam_trans").unwrap().samples;
        assert_eq!(samples.len(), 1);
        assert!(matches!(samples[0].value, SampleValue::Xform(_)));
    }
}
