//! Camera adapter.
//!
//! Hosts describe cameras by vertical field of view and film height; the
//! archive wants a physical lens. Focal length is solved from
//! `fov = 2 * atan(vertical_aperture / (2 * focal_length / 10))`.

use std::rc::{Rc, Weak};

use super::{CaptureOutcome, CaptureTarget, TargetKind};
use crate::archive::{ArchiveBackend, CameraHandle, CameraSampleData};
use crate::scene::{CameraState, CameraTarget};
use crate::util::Result;

const MIN_FOV: f32 = 1e-3;
const MAX_FOV: f32 = 179.0;

/// Convert host camera state to an archive sample.
pub fn camera_sample(state: &CameraState) -> CameraSampleData {
    let fov = state.field_of_view.clamp(MIN_FOV, MAX_FOV);
    let half = (fov.to_radians() * 0.5).tan();
    let vertical_aperture = state.vertical_aperture;
    let focal_length = 10.0 * vertical_aperture / (2.0 * half);
    CameraSampleData {
        focal_length,
        horizontal_aperture: vertical_aperture * state.aspect,
        vertical_aperture,
        near_clipping_plane: state.near_clip,
        far_clipping_plane: state.far_clip,
        focus_distance: state.focus_distance,
        field_of_view: fov,
        aspect_ratio: state.aspect,
    }
}

/// Captures lens parameters of a camera.
pub struct CameraAdapter {
    target: Weak<dyn CameraTarget>,
    camera: CameraHandle,
    name: String,
}

impl CameraAdapter {
    pub fn new(target: &Rc<dyn CameraTarget>, camera: CameraHandle) -> Self {
        Self {
            target: Rc::downgrade(target),
            camera,
            name: target.name(),
        }
    }
}

impl CaptureTarget for CameraAdapter {
    fn kind(&self) -> TargetKind {
        TargetKind::Camera
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> Result<CaptureOutcome> {
        let Some(target) = self.target.upgrade() else {
            return Ok(CaptureOutcome::Skipped);
        };
        archive.write_camera_sample(self.camera, &camera_sample(&target.camera_state()))?;
        Ok(CaptureOutcome::Written)
    }
}
