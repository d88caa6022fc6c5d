//! Two-phase frame protocol.
//!
//! Sampling in the middle of a frame would record whatever half-updated
//! state the host happens to be in. Each [`FrameLoop::step`] therefore runs
//! in two phases:
//!
//! 1. **update** - every listener sees the frame's delta time; hosts move
//!    objects, evaluate skinning, render.
//! 2. **end of frame** - every listener's continuation runs, in order,
//!    after all updates finished. [`SessionDriver`] captures here.

use tracing::trace;

use crate::archive::ArchiveBackend;
use crate::session::{FrameReport, RecordingSession};
use crate::util::Result;

/// Participant in the frame loop.
pub trait FrameListener {
    /// Phase 1.
    fn update(&mut self, _delta_time: f64) {}

    /// Phase 2, after every listener's `update` for this frame.
    fn end_of_frame(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Host frame clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameLoop {
    frame: u64,
    elapsed: f64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sum of all delta times stepped.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Run one frame over `listeners`. The first end-of-frame error stops
    /// the remaining continuations and is returned; the frame still counts.
    pub fn step(
        &mut self,
        delta_time: f64,
        listeners: &mut [&mut dyn FrameListener],
    ) -> Result<()> {
        trace!(frame = self.frame, delta_time, "frame update");
        for listener in listeners.iter_mut() {
            listener.update(delta_time);
        }
        self.frame += 1;
        self.elapsed += delta_time;
        for listener in listeners.iter_mut() {
            listener.end_of_frame()?;
        }
        Ok(())
    }
}

/// Feeds a [`RecordingSession`] from the frame loop.
///
/// `update` only books the delta time while recording; the capture itself
/// is deferred to `end_of_frame`. Nothing is scheduled while idle, so the
/// session is never advanced outside a recording.
pub struct SessionDriver<A: ArchiveBackend> {
    session: RecordingSession<A>,
    pending: Option<f64>,
    last_report: Option<FrameReport>,
}

impl<A: ArchiveBackend> SessionDriver<A> {
    pub fn new(session: RecordingSession<A>) -> Self {
        Self { session, pending: None, last_report: None }
    }

    pub fn session(&self) -> &RecordingSession<A> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut RecordingSession<A> {
        &mut self.session
    }

    /// Report of the most recent capture pass.
    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }

    /// Whether a capture is scheduled for the end of this frame.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<A: ArchiveBackend> FrameListener for SessionDriver<A> {
    fn update(&mut self, delta_time: f64) {
        if self.session.is_recording() {
            *self.pending.get_or_insert(0.0) += delta_time;
        }
    }

    fn end_of_frame(&mut self) -> Result<()> {
        let Some(delta_time) = self.pending.take() else {
            return Ok(());
        };
        if !self.session.is_recording() {
            return Ok(());
        }
        self.last_report = Some(self.session.advance(delta_time)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::memory::SampleValue;
    use crate::archive::MemoryArchive;
    use crate::config::RecorderConfig;
    use crate::scene::{Mesh, MemoryScene};
    use crate::util::{Vec3, WorldTransform};

    /// Moves "cube" to x = frame index during update.
    struct Mover<'a> {
        scene: &'a MemoryScene,
        x: f32,
    }

    impl FrameListener for Mover<'_> {
        fn update(&mut self, _delta_time: f64) {
            self.x += 1.0;
            let position = Vec3::new(self.x, 0.0, 0.0);
            let t = WorldTransform::from_trs(position, Default::default(), Vec3::ONE);
            self.scene.set_transform("cube", t);
        }
    }

    #[test]
    fn test_capture_sees_updates_from_later_listeners() {
        let mut scene = MemoryScene::new();
        scene.add_mesh_renderer("cube", WorldTransform::IDENTITY, Some(Mesh::cube()));

        let mut session = RecordingSession::new(MemoryArchive::new(), RecorderConfig::new("f.abc"));
        assert!(session.begin(&scene));
        let mut driver = SessionDriver::new(session);
        let mut mover = Mover { scene: &scene, x: 0.0 };
        let mut frames = FrameLoop::new();

        // Driver is registered before the mover, yet samples the moved state.
        for _ in 0..3 {
            frames.step(0.5, &mut [&mut driver, &mut mover]).unwrap();
        }
        assert_eq!(frames.frame(), 3);
        assert!(!driver.is_pending());
        assert_eq!(driver.last_report().unwrap().time, 1.5);

        let record = driver.session().archive().last_archive().unwrap();
        let xs: Vec<f32> = record
            .find("cube_trans")
            .unwrap()
            .samples
            .iter()
            .map(|s| match &s.value {
                SampleValue::Xform(x) => x.translation.x,
                other => panic!("unexpected sample {:?}", other),
            })
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_idle_session_is_never_advanced() {
        let session = RecordingSession::new(MemoryArchive::new(), RecorderConfig::new("f.abc"));
        let mut driver = SessionDriver::new(session);
        let mut frames = FrameLoop::new();
        frames.step(0.1, &mut [&mut driver]).unwrap();
        assert!(driver.last_report().is_none());
        assert!(driver.session().archive().calls().is_empty());
        assert!((frames.elapsed() - 0.1).abs() < 1e-12);
    }
}
