//! Recording session state machine.
//!
//! ```text
//!            begin (ok)
//!   Idle ─────────────────► Recording ──┐
//!    ▲  ▲                      │        │ advance
//!    │  └── begin (error)      │ ◄──────┘
//!    └─────────────────────────┘
//!               end
//! ```
//!
//! The session exclusively owns one archive context while recording.
//! Adapters only ever see the shape handles they were bound to.

use tracing::{info, trace, warn};

use crate::archive::{ArchiveBackend, ContextHandle};
use crate::config::RecorderConfig;
use crate::registry::Registry;
use crate::scene::Scene;
use crate::util::{Error, Result};

/// Lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
}

/// Outcome of one [`RecordingSession::advance`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Time cursor after the frame.
    pub time: f64,
    pub written: usize,
    pub skipped: usize,
}

/// Totals since the last successful begin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub samples_written: u64,
    pub samples_skipped: u64,
}

/// Drives one archive from discovery to close.
pub struct RecordingSession<A: ArchiveBackend> {
    archive: A,
    config: RecorderConfig,
    /// `Some` iff recording.
    context: Option<ContextHandle>,
    registry: Registry,
    time: f64,
    stats: SessionStats,
}

impl<A: ArchiveBackend> RecordingSession<A> {
    pub fn new(archive: A, config: RecorderConfig) -> Self {
        Self {
            archive,
            config,
            context: None,
            registry: Registry::new(),
            time: 0.0,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.context.is_some() {
            SessionState::Recording
        } else {
            SessionState::Idle
        }
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.context.is_some()
    }

    /// Time cursor of the current (or last) recording.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Replace the configuration used by the next begin.
    pub fn set_config(&mut self, config: RecorderConfig) -> Result<()> {
        if self.is_recording() {
            return Err(Error::config("cannot reconfigure while recording"));
        }
        self.config = config;
        Ok(())
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn archive_mut(&mut self) -> &mut A {
        &mut self.archive
    }

    /// Start recording `scene`. Failures are logged and leave the session idle.
    pub fn begin(&mut self, scene: &dyn Scene) -> bool {
        match self.try_begin(scene) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.config.path.display(), "failed to begin recording: {}", e);
                false
            }
        }
    }

    /// Start recording `scene`, returning the typed error on failure.
    ///
    /// Already recording is not an error: nothing is re-created.
    pub fn try_begin(&mut self, scene: &dyn Scene) -> Result<()> {
        if self.is_recording() {
            return Ok(());
        }

        let context = self
            .archive
            .create_context(&self.config.archive)
            .ok_or(Error::ContextCreation)?;

        if !self.archive.open_archive(context, &self.config.path) {
            self.archive.destroy_context(context);
            return Err(Error::ArchiveOpen { path: self.config.path.clone() });
        }

        let registry = self
            .archive
            .root_object(context)
            .map_err(|e| Error::begin(format!("root object: {}", e)))
            .and_then(|root| Registry::discover(scene, &mut self.archive, root, &self.config));
        let registry = match registry {
            Ok(registry) => registry,
            Err(e) => {
                self.archive.destroy_context(context);
                return Err(e);
            }
        };

        info!(
            path = %self.config.path.display(),
            targets = registry.len(),
            "recording started"
        );
        self.registry = registry;
        self.context = Some(context);
        self.time = 0.0;
        self.stats = SessionStats::default();
        Ok(())
    }

    /// Stop recording and release the archive context. Samples written so
    /// far stay in the archive. The registry is kept until the next begin.
    pub fn end(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        self.archive.destroy_context(context);
        info!(
            path = %self.config.path.display(),
            frames = self.stats.frames,
            samples = self.stats.samples_written,
            "recording finished"
        );
    }

    /// Capture one frame `delta_time` seconds after the previous one.
    ///
    /// Call once per host frame after the frame's updates are done. A no-op
    /// while idle. A backend failure ends the session and is returned as
    /// [`Error::Capture`].
    pub fn advance(&mut self, delta_time: f64) -> Result<FrameReport> {
        let Some(context) = self.context else {
            return Ok(FrameReport { time: self.time, ..FrameReport::default() });
        };
        let _span = tracing::info_span!("capture_frame", frame = self.stats.frames).entered();

        // Negative or NaN steps would move the cursor backwards.
        let step = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        self.time += step;

        let pass = self
            .archive
            .set_time(context, self.time)
            .map_err(|e| Error::capture(format!("set time {}: {}", self.time, e)))
            .and_then(|()| self.registry.capture_all(&mut self.archive));
        let pass = match pass {
            Ok(pass) => pass,
            Err(e) => {
                warn!(time = self.time, "capture failed, ending session: {}", e);
                self.end();
                return Err(e);
            }
        };

        self.stats.frames += 1;
        self.stats.samples_written += pass.written as u64;
        self.stats.samples_skipped += pass.skipped as u64;
        trace!(time = self.time, written = pass.written, skipped = pass.skipped, "frame captured");
        Ok(FrameReport {
            time: self.time,
            written: pass.written,
            skipped: pass.skipped,
        })
    }
}

impl<A: ArchiveBackend> Drop for RecordingSession<A> {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::scene::MemoryScene;

    #[test]
    fn test_empty_path_is_refused_by_backend() {
        let mut session = RecordingSession::new(MemoryArchive::new(), RecorderConfig::new(""));
        let err = session.try_begin(&MemoryScene::new()).unwrap_err();
        assert!(matches!(err, Error::ArchiveOpen { .. }));
        assert_eq!(session.archive().destroy_count(), 1);
        assert_eq!(session.archive().live_contexts(), 0);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_archive_settings_passed_through_uninterpreted() {
        let mut config = RecorderConfig::new("a.abc");
        config.archive.frame_rate = 0.0;
        config.archive.scale = -2.0;
        let mut session = RecordingSession::new(MemoryArchive::new(), config);
        assert!(session.begin(&MemoryScene::new()));
        let archive = session.archive().last_archive().expect("archive opened");
        assert_eq!(archive.config.frame_rate, 0.0);
        assert_eq!(archive.config.scale, -2.0);
    }

    #[test]
    fn test_set_config_rejected_while_recording() {
        let mut session = RecordingSession::new(MemoryArchive::new(), RecorderConfig::new("a.abc"));
        assert!(session.begin(&MemoryScene::new()));
        assert!(session.set_config(RecorderConfig::new("b.abc")).is_err());
        session.end();
        assert!(session.set_config(RecorderConfig::new("b.abc")).is_ok());
        assert_eq!(session.config().path, std::path::PathBuf::from("b.abc"));
    }

    #[test]
    fn test_negative_delta_does_not_rewind() {
        let mut session = RecordingSession::new(MemoryArchive::new(), RecorderConfig::new("a.abc"));
        assert!(session.begin(&MemoryScene::new()));
        session.advance(0.5).unwrap();
        session.advance(-1.0).unwrap();
        session.advance(f64::NAN).unwrap();
        assert_eq!(session.time(), 0.5);
        assert_eq!(session.stats().frames, 3);
    }

    #[test]
    fn test_drop_releases_context() {
        let mut archive = MemoryArchive::new();
        {
            let mut session = RecordingSession::new(&mut archive, RecorderConfig::new("a.abc"));
            assert!(session.begin(&MemoryScene::new()));
        }
        assert_eq!(archive.live_contexts(), 0);
        assert_eq!(archive.destroy_count(), 1);
    }
}
