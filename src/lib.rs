//! # Alembic Recorder
//!
//! Records a live scene into an Alembic archive one frame at a time.
//!
//! A [`RecordingSession`](session::RecordingSession) discovers capturable
//! objects once when it begins, binds each one to a shape in the archive,
//! and then pushes one sample per object every time it is advanced. The
//! archive writer and the scene are both capabilities supplied by the host:
//!
//! - [`archive::ArchiveBackend`] - contexts, hierarchy, typed samples
//! - [`scene::Scene`] - enumeration of cameras, mesh renderers, skinned
//!   mesh renderers and custom recorders
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`config`] - Recorder and pass-through archive configuration
//! - [`archive`] - Archive capability and an in-memory backend
//! - [`scene`] - Host scene capability and an in-memory scene
//! - [`capture`] - Per-kind capture adapters
//! - [`registry`] - Discovery and ordered capture passes
//! - [`session`] - Recording state machine
//! - [`frame`] - Two-phase frame loop and session driver
//!
//! ## Example
//!
//! ```
//! use alembic_recorder::prelude::*;
//!
//! let mut scene = MemoryScene::new();
//! scene.add_mesh_renderer("cube", WorldTransform::IDENTITY, Some(Mesh::cube()));
//!
//! let mut session = RecordingSession::new(MemoryArchive::new(), RecorderConfig::new("cube.abc"));
//! assert!(session.begin(&scene));
//! for _ in 0..10 {
//!     session.advance(1.0 / 30.0)?;
//! }
//! session.end();
//! assert_eq!(session.stats().frames, 10);
//! # Ok::<(), alembic_recorder::Error>(())
//! ```

pub mod util;
pub mod config;
pub mod archive;
pub mod scene;
pub mod capture;
pub mod registry;
pub mod session;
pub mod frame;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Quat, Vec3, WorldTransform};
    pub use crate::config::{ArchiveConfig, RecorderConfig};
    pub use crate::archive::{ArchiveBackend, MemoryArchive};
    pub use crate::scene::{CameraState, CustomRecorder, Mesh, MemoryScene, Scene};
    pub use crate::capture::{CaptureOutcome, CaptureTarget, TargetKind};
    pub use crate::registry::Registry;
    pub use crate::session::{FrameReport, RecordingSession, SessionState};
    pub use crate::frame::{FrameListener, FrameLoop, SessionDriver};
}
