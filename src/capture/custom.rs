//! Adapter for user-supplied recorders.

use std::rc::{Rc, Weak};
use std::cell::RefCell;

use super::{CaptureOutcome, CaptureTarget, TargetKind};
use crate::archive::ArchiveBackend;
use crate::scene::{CustomRecorder, CustomRecorderRef};
use crate::util::{Error, Result};

/// Forwards each pass to a [`CustomRecorder`] that already received its
/// parent node.
pub struct CustomAdapter {
    target: Weak<RefCell<dyn CustomRecorder>>,
    name: String,
}

impl CustomAdapter {
    pub fn new(target: &CustomRecorderRef) -> Self {
        let name = target.borrow().name();
        Self { target: Rc::downgrade(target), name }
    }
}

impl CaptureTarget for CustomAdapter {
    fn kind(&self) -> TargetKind {
        TargetKind::Custom
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> Result<CaptureOutcome> {
        let Some(target) = self.target.upgrade() else {
            return Ok(CaptureOutcome::Skipped);
        };
        let mut recorder = target
            .try_borrow_mut()
            .map_err(|_| {
                Error::capture(format!("custom recorder '{}' is already borrowed", self.name))
            })?;
        recorder.capture(archive)?;
        Ok(CaptureOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{MemoryArchive, NodeHandle};

    struct Counter {
        captures: usize,
    }

    impl CustomRecorder for Counter {
        fn name(&self) -> String {
            "counter".to_string()
        }

        fn set_parent(
            &mut self,
            _archive: &mut dyn ArchiveBackend,
            _parent: NodeHandle,
        ) -> Result<()> {
            Ok(())
        }

        fn capture(&mut self, _archive: &mut dyn ArchiveBackend) -> Result<()> {
            self.captures += 1;
            Ok(())
        }
    }

    #[test]
    fn test_forwards_until_dropped() {
        let mut archive = MemoryArchive::new();
        let counter = Rc::new(RefCell::new(Counter { captures: 0 }));
        let erased: CustomRecorderRef = counter.clone();
        let mut adapter = CustomAdapter::new(&erased);
        drop(erased);
        assert_eq!(adapter.name(), "counter");

        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Written);
        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Written);
        assert_eq!(counter.borrow().captures, 2);

        drop(counter);
        assert_eq!(adapter.capture(&mut archive).unwrap(), CaptureOutcome::Skipped);
    }
}
