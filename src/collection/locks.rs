use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Per-subject single-flight registry for full preloads.
///
/// Shared between every engine that touches the same store, so that at most
/// one preload per subject runs in the process.
#[derive(Debug, Default)]
pub struct PreloadLocks {
    active: Mutex<HashSet<String>>,
}

impl PreloadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `subject` as preloading, or return `None` if it already is.
    pub fn try_acquire(&self, subject: &str) -> Option<PreloadGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.insert(subject.to_string()) {
            Some(PreloadGuard {
                locks: self,
                subject: subject.to_string(),
            })
        } else {
            None
        }
    }

    pub fn is_locked(&self, subject: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(subject)
    }

    fn release(&self, subject: &str) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subject);
    }
}

/// Releases the subject's lock when dropped, on every exit path.
#[derive(Debug)]
pub struct PreloadGuard<'a> {
    locks: &'a PreloadLocks,
    subject: String,
}

impl Drop for PreloadGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.subject);
    }
}
