//! Per-process duplicate suppression.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::common::types::SourceMessage;

/// Remembers which inbound messages were already admitted.
///
/// Not persisted: a restart forgets everything. Marking happens synchronously,
/// before the caller reaches its first `.await`.
#[derive(Debug, Default)]
pub struct DuplicateGuard {
    seen: Mutex<HashSet<SourceMessage>>,
}

impl DuplicateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time a message is offered, `false` afterwards.
    pub fn should_process(&self, key: SourceMessage) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.insert(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }
}
