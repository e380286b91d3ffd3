use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub provider: String,
    pub message: String,
}

/// Failures of providers never fail the evaluation, they are buffered here and
/// shown once the evaluation is done.
#[derive(Clone, Debug, Default)]
pub struct DiscoveryLog {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl DiscoveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, provider: &str, message: impl Into<String>) {
        let message = message.into();
        debug!(message = "Discovery failure recorded", provider, reason = %message);

        self.lock().push(Entry {
            provider: provider.to_string(),
            message,
        });
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Replay and clear the buffered entries.
    pub fn flush(&self) {
        let entries = std::mem::take(&mut *self.lock());
        if entries.is_empty() {
            return;
        }

        warn!(message = "Errors:");
        for entry in entries {
            warn!(message = %entry.message, provider = %entry.provider);
        }
    }
}
