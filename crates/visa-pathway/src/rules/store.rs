use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::info;

use super::table::RuleSnapshot;

/// Process-wide holder of the active rule snapshot.
///
/// Readers load the current `Arc` without locking, so a diagnosis keeps working against the
/// snapshot it started with even if a reload publishes a newer one meanwhile.
#[derive(Debug, Default)]
pub struct RuleTableStore {
    current: ArcSwapOption<RuleSnapshot>,
}

impl RuleTableStore {
    /// Store with no snapshot; diagnoses report the service as not ready until one is published.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RuleSnapshot) -> Self {
        Self {
            current: ArcSwapOption::from_pointee(snapshot),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<RuleSnapshot>> {
        self.current.load_full()
    }

    pub fn version(&self) -> Option<String> {
        self.snapshot()
            .map(|snapshot| snapshot.version().to_string())
    }

    /// Replace the whole snapshot in one step, returning the version it superseded.
    pub fn publish(&self, snapshot: RuleSnapshot) -> Option<String> {
        let next = Arc::new(snapshot);
        let previous = self.current.swap(Some(next.clone()));
        let previous_version = previous.map(|snapshot| snapshot.version().to_string());

        info!(
            previous = previous_version.as_deref().unwrap_or("none"),
            current = next.version(),
            "rule table snapshot published"
        );

        previous_version
    }
}
