//! Post-checkout navigation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Returns the customer to the landing page.
pub trait Navigator: Send + Sync + 'static {
    fn navigate_home(&self);
}

/// Navigator that only counts how often it was asked to go home.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    home_visits: Arc<AtomicUsize>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `navigate_home` has run.
    pub fn home_visits(&self) -> usize {
        self.home_visits.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_home(&self) {
        self.home_visits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Navigates home once `delay` has elapsed.
///
/// Must be called from within a Tokio runtime.
pub fn schedule_home(navigator: Arc<dyn Navigator>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        tracing::debug!(delay_secs = delay.as_secs(), "returning to landing page");
        navigator.navigate_home();
    })
}
