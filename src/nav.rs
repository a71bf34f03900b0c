/// Pages of the booth workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Capture,
    Upload,
    Editor,
}

/// Inter-page transitions, issued on finalize and on a missing session.
pub trait Navigator {
    fn go_to(&mut self, page: Page);
}

impl<T: Navigator + ?Sized> Navigator for &mut T {
    fn go_to(&mut self, page: Page) {
        (**self).go_to(page);
    }
}

/// Keeps every transition, for hosts that act on them later and for tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Vec<Page>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> &[Page] {
        &self.visits
    }

    pub fn last(&self) -> Option<Page> {
        self.visits.last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&mut self, page: Page) {
        tracing::debug!(?page, "navigate");
        self.visits.push(page);
    }
}

/// Logs transitions and otherwise ignores them.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn go_to(&mut self, page: Page) {
        tracing::info!(?page, "navigate");
    }
}
