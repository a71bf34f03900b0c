use std::time::Duration;

/// Fixed-interval countdown that gates a capture.
///
/// The host calls [`Countdown::tick`] once per [`Countdown::INTERVAL`]. Once started it always
/// runs to completion and fires exactly once.
#[derive(Clone, Debug)]
pub struct Countdown {
    ticks: u32,
    remaining: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownStep {
    /// Show this number.
    Show(u32),
    /// Reached zero: hide the counter and capture.
    Fire,
    /// Not running.
    Idle,
}

impl Countdown {
    pub const INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(ticks: u32) -> Self {
        Self {
            ticks: ticks.max(1),
            remaining: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Value currently displayed, if running.
    pub fn value(&self) -> Option<u32> {
        self.remaining
    }

    /// Start counting and return the first value to show. A running countdown is not restarted.
    pub fn start(&mut self) -> u32 {
        *self.remaining.get_or_insert(self.ticks)
    }

    pub fn tick(&mut self) -> CountdownStep {
        match self.remaining {
            None => CountdownStep::Idle,
            Some(n) if n > 1 => {
                self.remaining = Some(n - 1);
                CountdownStep::Show(n - 1)
            }
            Some(_) => {
                self.remaining = None;
                CountdownStep::Fire
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.remaining = None;
    }
}
