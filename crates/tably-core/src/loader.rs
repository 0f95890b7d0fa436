use std::time::Duration;

/// Status lines rotated while a request is in flight
pub const LOADER_MESSAGES: [&str; 5] = [
    "🍳 Cooking up your report...",
    "🧾 Checking your receipts...",
    "🧠 Thinking really hard...",
    "🍽️ Plating your data...",
    "🔍 Looking into the kitchen...",
];

pub const DEFAULT_LOADER_INTERVAL: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderTransition {
    Started,
    Stopped,
}

/// Cosmetic busy indicator. Tracks whether it is showing and which line is current;
/// the timer that advances it lives with the front-end.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    frame: usize,
    active: bool,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align with the conversation's busy flag. Restarts from the first line on every activation.
    pub fn sync(&mut self, busy: bool) -> Option<LoaderTransition> {
        match (self.active, busy) {
            (false, true) => {
                self.active = true;
                self.frame = 0;
                Some(LoaderTransition::Started)
            }
            (true, false) => {
                self.active = false;
                Some(LoaderTransition::Stopped)
            }
            _ => None,
        }
    }

    pub fn advance(&mut self) {
        if self.active {
            self.frame = (self.frame + 1) % LOADER_MESSAGES.len();
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        self.active.then(|| LOADER_MESSAGES[self.frame])
    }
}
