use std::collections::HashSet;

/// (criterion, serial) pairs already notified. Entries never expire.
#[derive(Debug, Default)]
pub struct AlertLedger {
    sent: HashSet<(String, String)>,
}

impl AlertLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn already_sent(&self, criterion: &str, serial: &str) -> bool {
        self.sent.contains(&(criterion.to_string(), serial.to_string()))
    }

    /// Returns `true` if the pair was not already recorded.
    pub fn mark_sent(&mut self, criterion: &str, serial: &str) -> bool {
        self.sent.insert((criterion.to_string(), serial.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }
}
