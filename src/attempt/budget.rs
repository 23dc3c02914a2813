//! Wire-size accounting for a `PutLogEvents` batch.
//!
//! The service limits a batch to 1,048,576 bytes, counted as the UTF-8 size
//! of every message plus 26 bytes per event. The 8-byte timestamp is counted
//! on top of that.

pub const MAX_BATCH_SIZE: usize = 1024 * 1024;
pub const EVENT_STORAGE_OVERHEAD: usize = 26;
pub const TIMESTAMP_BYTES: usize = 8;

/// Serialized size of one event carrying `message`.
pub fn event_size(message: &str) -> usize {
    message.len() + TIMESTAMP_BYTES + EVENT_STORAGE_OVERHEAD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    CapReached,
}

#[derive(Debug, Clone)]
pub struct BatchBudget {
    cap: usize,
    used: usize,
}

impl Default for BatchBudget {
    fn default() -> Self {
        Self::with_cap(MAX_BATCH_SIZE)
    }
}

impl BatchBudget {
    pub fn with_cap(cap: usize) -> Self {
        Self { cap, used: 0 }
    }

    /// Reserve `size` bytes. A rejected request leaves the budget untouched.
    pub fn admit(&mut self, size: usize) -> Admission {
        match self.used.checked_add(size) {
            Some(total) if total <= self.cap => {
                self.used = total;
                Admission::Accepted
            }
            _ => Admission::CapReached,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_size_counts_utf8_bytes() {
        assert_eq!(event_size(""), 34);
        assert_eq!(event_size("abc"), 37);
        // two bytes each in UTF-8
        assert_eq!(event_size("éé"), 38);
    }

    #[test]
    fn test_admit_until_full() {
        let mut budget = BatchBudget::with_cap(100);

        assert_eq!(budget.admit(60), Admission::Accepted);
        assert_eq!(budget.admit(40), Admission::Accepted);
        assert_eq!(budget.used(), 100);
        assert_eq!(budget.admit(1), Admission::CapReached);
    }

    #[test]
    fn test_rejection_does_not_mutate() {
        let mut budget = BatchBudget::with_cap(100);
        budget.admit(70);

        assert_eq!(budget.admit(31), Admission::CapReached);
        assert_eq!(budget.used(), 70);
        assert_eq!(budget.admit(30), Admission::Accepted);
    }

    #[test]
    fn test_default_cap() {
        let mut budget = BatchBudget::default();

        assert_eq!(budget.cap(), 1_048_576);
        assert_eq!(budget.admit(MAX_BATCH_SIZE + 1), Admission::CapReached);
        assert_eq!(budget.admit(usize::MAX), Admission::CapReached);
        assert_eq!(budget.admit(MAX_BATCH_SIZE), Admission::Accepted);
    }
}
