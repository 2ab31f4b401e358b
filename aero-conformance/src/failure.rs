use std::fmt;
use std::path::PathBuf;

use crate::pipeline::DataItem;

/// Step of the pipeline where a message gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Append,
    Fetch(DataItem),
    Write(DataItem),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Append => f.write_str("append"),
            Self::Fetch(item) => write!(f, "fetch {}", item.extension()),
            Self::Write(item) => write!(f, "write {}", item.extension()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: PathBuf,
    pub index: usize,
    pub stage: Stage,
    pub reason: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.message.display(),
            self.stage,
            self.reason
        )
    }
}

/// Failures of one session, and the sequence number prediction they drive.
///
/// A message gets sequence number `index + 1 - failures`, whatever step the
/// earlier failures gave up at.
#[derive(Debug, Default)]
pub struct FailureTracker {
    failures: Vec<Failure>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the message at `index`, assuming it was just
    /// appended.
    pub fn next_sequence(&self, index: usize) -> u32 {
        (index as u32 + 1).saturating_sub(self.failures.len() as u32)
    }

    pub fn record(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub fn count(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(index: usize, stage: Stage) -> Failure {
        Failure {
            message: PathBuf::from(format!("{}.eml", index)),
            index,
            stage,
            reason: "NO refused".into(),
        }
    }

    #[test]
    fn prediction_without_failure() {
        let tracker = FailureTracker::new();
        assert_eq!(tracker.next_sequence(0), 1);
        assert_eq!(tracker.next_sequence(41), 42);
    }

    #[test]
    fn rejected_append_does_not_consume_a_number() {
        let mut tracker = FailureTracker::new();
        let mut seqs = vec![];
        for index in 0..5 {
            if index == 2 {
                tracker.record(failure(index, Stage::Append));
                seqs.push(None);
            } else {
                seqs.push(Some(tracker.next_sequence(index)));
            }
        }
        assert_eq!(seqs, vec![Some(1), Some(2), None, Some(3), Some(4)]);
        assert_eq!(tracker.count(), 1);
    }

    #[test]
    fn every_failure_offsets_later_messages() {
        let mut tracker = FailureTracker::new();
        tracker.record(failure(0, Stage::Fetch(DataItem::Body)));
        assert_eq!(tracker.next_sequence(1), 1);

        tracker.record(failure(1, Stage::Write(DataItem::BodyStructure)));
        assert_eq!(tracker.next_sequence(2), 1);

        tracker.record(failure(2, Stage::Read));
        assert_eq!(tracker.next_sequence(3), 1);
        assert_eq!(tracker.next_sequence(5), 3);
        assert_eq!(tracker.count(), 3);
    }

    #[test]
    fn display() {
        let f = failure(3, Stage::Fetch(DataItem::BodyStructure));
        assert_eq!(f.to_string(), "3.eml (fetch bodystructure): NO refused");
    }
}
