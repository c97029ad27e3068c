use tally::Outcome;

pub mod evaluate;
pub mod tables;
pub mod usage;

/// Result of a command as seen by the caller of the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The job was rejected, the submit hook must refuse it.
    Rejected,
}

impl CommandStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::Rejected => 1,
        }
    }
}

impl From<&Outcome> for CommandStatus {
    fn from(outcome: &Outcome) -> Self {
        if outcome.is_rejected() {
            CommandStatus::Rejected
        } else {
            CommandStatus::Success
        }
    }
}
