//! Process exit codes shared by every `migrate` subcommand.
//!
//! `0` success, `1` error, `2` "ran fine, nothing to do" -- the third
//! code lets scripts distinguish "already up to date" from a real
//! failure without parsing output.

/// Outcome of a subcommand that ran to completion without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation did something.
    Success,
    /// The operation found nothing to do (no pending migrations to
    /// apply, none applied to revert).
    NothingToDo
}

impl Outcome {
    /// The process exit code for this outcome.
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NothingToDo => 2
        }
    }
}
