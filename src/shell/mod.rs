//! Subprocess execution and source tree edits.

pub mod cancel;
pub mod command;
pub mod driver;
pub mod patch;

pub use cancel::CancellationToken;
pub use command::{execute, CommandOptions, CommandResult, OutputCallback, OutputLine};
pub use driver::{CommandRunner, DriveReport, ProcessDriver, StepRecord, SystemRunner};
pub use patch::{apply_patches, AppendSpec, FileAppend, Patch, PatchEdit, PatchSummary};
