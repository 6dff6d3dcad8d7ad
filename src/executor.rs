pub mod job;
pub mod manager;

pub use job::{Submission, SubmittedJob};
pub use manager::{quote, shell, shell_checked, ShellOutput};
