//! CLI commands

mod bump;
mod completions;
mod graph;
mod init;

pub use bump::BumpCommand;
pub use completions::CompletionsCommand;
pub use graph::GraphCommand;
pub use init::InitCommand;
