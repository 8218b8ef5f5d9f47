pub mod args;

pub use args::{ArchiveArgs, Cli, Commands, IngestArgs, InitConfigArgs};
