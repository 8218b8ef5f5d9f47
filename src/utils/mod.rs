pub mod file;

pub use file::{FileUtils, REPORT_ENTRY_FILE, TreeEntry};
