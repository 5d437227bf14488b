//! Built-in Tools
//!
//! The fixed set of local filesystem capabilities exposed to the model.
//! The web-search tool lives in tinker-runtime with its HTTP client.

pub mod fs;

pub use fs::{CreateFileTool, CreateFolderTool, ListFilesTool, ReadFileTool, WriteFileTool};
