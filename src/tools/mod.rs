//! Tools module - the tool host seam and argument handling
//!
//! Contains the tool host contract and the argument normalizer applied to
//! every tool call before execution.

pub mod args;
pub mod host;

pub use args::{clean_value, normalize_args};
pub use host::{HostResult, OfflineToolHost, ToolHost};
