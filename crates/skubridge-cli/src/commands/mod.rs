pub mod bulk;
pub mod common;
pub mod completions;
pub mod config;
pub mod logs;
pub mod populate;
pub mod preview;
pub mod push;
pub mod queue;
