//! 每个宿主对象自动登记的内置工具

pub mod memory;

pub use memory::{MemoriesOverviewTool, ReadMemoryTool};
