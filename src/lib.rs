pub mod agent;
pub mod alive;
pub mod config;
pub mod doc;
pub mod error;
pub mod llm;
pub mod memory;
pub mod testing;
pub mod tools;

pub mod prelude {
    pub use crate::agent::{AgentArgs, AgentSpec, OutputSpec};
    pub use crate::alive::{Alive, AliveBuilder};
    pub use crate::error::{AliveError, Result};
    pub use crate::memory::{AliveField, MemoryStore};
    pub use crate::tools::{
        Selector, Tag, Tool, ToolOptions, ToolParameters, ToolRegistry, ToolRequest, ToolResult,
    };
}
