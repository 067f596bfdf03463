pub mod descriptor;
pub mod error;
pub mod mcp;
pub mod native;
pub mod registry;
pub mod traits;

// Re-export common types
pub use descriptor::{ParamType, ToolDescriptor};
pub use error::{RegistryError, ToolError, ToolResult};
pub use registry::{RegisteredCollection, ToolRegistry};
pub use traits::{ToolCollection, ToolOutput};
