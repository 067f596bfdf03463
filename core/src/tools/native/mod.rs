//! In-process tool collections
//!
//! - `project`: Maven analysis and migration planning
//! - `transform`: wrappers around the external code-transformation CLI
pub mod project;
pub mod transform;

pub use project::{ProjectTools, ANALYZE_PROJECT, MIGRATION_PLAN};
pub use transform::{
    TransformCliConfig, TransformTools, MOD_APPLY_UPGRADE_ALL, MOD_BUILD_ALL, MOD_UPGRADE_ALL,
};
