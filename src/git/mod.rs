//! Git operations using system git commands for maximum compatibility
//!
//! ## Sub-modules
//!
//! - [`clone`]: shallow cloning into disposable temporary directories
//!   - `clone_repository()` - clone a remote into a fresh temp dir
//!   - `CloneHandle` - clone root plus guaranteed cleanup
//!
//! - [`revision`]: commit resolution
//!   - `resolve_head_commit()` - HEAD hash of a working tree
//!
//! - [`common`]: shared utilities and helpers
//!   - `Logger` - consistent logging for pipeline operations

pub mod clone;
pub mod common;
pub mod revision;

// Re-export all public items at the module level
pub use clone::{CloneHandle, clone_repository};
pub use common::Logger;
pub use revision::resolve_head_commit;
