//! Command implementations for nvram-cli

pub mod edit;
pub mod list;
pub mod restore;

pub use edit::{EditArgs, run_edit};
pub use list::run_list;
pub use restore::run_restore;

use std::path::Path;

use nvram_core::{ConfigResolver, EditorConfig};

use crate::error::Result;

/// Resolve the editor config from the user config and an optional explicit file.
pub fn load_config(explicit: Option<&Path>) -> Result<EditorConfig> {
    let mut resolver = ConfigResolver::new();
    if let Some(path) = explicit {
        resolver = resolver.with_explicit(path);
    }
    Ok(resolver.resolve()?)
}
