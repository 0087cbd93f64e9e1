//! The `restore` command

use colored::Colorize;
use std::path::Path;

use nvram_core::{EditorConfig, writer};

use crate::error::Result;

/// Run the restore command
pub fn run_restore(file: &Path, config: &EditorConfig) -> Result<()> {
    let backup = writer::restore_backup(file, &config.backup_suffix)?;
    println!(
        "{} Restored {} from {}",
        "OK".green().bold(),
        file.display(),
        backup.display()
    );
    Ok(())
}
