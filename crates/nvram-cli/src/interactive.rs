//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based selection and confirmation. Callers must
//! check [`is_interactive`] first; without a terminal the prompts would block
//! or fail.

use dialoguer::{Confirm, MultiSelect};
use std::io::IsTerminal;

use nvram_core::Block;

use crate::error::{CliError, Result};

/// Whether both stdin and stderr are attached to a terminal.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Let the user pick which of several matching blocks to edit.
pub fn select_blocks<'a>(query: &str, candidates: &[&'a Block]) -> Result<Vec<&'a Block>> {
    let items: Vec<String> = candidates.iter().map(|block| candidate_line(block)).collect();
    let picked = MultiSelect::new()
        .with_prompt(format!(
            "'{query}' matches {} blocks (space to toggle, enter to confirm)",
            candidates.len()
        ))
        .items(&items)
        .interact()?;

    if picked.is_empty() {
        return Err(CliError::user("No block selected; nothing to do."));
    }
    Ok(picked.into_iter().map(|i| candidates[i]).collect())
}

/// Ask for confirmation, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// One line describing a block in candidate lists.
pub fn candidate_line(block: &Block) -> String {
    format!(
        "{} | token {} | line {} | {}",
        block.name,
        block.token.as_deref().unwrap_or("<none>"),
        block.line_number(),
        block.summary()
    )
}
