//! The `edit` command
//!
//! Edits run twice: a dry pass that validates every target and collects the
//! before/after summaries, then, after any confirmation, the real pass and the
//! save.

use colored::Colorize;
use std::path::PathBuf;

use nvram_core::{BlockId, CrcMode, EditOutcome, EditRequest, EditSession, EditorConfig, MatchQuery};

use crate::cli::{EditMode, SelectArgs};
use crate::error::{CliError, Result};
use crate::interactive;

/// Arguments of one `edit` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditArgs {
    pub file: PathBuf,
    pub query: String,
    pub value: String,
    pub mode: EditMode,
    pub select: SelectArgs,
    pub all: bool,
    pub dry_run: bool,
    pub yes: bool,
    pub diff: bool,
    pub crc: CrcMode,
    pub force_unsafe_crc: bool,
}

impl EditArgs {
    fn request(&self) -> EditRequest {
        match self.mode {
            EditMode::Option => EditRequest::option(&self.value),
            EditMode::Value => EditRequest::value(&self.value),
        }
    }

    fn query(&self) -> MatchQuery {
        let query = MatchQuery::new(&self.query)
            .exact(self.select.exact)
            .ignore_case(self.select.ignore_case)
            .apply_to_all(self.all);
        match &self.select.token {
            Some(token) => query.token(token),
            None => query,
        }
    }
}

/// Run the edit command
pub fn run_edit(args: &EditArgs, config: EditorConfig) -> Result<()> {
    let mut session = EditSession::load(&args.file, config)?;
    session.set_crc_policy(args.crc, args.force_unsafe_crc);

    let targets = resolve_targets(&session, args)?;
    let request = args.request();

    let preview = session.apply_batch(&targets, &request.clone().dry_run(true))?;
    for outcome in &preview {
        print_outcome(outcome);
    }

    let accepted: Vec<BlockId> = preview
        .iter()
        .filter(|outcome| outcome.after_summary.is_some())
        .map(|outcome| outcome.block)
        .collect();
    if accepted.is_empty() {
        return Err(CliError::user("No block could be edited; nothing was written."));
    }

    if args.dry_run {
        if args.diff {
            session.apply_batch(&accepted, &request)?;
            print_diff(&session)?;
        }
        println!();
        println!("{}", "Dry run: no changes written.".yellow());
        return Ok(());
    }

    let accepted_outcomes = || preview.iter().filter(|o| o.after_summary.is_some());
    let risky = accepted_outcomes().any(|o| o.risky);
    let unsafe_crc = accepted_outcomes().any(|o| o.unsafe_crc);
    if (risky || unsafe_crc) && !args.yes {
        confirm_or_abort(risky, unsafe_crc)?;
    }

    let outcomes = session.apply_batch(&accepted, &request)?;
    if outcomes.iter().all(|outcome| !outcome.applied) {
        return Err(CliError::user("No block could be edited; nothing was written."));
    }
    if args.diff {
        print_diff(&session)?;
    }

    let report = session.save_in_place()?;
    println!();
    if let Some(backup) = &report.backup {
        println!("{} Backup written to {}", "OK".green().bold(), backup.display());
    }
    println!(
        "{} Saved {} ({} bytes)",
        "OK".green().bold(),
        report.path.display(),
        report.bytes_written
    );
    if !report.unsafe_blocks.is_empty() {
        eprintln!(
            "{} CRC markers were bypassed for {} block(s); the firmware may reject this file",
            "warning:".yellow().bold(),
            report.unsafe_blocks.len()
        );
    }
    Ok(())
}

/// Resolve the query, asking the user when it is ambiguous.
fn resolve_targets(session: &EditSession, args: &EditArgs) -> Result<Vec<BlockId>> {
    let result = session.find(&args.query())?;
    if !result.ambiguous {
        return Ok(result.ids());
    }

    if interactive::is_interactive() {
        let picked = interactive::select_blocks(&args.query, &result.matched)?;
        return Ok(picked.into_iter().map(|block| block.id).collect());
    }

    let candidates = result
        .matched
        .iter()
        .map(|block| format!("  {}", interactive::candidate_line(block)))
        .collect::<Vec<_>>()
        .join("\n");
    Err(CliError::user(format!(
        "'{}' matches {} blocks:\n{}\nNarrow it with --token or --exact, or pass --all to edit every match.",
        args.query,
        result.len(),
        candidates
    )))
}

fn confirm_or_abort(risky: bool, unsafe_crc: bool) -> Result<()> {
    let prompt = match (risky, unsafe_crc) {
        (true, true) => "This edit touches a risky setting and bypasses a HIICrc32 marker. Continue?",
        (false, true) => "This edit bypasses a HIICrc32 marker. Continue?",
        _ => "This setting can leave the system unbootable. Continue?",
    };

    if !interactive::is_interactive() {
        return Err(CliError::user(format!(
            "{prompt} Re-run with --yes to confirm."
        )));
    }
    if !interactive::confirm(prompt)? {
        return Err(CliError::user("Edit cancelled by user."));
    }
    Ok(())
}

fn print_diff(session: &EditSession) -> Result<()> {
    let diff = session.diff_preview()?;
    println!();
    for line in diff.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            println!("{}", line.green());
        } else if line.starts_with('-') && !line.starts_with("---") {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
    Ok(())
}

fn print_outcome(outcome: &EditOutcome) {
    let location = format!("{} (line {})", outcome.name.bold(), outcome.line_number);
    match &outcome.after_summary {
        Some(after) => println!(
            "{} {}: {} -> {}",
            "edit".cyan().bold(),
            location,
            outcome.before_summary,
            after.green()
        ),
        None => println!(
            "{} {}: {}",
            "skip".yellow().bold(),
            location,
            outcome.reason_if_skipped.as_deref().unwrap_or("rejected")
        ),
    }
    if let Some(note) = &outcome.conversion_note {
        println!("     {}", note.dimmed());
    }
    if outcome.risky {
        println!(
            "     {} matches a risk keyword",
            "warning:".yellow().bold()
        );
    }
    if outcome.unsafe_crc {
        println!(
            "     {} its HIICrc32 marker will be bypassed",
            "warning:".yellow().bold()
        );
    }
}
