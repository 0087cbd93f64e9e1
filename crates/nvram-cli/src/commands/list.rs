//! The `list` command

use colored::Colorize;
use std::path::Path;

use nvram_core::{Block, Document, EditorConfig, MatchError, MatchQuery, index::BlockIndex};

use crate::cli::SelectArgs;
use crate::error::Result;

/// Blocks selected by the optional query and filters.
fn select<'a>(
    document: &'a Document,
    query: Option<&str>,
    select: &SelectArgs,
) -> Result<Vec<&'a Block>> {
    if query.is_none() && select.token.is_none() {
        return Ok(document.blocks().iter().collect());
    }

    let mut match_query = MatchQuery::new(query.unwrap_or_default())
        .exact(select.exact && query.is_some())
        .ignore_case(select.ignore_case)
        .apply_to_all(true);
    if let Some(token) = &select.token {
        match_query = match_query.token(token);
    }

    match BlockIndex::build(document).resolve(&match_query) {
        Ok(result) => Ok(result.matched),
        Err(MatchError::NoMatch { .. }) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Run the list command
pub fn run_list(
    file: &Path,
    query: Option<&str>,
    select_args: &SelectArgs,
    json: bool,
    config: &EditorConfig,
) -> Result<()> {
    let document = Document::load(file, config.parse_options())?;
    let blocks = select(&document, query, select_args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    if blocks.is_empty() {
        println!("{}", "No matching Setup Question blocks.".yellow());
        return Ok(());
    }

    for block in &blocks {
        let description = block.describe();
        let (first, help) = description
            .split_once('\n')
            .unwrap_or((description.as_str(), ""));
        println!("{} {}", format!("{:>5}", block.line_number()).dimmed(), first);
        if !help.is_empty() {
            println!("      {}", help.trim().dimmed());
        }
    }
    println!();
    println!(
        "{} of {} blocks",
        blocks.len().to_string().bold(),
        document.blocks().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &[u8] = b"Setup Question = PCIe Port\nToken = 0x1\nValue = <1>\n\n\
                          Setup Question = PCIe Port\nToken = 0x2\nValue = <2>\n\n\
                          Setup Question = Fast Boot\nValue = <0>\n";

    #[test]
    fn no_query_selects_everything() {
        let doc = Document::parse(DUMP).unwrap();
        assert_eq!(select(&doc, None, &SelectArgs::default()).unwrap().len(), 3);
    }

    #[test]
    fn token_alone_filters() {
        let doc = Document::parse(DUMP).unwrap();
        let args = SelectArgs {
            token: Some("2".into()),
            ..SelectArgs::default()
        };
        let blocks = select(&doc, None, &args).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].value(), Some(2));
    }

    #[test]
    fn unmatched_query_is_empty_not_error() {
        let doc = Document::parse(DUMP).unwrap();
        assert!(select(&doc, Some("Turbo"), &SelectArgs::default()).unwrap().is_empty());
    }
}
