//! Name and token lookup over parsed blocks

use std::collections::HashMap;

use crate::block::{Block, BlockId};
use crate::document::Document;
use crate::error::MatchError;

/// What the caller is looking for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    /// Text matched against block names
    pub text: String,
    /// Require full equality instead of substring containment
    pub exact: bool,
    /// Keep only blocks carrying this token
    pub token: Option<String>,
    /// Target every match instead of reporting ambiguity
    pub apply_to_all: bool,
    /// Fold case when comparing names
    pub ignore_case: bool,
}

impl MatchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn apply_to_all(mut self, all: bool) -> Self {
        self.apply_to_all = all;
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    fn name_matches(&self, name: &str) -> bool {
        match (self.exact, self.ignore_case) {
            (true, false) => name == self.text,
            (true, true) => name.to_lowercase() == self.text.to_lowercase(),
            (false, false) => name.contains(&self.text),
            (false, true) => name.to_lowercase().contains(&self.text.to_lowercase()),
        }
    }
}

/// Blocks selected by a query, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub matched: Vec<&'a Block>,
    pub ambiguous: bool,
    query: String,
}

impl<'a> MatchResult<'a> {
    pub fn ids(&self) -> Vec<BlockId> {
        self.matched.iter().map(|block| block.id).collect()
    }

    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// The single matched block, or an error when the match is ambiguous.
    pub fn require_unique(self) -> Result<&'a Block, MatchError> {
        match self.matched.as_slice() {
            [only] => Ok(*only),
            _ => Err(MatchError::Ambiguous {
                query: self.query,
                count: self.matched.len(),
            }),
        }
    }
}

/// Lookup structure over one document's blocks.
#[derive(Debug)]
pub struct BlockIndex<'a> {
    document: &'a Document,
    by_name: HashMap<&'a str, Vec<BlockId>>,
    by_token: HashMap<String, Vec<BlockId>>,
}

impl<'a> BlockIndex<'a> {
    pub fn build(document: &'a Document) -> Self {
        let mut by_name: HashMap<&'a str, Vec<BlockId>> = HashMap::new();
        let mut by_token: HashMap<String, Vec<BlockId>> = HashMap::new();

        for block in document.blocks() {
            by_name.entry(block.name.as_str()).or_default().push(block.id);
            if let Some(token) = &block.token {
                by_token.entry(normalize_token(token)).or_default().push(block.id);
            }
        }

        Self {
            document,
            by_name,
            by_token,
        }
    }

    /// Blocks with exactly this name, in document order.
    pub fn named(&self, name: &str) -> &[BlockId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Blocks carrying this token, in document order.
    pub fn with_token(&self, token: &str) -> &[BlockId] {
        self.by_token
            .get(&normalize_token(token))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolve a query to its target blocks.
    pub fn resolve(&self, query: &MatchQuery) -> Result<MatchResult<'a>, MatchError> {
        let mut candidates: Vec<BlockId> = if query.exact && !query.ignore_case {
            self.named(&query.text).to_vec()
        } else {
            self.document
                .blocks()
                .iter()
                .filter(|block| query.name_matches(&block.name))
                .map(|block| block.id)
                .collect()
        };

        if let Some(token) = &query.token {
            let allowed = self.with_token(token);
            candidates.retain(|id| allowed.contains(id));
        }
        candidates.sort();

        let matched: Vec<&'a Block> = candidates
            .iter()
            .filter_map(|id| self.document.block(*id))
            .collect();

        if matched.is_empty() {
            return Err(MatchError::NoMatch {
                query: query.text.clone(),
                token: query.token.clone(),
            });
        }

        let ambiguous = matched.len() > 1 && !query.apply_to_all;
        tracing::debug!(
            query = %query.text,
            matched = matched.len(),
            ambiguous,
            "Resolved block query"
        );

        Ok(MatchResult {
            matched,
            ambiguous,
            query: query.text.clone(),
        })
    }
}

/// Canonical form of a token so `0x1A`, `1a` and `001A` compare equal.
pub fn normalize_token(token: &str) -> String {
    token
        .split(',')
        .map(|part| {
            let part = part.trim();
            let digits = part
                .strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return part.to_string();
            }
            let trimmed = digits.trim_start_matches('0');
            if trimmed.is_empty() {
                "0".to_string()
            } else {
                trimmed.to_ascii_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PORTS: &str = "Setup Question = PCIe Port\nToken = 0x1\nValue = <1>\n\n\
                         Setup Question = PCIe Port\nToken = 0x2\nValue = <2>\n\n\
                         Setup Question = PCIe Port Speed\nToken = 0x3\nValue = <3>\n";

    #[rstest]
    #[case("0x1A", "1a")]
    #[case("001A", "1a")]
    #[case("0X00", "0")]
    #[case("12, 0x13", "12,13")]
    #[case("abc-1", "abc-1")]
    fn normalizes_tokens(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_token(raw), expected);
    }

    #[test]
    fn substring_match_is_case_sensitive() {
        let doc = Document::parse(PORTS.as_bytes()).unwrap();
        let index = BlockIndex::build(&doc);
        let err = index.resolve(&MatchQuery::new("pcie")).unwrap_err();
        assert!(matches!(err, MatchError::NoMatch { .. }));

        let result = index
            .resolve(&MatchQuery::new("pcie").ignore_case(true))
            .unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn exact_match_excludes_longer_names() {
        let doc = Document::parse(PORTS.as_bytes()).unwrap();
        let index = BlockIndex::build(&doc);
        let result = index
            .resolve(&MatchQuery::new("PCIe Port").exact(true))
            .unwrap();
        assert_eq!(result.ids(), vec![BlockId(0), BlockId(1)]);
        assert!(result.ambiguous);
    }

    #[test]
    fn require_unique_reports_count() {
        let doc = Document::parse(PORTS.as_bytes()).unwrap();
        let index = BlockIndex::build(&doc);
        let result = index.resolve(&MatchQuery::new("PCIe")).unwrap();
        assert_eq!(
            result.require_unique().unwrap_err(),
            MatchError::Ambiguous {
                query: "PCIe".into(),
                count: 3
            }
        );
    }

    #[test]
    fn token_lookup_uses_canonical_form() {
        let doc = Document::parse(PORTS.as_bytes()).unwrap();
        let index = BlockIndex::build(&doc);
        assert_eq!(index.with_token("2"), &[BlockId(1)]);
        assert_eq!(index.named("PCIe Port Speed"), &[BlockId(2)]);
        assert!(index.named("missing").is_empty());
    }
}
