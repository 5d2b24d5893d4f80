//! Semantic token stream decoding
//!
//! Tokens arrive as relative groups of five numbers (line delta, start,
//! length, type index, modifier bitset). Lines accumulate across the stream;
//! the start column is relative to the previous token while on the same line
//! and absolute after a line change. Only the type index is interpreted.

use lsp_types::{Position, Range, SemanticTokens};

/// Legend type name used for method references
pub const METHOD_TOKEN_TYPE: &str = "method";

/// A token with its absolute range and legend type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// `None` when the type index falls outside the legend
    pub token_type: Option<String>,
    pub range: Range,
}

impl DecodedToken {
    pub fn is_type(&self, name: &str) -> bool {
        self.token_type.as_deref() == Some(name)
    }
}

pub fn decode_semantic_tokens(tokens: &SemanticTokens, legend: &[String]) -> Vec<DecodedToken> {
    let mut line = 0u32;
    let mut start = 0u32;

    tokens
        .data
        .iter()
        .map(|token| {
            if token.delta_line == 0 {
                start = start.saturating_add(token.delta_start);
            } else {
                line = line.saturating_add(token.delta_line);
                start = token.delta_start;
            }

            DecodedToken {
                token_type: legend.get(token.token_type as usize).cloned(),
                range: Range::new(
                    Position::new(line, start),
                    Position::new(line, start.saturating_add(token.length)),
                ),
            }
        })
        .collect()
}
