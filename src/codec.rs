//! Encoding bytes into tokens and decoding them back with a frozen merge table.

use crate::error::{BpeError, Result};
use crate::model::{merge_pair, MergeTable, TokenId, MAX_BASE_TOKEN};

/// Encodes raw bytes by applying every rule once, in creation order.
///
/// Each byte starts as its own base token. Encoding is a pure function of the table
/// and the input: no pair statistics are recomputed.
#[must_use]
pub fn encode(table: &MergeTable, data: &[u8]) -> Vec<TokenId> {
    let mut tokens: Vec<TokenId> = data.iter().map(|&b| TokenId::from(b)).collect();
    for (pair, token) in table.rules() {
        if tokens.len() < 2 {
            break;
        }
        merge_pair(&mut tokens, pair, token);
    }
    tokens
}

/// Decodes tokens back into bytes by expanding rules from the newest to the oldest.
///
/// Any token above [`MergeTable::last_token`] is rejected with
/// [`BpeError::MalformedToken`] before expansion starts.
pub fn decode(table: &MergeTable, tokens: &[TokenId]) -> Result<Vec<u8>> {
    let last_token = table.last_token();
    if let Some(&token) = tokens.iter().find(|&&token| token > last_token) {
        return Err(BpeError::MalformedToken { token, last_token });
    }

    let mut current = tokens.to_vec();
    for (pair, token) in table.rules().rev() {
        if current.iter().all(|&t| t <= MAX_BASE_TOKEN) {
            break;
        }
        let hits = current.iter().filter(|&&t| t == token).count();
        if hits == 0 {
            continue;
        }
        let mut expanded = Vec::with_capacity(current.len() + hits);
        for &t in &current {
            if t == token {
                expanded.push(pair.0);
                expanded.push(pair.1);
            } else {
                expanded.push(t);
            }
        }
        current = expanded;
    }

    current
        .into_iter()
        .map(|token| u8::try_from(token).map_err(|_| BpeError::MalformedToken { token, last_token }))
        .collect()
}

/// Renders tokens as whitespace separated decimal identifiers.
#[must_use]
pub fn format_tokens(tokens: &[TokenId]) -> String {
    let mut out = String::with_capacity(tokens.len() * 4);
    for (idx, token) in tokens.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(&token.to_string());
    }
    out
}

/// Parses the textual form produced by [`format_tokens`].
pub fn parse_tokens(text: &str) -> Result<Vec<TokenId>> {
    text.split_whitespace()
        .map(|part| {
            part.parse::<TokenId>()
                .map_err(|err| BpeError::InvalidTokenList(format!("`{part}`: {err}")))
        })
        .collect()
}
