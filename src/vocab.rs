//! Reconstructs the byte string each merge token stands for.

use std::collections::BTreeMap;

use crate::model::{MergeTable, TokenId, FIRST_MERGE_TOKEN};

/// Resolves every merge token of `table` to the bytes it expands to.
///
/// Rules are visited in creation order, so both components of a rule are either
/// base bytes or tokens resolved by an earlier iteration.
#[must_use]
pub fn resolve_tokens(table: &MergeTable) -> BTreeMap<TokenId, Vec<u8>> {
    let mut resolved: Vec<Vec<u8>> = Vec::with_capacity(table.len());
    for ((left, right), _) in table.rules() {
        let mut bytes = Vec::new();
        append_component(&resolved, left, &mut bytes);
        append_component(&resolved, right, &mut bytes);
        resolved.push(bytes);
    }
    resolved
        .into_iter()
        .enumerate()
        .map(|(idx, bytes)| (FIRST_MERGE_TOKEN + idx as TokenId, bytes))
        .collect()
}

fn append_component(resolved: &[Vec<u8>], token: TokenId, out: &mut Vec<u8>) {
    match u8::try_from(token) {
        Ok(byte) => out.push(byte),
        Err(_) => out.extend_from_slice(&resolved[(token - FIRST_MERGE_TOKEN) as usize]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_nested_rules() {
        let table = MergeTable::from_parts(
            vec![(104, 101), (108, 108), (256, 257), (257, 111)],
            vec![256, 257, 258, 259],
            259,
        )
        .expect("valid table");
        let tokens = resolve_tokens(&table);
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[&256], b"he");
        assert_eq!(tokens[&257], b"ll");
        assert_eq!(tokens[&258], b"hell");
        assert_eq!(tokens[&259], b"llo");
    }

    #[test]
    fn empty_table_has_no_merge_tokens() {
        assert!(resolve_tokens(&MergeTable::new()).is_empty());
    }

    #[test]
    fn non_utf8_bytes_survive() {
        let table = MergeTable::from_parts(vec![(0xFF, 0x00)], vec![256], 256).expect("table");
        assert_eq!(resolve_tokens(&table)[&256], vec![0xFF, 0x00]);
    }
}
