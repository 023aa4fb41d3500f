use rustc_hash::FxHashMap;

use crate::model::{Pair, TokenId};

/// Finds the most frequent pair occurring at least twice.
///
/// Chunks are scanned in order, each left to right, while counts accumulate. The
/// winner is the first pair whose running count climbs above every count seen
/// so far, so among tied pairs the one completing its final occurrence earliest in
/// the scan wins. Pairs occurring once are never reported.
pub(crate) fn most_frequent_pair(chunks: &[Vec<TokenId>]) -> Option<(Pair, usize)> {
    let mut counts: FxHashMap<Pair, usize> = FxHashMap::default();
    let mut best: Option<(Pair, usize)> = None;
    for chunk in chunks {
        for window in chunk.windows(2) {
            let pair = (window[0], window[1]);
            let count = counts.entry(pair).or_insert(0);
            *count += 1;
            let count = *count;
            if count >= 2 && best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((pair, count));
            }
        }
    }
    best
}
