//! FILENAME: pivot-engine/src/span.rs
//! Merged-cell span computation for hierarchical headers.

use crate::definition::Key;

/// Computes the merge span for the header cell at `index`, level `prefix`
/// (0-based, outer to inner), over an already-sorted key sequence.
///
/// Returns `None` when the prefix of length `prefix + 1` matches the
/// previous key's prefix: that cell was already drawn as part of the
/// previous cell's span and must be skipped. Otherwise returns the number
/// of consecutive keys (starting at `index`) sharing the prefix, which is
/// the row-span or col-span to assign to the merged cell.
///
/// Correctness relies on `keys` being sorted so equal prefixes are
/// contiguous; the assembler guarantees that.
pub fn span_size(keys: &[Key], index: usize, prefix: usize) -> Option<usize> {
    let n = prefix + 1;
    let head = &keys[index][..n];
    if index > 0 && keys[index - 1][..n] == *head {
        return None;
    }
    let span = keys[index..]
        .iter()
        .take_while(|key| &key[..n] == head)
        .count();
    Some(span)
}
