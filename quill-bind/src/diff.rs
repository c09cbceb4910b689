//! Single-hunk change detection between two versions of the buffer.
//!
//! Finds the longest common prefix, then the longest common suffix of what
//! remains, and describes everything in between as one replacement. O(n) and
//! minimal for a single contiguous edit, which is what typing produces.
//! Several disjoint edits collapse into one replacement spanning from the
//! first difference to the last: correct, just not minimal.

use crate::transform::{byte_offset, Transform};

/// Compute the transform that turns `old` into `new`.
///
/// Returns `None` when the two are identical.
pub fn detect_change(old: &str, new: &str) -> Option<Transform> {
    if old == new {
        return None;
    }

    let old_len = old.chars().count();
    let new_len = new.chars().count();

    let prefix = old
        .chars()
        .zip(new.chars())
        .take_while(|(a, b)| a == b)
        .count();

    // The suffix may not re-consume chars already claimed by the prefix.
    let suffix = old
        .chars()
        .rev()
        .zip(new.chars().rev())
        .take(old_len.min(new_len) - prefix)
        .take_while(|(a, b)| a == b)
        .count();

    let num_delete = old_len - (prefix + suffix);
    let insert = &new[byte_offset(new, prefix)..byte_offset(new, new_len - suffix)];

    Some(Transform {
        position: prefix,
        num_delete: (num_delete > 0).then_some(num_delete),
        insert: (!insert.is_empty()).then(|| insert.to_string()),
    })
}
