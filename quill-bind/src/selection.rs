//! Selection bounds and their remapping across remote edits.

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// A `(start, end)` selection in char offsets. A caret is `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Collapsed selection at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Where this selection lands after `transform` is applied.
    ///
    /// An edit at or before `start` shifts both bounds by the transform's
    /// length delta; an edit after `start` leaves them alone. A selection
    /// inside a deleted span is not treated specially, it just moves with the
    /// shift. Results are clamped to `[0, new_len]`.
    pub fn remap(&self, transform: &Transform, new_len: usize) -> Selection {
        if transform.position > self.start {
            return Selection::new(self.start.min(new_len), self.end.min(new_len));
        }
        let delta = transform.length_delta();
        Selection::new(
            shift_clamped(self.start, delta, new_len),
            shift_clamped(self.end, delta, new_len),
        )
    }
}

fn shift_clamped(offset: usize, delta: isize, max: usize) -> usize {
    let shifted = if delta < 0 {
        offset.saturating_sub(delta.unsigned_abs())
    } else {
        offset.saturating_add(delta as usize)
    };
    shifted.min(max)
}
