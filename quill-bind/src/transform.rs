//! Positional edit operations over flat text content.
//!
//! Wire format (JSON, absent fields omitted):
//! ```text
//! { "position": 5, "num_delete": 2, "insert": "xy" }
//! ```
//!
//! All offsets and lengths count `char`s, so a transform can never split a
//! multi-byte character.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single edit: delete `num_delete` chars at `position`, then insert
/// `insert` at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_delete: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<String>,
}

impl Transform {
    /// Pure insertion.
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            num_delete: None,
            insert: Some(text.into()),
        }
    }

    /// Pure deletion.
    pub fn delete(position: usize, count: usize) -> Self {
        Self {
            position,
            num_delete: Some(count),
            insert: None,
        }
    }

    /// Deletion followed by insertion at the same position.
    pub fn replace(position: usize, count: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            num_delete: Some(count),
            insert: Some(text.into()),
        }
    }

    /// Number of chars removed (0 when absent).
    pub fn delete_len(&self) -> usize {
        self.num_delete.unwrap_or(0)
    }

    /// Text inserted ("" when absent).
    pub fn insert_text(&self) -> &str {
        self.insert.as_deref().unwrap_or("")
    }

    /// Number of chars inserted.
    pub fn insert_len(&self) -> usize {
        self.insert_text().chars().count()
    }

    /// Net change in content length caused by this transform.
    pub fn length_delta(&self) -> isize {
        self.insert_len() as isize - self.delete_len() as isize
    }

    /// A transform that neither deletes nor inserts anything.
    pub fn is_noop(&self) -> bool {
        self.delete_len() == 0 && self.insert_text().is_empty()
    }

    /// Reject transforms that would change nothing.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.is_noop() {
            return Err(TransformError::Empty);
        }
        Ok(())
    }

    /// Apply this transform to `content`, returning the new content.
    ///
    /// Fails without touching anything if the edited span falls outside
    /// `[0, len(content)]`.
    pub fn apply(&self, content: &str) -> Result<String, TransformError> {
        let len = content.chars().count();
        let end = self
            .position
            .checked_add(self.delete_len())
            .ok_or(TransformError::OutOfBounds {
                position: self.position,
                num_delete: self.delete_len(),
                len,
            })?;
        if self.position > len || end > len {
            return Err(TransformError::OutOfBounds {
                position: self.position,
                num_delete: self.delete_len(),
                len,
            });
        }

        let start_byte = byte_offset(content, self.position);
        let end_byte = byte_offset(content, end);

        let insert = self.insert_text();
        let mut out = String::with_capacity(content.len() - (end_byte - start_byte) + insert.len());
        out.push_str(&content[..start_byte]);
        out.push_str(insert);
        out.push_str(&content[end_byte..]);
        Ok(out)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, TransformError> {
        serde_json::to_string(self).map_err(|e| TransformError::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        serde_json::from_str(json).map_err(|e| TransformError::Deserialization(e.to_string()))
    }
}

/// Byte index of the `chars`-th char in `s` (or `s.len()` at the end).
///
/// Callers guarantee `chars <= s.chars().count()`.
pub(crate) fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

/// Errors produced while validating or applying a transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("transform out of bounds: position {position} + num_delete {num_delete} exceeds content length {len}")]
    OutOfBounds {
        position: usize,
        num_delete: usize,
        len: usize,
    },
    #[error("transform changes nothing")]
    Empty,
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_insert() {
        let t = Transform::insert(1, "XY");
        assert_eq!(t.apply("abcdef").unwrap(), "aXYbcdef");
    }

    #[test]
    fn test_apply_delete() {
        let t = Transform::delete(4, 2);
        assert_eq!(t.apply("abcdef").unwrap(), "abcd");
    }

    #[test]
    fn test_apply_replace() {
        let t = Transform::replace(0, 3, "xyz");
        assert_eq!(t.apply("abcdef").unwrap(), "xyzdef");
    }

    #[test]
    fn test_apply_at_end() {
        let t = Transform::insert(5, "x");
        assert_eq!(t.apply("hello").unwrap(), "hellox");
    }

    #[test]
    fn test_apply_into_empty() {
        let t = Transform::insert(0, "X");
        assert_eq!(t.apply("").unwrap(), "X");
    }

    #[test]
    fn test_apply_out_of_bounds_delete() {
        let t = Transform::delete(4, 3);
        let err = t.apply("abcdef").unwrap_err();
        assert_eq!(
            err,
            TransformError::OutOfBounds {
                position: 4,
                num_delete: 3,
                len: 6
            }
        );
    }

    #[test]
    fn test_apply_out_of_bounds_position() {
        let t = Transform::insert(7, "x");
        assert!(t.apply("abcdef").is_err());
    }

    #[test]
    fn test_apply_overflowing_span() {
        let t = Transform::delete(1, usize::MAX);
        assert!(matches!(t.apply("abc"), Err(TransformError::OutOfBounds { .. })));
    }

    #[test]
    fn test_apply_multibyte() {
        // Offsets count chars, not bytes.
        let t = Transform::replace(1, 1, "ü");
        assert_eq!(t.apply("aöc").unwrap(), "aüc");

        let t = Transform::insert(2, "🎉");
        assert_eq!(t.apply("日本語").unwrap(), "日本🎉語");
    }

    #[test]
    fn test_lengths() {
        let t = Transform::replace(0, 2, "日本語");
        assert_eq!(t.delete_len(), 2);
        assert_eq!(t.insert_len(), 3);
        assert_eq!(t.length_delta(), 1);

        let t = Transform::delete(0, 4);
        assert_eq!(t.insert_text(), "");
        assert_eq!(t.length_delta(), -4);
    }

    #[test]
    fn test_validate() {
        assert!(Transform::insert(0, "a").validate().is_ok());
        assert!(Transform::delete(0, 1).validate().is_ok());
        assert_eq!(Transform::insert(0, "").validate(), Err(TransformError::Empty));
        assert_eq!(Transform::delete(3, 0).validate(), Err(TransformError::Empty));
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let json = Transform::insert(5, "x").to_json().unwrap();
        assert_eq!(json, r#"{"position":5,"insert":"x"}"#);

        let json = Transform::delete(2, 3).to_json().unwrap();
        assert_eq!(json, r#"{"position":2,"num_delete":3}"#);
    }

    #[test]
    fn test_json_decode_missing_fields() {
        let t = Transform::from_json(r#"{"position":0,"insert":"["}"#).unwrap();
        assert_eq!(t, Transform::insert(0, "["));
        assert_eq!(t.delete_len(), 0);
    }

    #[test]
    fn test_json_decode_garbage() {
        assert!(matches!(
            Transform::from_json("{position:"),
            Err(TransformError::Deserialization(_))
        ));
    }
}
