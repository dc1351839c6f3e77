//! Recorded edits over an original text, with offset correspondence.
//!
//! Corpus cleanup (markup stripping, escape normalization) edits the raw
//! text before tokenization, which moves every byte offset after the edit.
//! [`StringTransformation`] records those edits and answers correspondence
//! queries both ways, so annotations built over the cleaned text can be
//! mapped back onto the original through
//! [`map_to_source_text`](crate::transform::map_to_source_text).
//!
//! Edits are specified against the *current* transformed text — compute a
//! batch of changes in one pass over the text, apply them, repeat. An edit
//! whose range touches an already-edited region of the original is
//! rejected as a conflict rather than split.

use crate::error::{Error, Result};
use crate::span::TextSpan;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Edit {
    /// Replaced range in the original text.
    original: TextSpan,
    replacement: String,
    /// Start of the replacement in the transformed text; derived, kept in
    /// sync with the edit list.
    transformed_start: usize,
}

impl Edit {
    fn transformed_end(&self) -> usize {
        self.transformed_start + self.replacement.len()
    }
}

/// A list of edits applied to an original string to produce a transformed
/// one, with bidirectional offset correspondence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTransformation {
    original: String,
    transformed: String,
    /// Sorted by original start; ranges never overlap.
    edits: Vec<Edit>,
}

impl StringTransformation {
    /// Start from an untransformed original text.
    #[must_use]
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            transformed: original.clone(),
            original,
            edits: Vec::new(),
        }
    }

    /// The original text, before any edit.
    #[must_use]
    pub fn original_text(&self) -> &str {
        &self.original
    }

    /// The text with every recorded edit applied.
    #[must_use]
    pub fn transformed_text(&self) -> &str {
        &self.transformed
    }

    /// Number of recorded edits.
    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Replace `[start, end)` of the **current transformed text** with
    /// `replacement`. Returns the replacement's range in the new
    /// transformed text.
    ///
    /// # Errors
    ///
    /// Fails when the range is out of bounds, splits a UTF-8 character, or
    /// maps onto an already-edited region of the original.
    pub fn transform(
        &mut self,
        start: usize,
        end: usize,
        replacement: impl Into<String>,
    ) -> Result<TextSpan> {
        let replacement = replacement.into();
        if start > end || end > self.transformed.len() {
            return Err(Error::invalid_input(format!(
                "edit range [{start}, {end}) out of bounds for transformed text of {} bytes",
                self.transformed.len()
            )));
        }
        if !self.transformed.is_char_boundary(start) || !self.transformed.is_char_boundary(end) {
            return Err(Error::invalid_input(format!(
                "edit range [{start}, {end}) splits a UTF-8 character"
            )));
        }

        // an in-flight replacement region cannot be edited again
        for edit in &self.edits {
            if start < edit.transformed_end() && edit.transformed_start < end {
                return Err(Error::edit_conflict(format!(
                    "range [{start}, {end}) touches the replacement for original {}",
                    edit.original
                )));
            }
        }

        let original = self.original_offsets(TextSpan::new(start, end));
        let position = self
            .edits
            .partition_point(|edit| edit.original.start < original.start);
        let edit = Edit {
            original,
            replacement,
            transformed_start: 0,
        };
        self.edits.insert(position, edit);
        self.rebuild();

        let inserted = &self.edits[position];
        Ok(TextSpan::new(
            inserted.transformed_start,
            inserted.transformed_end(),
        ))
    }

    /// Recompute the transformed text and each edit's transformed position
    /// from the sorted edit list.
    fn rebuild(&mut self) {
        let mut transformed = String::with_capacity(self.original.len());
        let mut consumed = 0;
        for edit in &mut self.edits {
            transformed.push_str(&self.original[consumed..edit.original.start]);
            edit.transformed_start = transformed.len();
            transformed.push_str(&edit.replacement);
            consumed = edit.original.end;
        }
        transformed.push_str(&self.original[consumed..]);
        self.transformed = transformed;
    }

    /// Map one transformed-text offset back to the original text. Offsets
    /// inside a replacement snap to the replaced region's start (or end,
    /// for a range end).
    fn original_offset(&self, offset: usize, is_end: bool) -> usize {
        // At an empty-replacement boundary the two conditions coincide; a
        // range start binds past the edit, a range end before it.
        let mut delta = 0isize;
        for edit in &self.edits {
            if is_end && offset <= edit.transformed_start {
                break;
            }
            if offset >= edit.transformed_end() {
                delta += edit.original.len() as isize - edit.replacement.len() as isize;
                continue;
            }
            if offset <= edit.transformed_start {
                break;
            }
            return if is_end {
                edit.original.end
            } else {
                edit.original.start
            };
        }
        (offset as isize + delta) as usize
    }

    /// Map a transformed-text range back to the corresponding original-text
    /// range.
    #[must_use]
    pub fn original_offsets(&self, span: TextSpan) -> TextSpan {
        TextSpan::new(
            self.original_offset(span.start, false),
            self.original_offset(span.end, true),
        )
    }

    /// Map an original-text offset to the transformed text. Offsets inside
    /// a replaced region land inside (or at the end of) the replacement.
    #[must_use]
    pub fn modified_offset(&self, offset: usize) -> usize {
        let mut delta = 0isize;
        for edit in &self.edits {
            if offset >= edit.original.end {
                delta += edit.replacement.len() as isize - edit.original.len() as isize;
            } else if offset <= edit.original.start {
                break;
            } else {
                let into = (offset - edit.original.start).min(edit.replacement.len());
                return edit.transformed_start + into;
            }
        }
        (offset as isize + delta) as usize
    }

    /// Map an original-text range to the corresponding transformed-text
    /// range.
    #[must_use]
    pub fn modified_offsets(&self, span: TextSpan) -> TextSpan {
        TextSpan::new(self.modified_offset(span.start), self.modified_offset(span.end))
    }
}
