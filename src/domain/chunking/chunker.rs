use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::policy::ChunkPolicy;
use crate::domain::DomainError;

const PARAGRAPH_BREAK: &str = "\n\n";

/// A contiguous slice of a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub text: String,
    pub sequence_index: usize,
    /// Character offset of the first character in the source
    pub char_start: usize,
    /// Character offset one past the last character in the source
    pub char_end: usize,
}

impl DocumentChunk {
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// Splits text into overlapping chunks under a [`ChunkPolicy`]
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    policy: ChunkPolicy,
}

impl Chunker {
    pub fn new(policy: ChunkPolicy) -> Result<Self, DomainError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> ChunkPolicy {
        self.policy
    }

    /// Lazily split `text`; each call starts a fresh sequence
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            policy: self.policy,
            total_chars: text.chars().count(),
            start_char: 0,
            start_byte: 0,
            sequence_index: 0,
            done: text.is_empty(),
        }
    }
}

/// Split `text` into chunks of at most `max_size` characters
pub fn split(text: &str, max_size: usize, overlap: usize) -> Result<Chunks<'_>, DomainError> {
    Ok(Chunker::new(ChunkPolicy::new(max_size, overlap))?.split(text))
}

/// Lazy chunk sequence over a borrowed document
///
/// Consecutive chunks share exactly `overlap` characters, so dropping the
/// first `overlap` characters of every chunk after the first and
/// concatenating rebuilds the input.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    policy: ChunkPolicy,
    total_chars: usize,
    start_char: usize,
    start_byte: usize,
    sequence_index: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    fn emit(&mut self, text: &'a str, chars: usize) -> DocumentChunk {
        let chunk = DocumentChunk {
            text: text.to_string(),
            sequence_index: self.sequence_index,
            char_start: self.start_char,
            char_end: self.start_char + chars,
        };
        self.sequence_index += 1;
        chunk
    }
}

impl Iterator for Chunks<'_> {
    type Item = DocumentChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let text = self.text;
        let rest = &text[self.start_byte..];
        let remaining = self.total_chars - self.start_char;

        if remaining <= self.policy.max_size {
            self.done = true;
            return Some(self.emit(rest, remaining));
        }

        let window = &rest[..byte_offset(rest, self.policy.max_size)];
        let cut = find_cut(window, self.policy.min_cut());
        let chunk = self.emit(&window[..cut.bytes], cut.chars);

        let advance = cut.chars - self.policy.overlap;
        self.start_byte += byte_offset(rest, advance);
        self.start_char += advance;

        Some(chunk)
    }
}

#[derive(Debug, Clone, Copy)]
struct Cut {
    bytes: usize,
    chars: usize,
}

/// Pick the cut point inside a full window
///
/// Preference: last paragraph break, last sentence boundary, last
/// whitespace, then the window end. Candidates shorter than `min_chars`
/// are ignored.
fn find_cut(window: &str, min_chars: usize) -> Cut {
    let starts: Vec<usize> = window.char_indices().map(|(b, _)| b).collect();
    let min_byte = starts.get(min_chars).copied().unwrap_or(window.len());
    let at = |bytes: usize| Cut {
        bytes,
        chars: starts.partition_point(|&b| b < bytes),
    };

    if let Some(idx) = window.rfind(PARAGRAPH_BREAK) {
        let bytes = idx + PARAGRAPH_BREAK.len();
        if bytes >= min_byte {
            return at(bytes);
        }
    }

    let sentence = window
        .split_sentence_bound_indices()
        .map(|(idx, _)| idx)
        .filter(|&idx| idx >= min_byte)
        .last();
    if let Some(bytes) = sentence {
        return at(bytes);
    }

    let whitespace = window
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(idx, c)| idx + c.len_utf8());
    if let Some(bytes) = whitespace.filter(|&bytes| bytes >= min_byte) {
        return at(bytes);
    }

    at(window.len())
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}
