//! Recursive character text splitting
//!
//! Text is cut on the coarsest separator that occurs in it (paragraphs,
//! then lines, then words, then characters) and the pieces are merged
//! back into chunks of at most `chunk_size` characters, each starting with
//! up to `chunk_overlap` characters carried over from the previous chunk.

use std::collections::VecDeque;

use crate::config::IngestConfig;
use crate::errors::DsaCoachError;
use crate::errors::Result;

/// Separators tried in order; the empty one splits into characters
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits documents into overlapping chunks
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// # Errors
    /// - `ConfigError` when `chunk_size` is zero or not larger than `chunk_overlap`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(DsaCoachError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
        })
    }

    /// # Errors
    /// See [`Self::new`].
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty chunks in document order
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s.as_str()))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).map_or("", String::as_str);
        let remaining = separators.get(position + 1..).unwrap_or_default();

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending = Vec::new();

        for split in splits {
            if char_len(&split) < self.chunk_size {
                pending.push(split);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge_splits(&pending, separator));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(split);
            } else {
                chunks.extend(self.split_recursive(&split, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_splits(&pending, separator));
        }

        chunks
    }

    /// Greedily pack small pieces into chunks, keeping an overlapping tail
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let removed = char_len(first) + if current.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(removed);
                }
            }

            let joiner = if current.is_empty() { 0 } else { separator_len };
            current.push_back(split);
            total += len + joiner;
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
        }
    }
}
