// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Splits extracted document text into bounded-size segments for
//! inference. Deterministic: identical input always produces the
//! identical chunk sequence.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum chunk length in characters.
    pub max_chunk_size: usize,
    /// Chunks shorter than this after assembly are discarded.
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 2000,
            min_chunk_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChunk {
    pub text: String,
    /// Position of the chunk in the assembled sequence, before short
    /// chunks are filtered out.
    pub ordinal: usize,
}

/// Split text on sentence-terminating punctuation, then greedily
/// concatenate sentences into chunks not exceeding `max_chunk_size`.
/// A single sentence longer than the limit is hard-split on character
/// boundaries so no chunk ever exceeds the limit.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<ContentChunk> {
    let sentences = split_sentences(text);

    let mut assembled: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in sentences {
        let sentence_chars = sentence.chars().count();

        if sentence_chars > config.max_chunk_size {
            if !current.is_empty() {
                assembled.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            for piece in hard_split(&sentence, config.max_chunk_size) {
                assembled.push(piece);
            }
            continue;
        }

        let separator = usize::from(!current.is_empty());
        if current_chars + separator + sentence_chars > config.max_chunk_size {
            assembled.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(&sentence);
        current_chars += sentence_chars;
    }

    if !current.is_empty() {
        assembled.push(current);
    }

    assembled
        .into_iter()
        .enumerate()
        .filter(|(_, chunk)| chunk.chars().count() >= config.min_chunk_size)
        .map(|(ordinal, text)| ContentChunk { text, ordinal })
        .collect()
}

/// Split on `.`, `!` and `?`, keeping the terminator with its sentence.
/// Runs of terminators (e.g. `...` or `?!`) stay together.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut in_terminator = false;

    for ch in text.chars() {
        let is_terminator = matches!(ch, '.' | '!' | '?');
        if in_terminator && !is_terminator {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
        current.push(ch);
        in_terminator = is_terminator;
    }

    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }

    sentences
}

fn hard_split(sentence: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}
