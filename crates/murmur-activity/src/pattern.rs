//! Pseudo-word pattern synthesis.
//!
//! The anticipated preview has to look like speech arriving without carrying
//! any content, so it is built from runs of mask symbols shaped like words:
//! 3 to 8 characters each, space-joined. Word count scales with the sampled
//! audio level against a notional utterance duration.

use rand::Rng;

/// Symbols a pseudo-word is built from. Mirrors the scramble mask's visual
/// register, minus anything that reads as punctuation.
const PATTERN_ALPHABET: &[char] = &[
    '#', '@', '$', '%', '&', '*', '+', '=', '<', '>', '~', '^',
];

const MIN_WORD_LEN: usize = 3;
const MAX_WORD_LEN: usize = 8;

/// Conversational speaking rate used to size the notional utterance.
const WORDS_PER_SECOND: f64 = 2.5;

/// How many pseudo-words a sample at `level` suggests, given the notional
/// utterance duration. At least one; louder input reads as a longer run.
pub fn word_count(level: f64, notional_utterance_ms: u64) -> usize {
    let base = (notional_utterance_ms as f64 / 1000.0) * WORDS_PER_SECOND;
    let scaled = base * (0.5 + level.clamp(0.0, 1.0));
    (scaled.round() as usize).clamp(1, 8)
}

/// Synthesize one content-free pattern for a qualifying activity sample.
pub fn synthesize(level: f64, notional_utterance_ms: u64) -> String {
    let mut rng = rand::rng();
    let words = word_count(level, notional_utterance_ms);
    (0..words)
        .map(|_| {
            let len = rng.random_range(MIN_WORD_LEN..=MAX_WORD_LEN);
            (0..len)
                .map(|_| PATTERN_ALPHABET[rng.random_range(0..PATTERN_ALPHABET.len())])
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
