//! Mask generation for the scramble-decrypt reveal.
//!
//! A mask is a same-length string of random symbols standing in for the
//! not-yet-revealed characters. Whitespace and terminal punctuation are
//! preserved verbatim so the text's shape reads through the scramble. The
//! mask is generated once per chunk and frozen, which keeps the prefix
//! reveal deterministic for a given chunk lifecycle.

use rand::Rng;

/// Symbols the scramble draws from. Deliberately excludes `.`, `!`, `?`
/// (preserved punctuation) and anything that reads as whitespace.
const MASK_ALPHABET: &[char] = &[
    '#', '@', '$', '%', '&', '*', '+', '=', '<', '>', '~', '^', '/', '\\', '|',
];

/// Characters shown verbatim from the first animation step.
pub fn is_preserved(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '!' | '?')
}

/// One random mask symbol.
pub fn mask_char<R: Rng>(rng: &mut R) -> char {
    MASK_ALPHABET[rng.random_range(0..MASK_ALPHABET.len())]
}

/// Generate a frozen mask for `text`: same character count, preserved
/// characters copied through, everything else a random symbol.
pub fn mask_text(text: &str) -> String {
    let mut rng = rand::rng();
    text.chars()
        .map(|c| if is_preserved(c) { c } else { mask_char(&mut rng) })
        .collect()
}
