//! Text normalization used by upstream cleaning steps.
//!
//! Trim, lowercase, and fold the fixed accent set the source feed actually
//! contains. This is a static character map, not Unicode normalization;
//! anything outside the map passes through unchanged.

/// The accented characters the feed emits and their ASCII folds.
const ACCENT_MAP: [(char, char); 7] = [
    ('á', 'a'),
    ('é', 'e'),
    ('í', 'i'),
    ('ó', 'o'),
    ('ú', 'u'),
    ('ü', 'u'),
    ('ñ', 'n'),
];

/// Trim, lowercase, and accent-fold a text value.
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            ACCENT_MAP
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}
