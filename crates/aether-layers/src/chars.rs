//! Glyph sets for text-based layers.

/// Glyphs used by the digital rain.
pub const RAIN_CHARS: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    '<', '>', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '-', '+', '=',
];

/// Pick a rain glyph.
pub fn random_rain_char(rng: &mut fastrand::Rng) -> char {
    RAIN_CHARS[rng.usize(..RAIN_CHARS.len())]
}
