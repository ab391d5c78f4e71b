//! Entity-name normalization applied before every comparison

/// Lowercase the text and keep only ASCII letters, ASCII digits and CJK
/// unified ideographs in the U+4E00..=U+9FA5 block.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| is_kept(*c))
        .collect()
}

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}
