//! Text shortening and number formatting for listings.

/// Appended to anything that was cut short.
pub const ELLIPSIS: char = '…';

/// Shorten `text` to at most `max_chars` characters, ellipsis included.
///
/// Text that already fits is returned unchanged.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

/// Keep the first `max_words` whitespace-separated words.
///
/// When words are dropped, the kept ones are joined by single spaces and an
/// ellipsis is appended. Text that already fits is returned unchanged.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    let mut out = words[..max_words].join(" ");
    out.push(ELLIPSIS);
    out
}

/// Group the integer part of an amount in thousands: `1234567.8` → `1 234 567`.
///
/// Groups are counted from the right over the whole rendered number, sign
/// included, so `-123` becomes `- 123` and `-1234` becomes `-1 234`.
pub fn format_currency(value: f64) -> String {
    let rendered: Vec<char> = (value.trunc() as i64).to_string().chars().collect();
    let mut groups: Vec<String> = rendered
        .rchunks(3)
        .map(|group| group.iter().collect())
        .collect();
    groups.reverse();
    groups.join(" ")
}
