/// Verses are separated by a blank line
pub const VERSE_SEPARATOR: &str = "\n\n";

pub fn split_verses(text: &str) -> Vec<&str> {
    text.split(VERSE_SEPARATOR).collect()
}

/// Returns page `page` (1-indexed) of `limit` verses, or `None` when the page
/// starts past the last verse. `page < 1` is treated as 1 and `limit < 1` as 1.
pub fn paginate_verses(text: &str, page: i64, limit: i64) -> Option<String> {
    let verses = split_verses(text);
    let page = page.max(1) as usize;
    let limit = limit.max(1) as usize;

    let start = (page - 1).checked_mul(limit)?;
    if start >= verses.len() {
        return None;
    }
    let end = start.saturating_add(limit).min(verses.len());

    Some(verses[start..end].join(VERSE_SEPARATOR))
}
