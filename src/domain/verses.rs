//! Verse pagination shared by the relational store and the cache.

/// Verses are separated by a blank line.
pub const VERSE_DELIMITER: &str = "\n\n";

/// Return page `verse` (1-based) of `limit` verses from `text`.
///
/// A window starting past the last verse falls back to the first page. A window running past the
/// end is clamped to the first verse only, so `(verse = 1, limit = 10)` over three verses yields
/// just the first one. When that clamp would leave an empty window, the verse at the window start
/// is returned on its own.
pub fn paginate_verses(text: &str, verse: usize, limit: usize) -> String {
    let verses: Vec<&str> = text.split(VERSE_DELIMITER).collect();
    let len = verses.len();

    let mut start = verse.saturating_sub(1).saturating_mul(limit);
    let mut end = start.saturating_add(limit);

    if start >= len {
        start = 0;
    }
    if end > len {
        end = 1;
    }
    if end <= start {
        end = start + 1;
    }

    verses[start..end].join(VERSE_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LYRICS: &str = "v1\n\nv2\n\nv3";

    #[test]
    fn first_verse() {
        assert_eq!(paginate_verses(LYRICS, 1, 1), "v1");
    }

    #[test]
    fn second_verse() {
        assert_eq!(paginate_verses(LYRICS, 2, 1), "v2");
    }

    #[test]
    fn page_past_the_end_wraps_to_first_verse() {
        assert_eq!(paginate_verses(LYRICS, 10, 1), "v1");
    }

    #[test]
    fn oversized_limit_is_clamped_to_first_verse() {
        assert_eq!(paginate_verses(LYRICS, 1, 10), "v1");
    }

    #[test]
    fn window_within_bounds_joins_verses() {
        assert_eq!(paginate_verses(LYRICS, 1, 2), "v1\n\nv2");
        assert_eq!(paginate_verses(LYRICS, 1, 3), LYRICS);
    }

    #[test]
    fn inverted_window_returns_verse_at_start() {
        // start = 2, end = 4 > 3 is clamped to 1 which precedes start.
        assert_eq!(paginate_verses(LYRICS, 2, 2), "v3");
    }

    #[test]
    fn empty_text_yields_empty_verse() {
        assert_eq!(paginate_verses("", 1, 5), "");
    }
}
