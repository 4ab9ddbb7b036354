use super::types::ContentSection;
use crate::content::richtext;

pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes to read: every heading and body word across all
/// sections, divided by [`WORDS_PER_MINUTE`] and rounded up. Empty content
/// reads in zero minutes.
pub fn estimate_reading_time(content: &[ContentSection]) -> usize {
    let words: usize = content
        .iter()
        .map(|section| {
            count_words(&section.heading) + count_words(&richtext::as_text(&section.body))
        })
        .sum();

    words.div_ceil(WORDS_PER_MINUTE)
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
