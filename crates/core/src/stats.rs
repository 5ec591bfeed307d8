/// Text statistics computed deterministically from decoded text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Maximal runs of non-whitespace characters.
    pub words: u64,
    /// Maximal non-empty blank-line-separated segments.
    pub paragraphs: u64,
    /// Total characters in the text, counted as Unicode scalar values
    /// (`str::chars`), not bytes or UTF-16 code units. Characters outside
    /// the Basic Multilingual Plane count once, where a UTF-16 length
    /// would count their surrogate pair as two.
    pub chars: u64,
}

impl TextStats {
    /// Compute all three statistics for a text.
    ///
    /// Words split on any whitespace run, so leading, trailing, and repeated
    /// whitespace never produce empty words. Paragraphs are counted after
    /// normalizing `\r\n` to `\n` and trimming the whole text, splitting on a
    /// single blank line (`"\n\n"`) and discarding empty segments: text with
    /// content but no blank line is one paragraph, and all-whitespace text
    /// has zero of everything except its character count.
    #[must_use]
    pub fn compute(text: &str) -> Self {
        Self {
            words: count_words(text),
            paragraphs: count_paragraphs(text),
            chars: text.chars().count() as u64,
        }
    }
}

fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

fn count_paragraphs(text: &str) -> u64 {
    if text.trim().is_empty() {
        return 0;
    }
    let normalized = text.replace("\r\n", "\n");
    normalized
        .trim()
        .split("\n\n")
        .filter(|segment| !segment.is_empty())
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_all_zero() {
        assert_eq!(TextStats::compute(""), TextStats::default());
    }

    #[test]
    fn whitespace_only_has_chars_but_no_words_or_paragraphs() {
        let stats = TextStats::compute("  \n\t ");
        assert_eq!(stats.words, 0);
        assert_eq!(stats.paragraphs, 0);
        assert_eq!(stats.chars, 5);
    }

    #[test]
    fn words_and_paragraphs_across_a_blank_line() {
        let stats = TextStats::compute("a b\n\nc");
        assert_eq!(stats.words, 3);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.chars, 6);
    }

    #[test]
    fn repeated_whitespace_produces_no_empty_words() {
        let stats = TextStats::compute("  one   two\t three \n");
        assert_eq!(stats.words, 3);
    }

    #[test]
    fn single_paragraph_without_blank_line() {
        let stats = TextStats::compute("line one\nline two\nline three");
        assert_eq!(stats.paragraphs, 1);
    }

    #[test]
    fn crlf_is_normalized_before_splitting() {
        let stats = TextStats::compute("first\r\n\r\nsecond\r\n\r\nthird");
        assert_eq!(stats.paragraphs, 3);
    }

    #[test]
    fn surrounding_blank_lines_do_not_add_paragraphs() {
        let stats = TextStats::compute("\n\nonly one\n\n");
        assert_eq!(stats.paragraphs, 1);
    }

    #[test]
    fn chars_count_scalar_values_not_bytes() {
        let stats = TextStats::compute("héllo");
        assert_eq!(stats.chars, 5);
    }

    #[test]
    fn astral_characters_count_once() {
        // U+1D11E is two UTF-16 code units and four UTF-8 bytes.
        let stats = TextStats::compute("𝄞 clef");
        assert_eq!(stats.chars, 6);
    }
}
