// src/density.rs
//! Keyword density engine: word tokenizer, literal phrase matcher, and scoring.
//!
//! Pure functions only. Callers on a hot UI/update path should memoize by
//! `(text, keyword)`; cost is linear in the text length.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Word tokens: runs of Unicode word characters and apostrophes, trimmed to
/// word boundaries so "'quoted'" yields `quoted` but "don't" stays whole.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w']+\b").expect("word regex"));

/// Single-char check of what the regex engine considers a word character.
static WORD_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w$").expect("word-char regex"));

/// Figures for one (text, keyword) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_words: usize,
    pub occurrence_count: usize,
    /// Percentage, rounded half away from zero to 2 decimals.
    pub density_percent: f64,
}

impl AnalysisResult {
    pub const EMPTY: AnalysisResult = AnalysisResult {
        total_words: 0,
        occurrence_count: 0,
        density_percent: 0.0,
    };

    /// Fixed two-decimal rendering, e.g. `"3.00"`.
    pub fn density_display(&self) -> String {
        format!("{:.2}", self.density_percent)
    }
}

/// Scores `keyword` against `text`.
///
/// Returns `None` when the trimmed keyword is empty; there is nothing to score.
/// Never panics, whatever the input.
pub fn analyze(text: &str, keyword: &str) -> Option<AnalysisResult> {
    let matcher = KeywordMatcher::new(keyword)?;
    Some(matcher.analyze(text))
}

/// Number of word tokens in `text` (case does not matter for counting).
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// `(part / whole) * 100`, rounded to 2 decimals. Zero when `whole == 0`.
pub fn density_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Compiled literal matcher for one keyword/phrase.
///
/// Each end of the phrase is anchored by a boundary assertion chosen from the
/// edge character: `\b` for a word character, `\B` otherwise. Either way the
/// neighbouring text character must be a non-word character or the string edge.
/// Whitespace runs inside the phrase match any whitespace run in the text.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keyword: String,
    pattern: Pattern,
}

#[derive(Debug, Clone)]
enum Pattern {
    Compiled(Regex),
    /// Keyword too large for the regex size limit. Same rule, scanned by hand
    /// over the whitespace-separated parts.
    Literal(Vec<String>),
}

impl KeywordMatcher {
    /// `None` for a blank keyword, and only then.
    pub fn new(keyword: &str) -> Option<Self> {
        let normalized = keyword.to_lowercase().trim().to_string();
        let first = normalized.chars().next()?;
        let last = normalized.chars().next_back()?;

        let parts = normalized
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let body = parts
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join(r"\s+");
        let source = format!("{}{}{}", edge_assertion(first), body, edge_assertion(last));

        let pattern = match RegexBuilder::new(&source).build() {
            Ok(re) => Pattern::Compiled(re),
            Err(e) => {
                warn!(
                    error = %e,
                    keyword_len = normalized.len(),
                    "keyword regex rejected, scanning literally"
                );
                Pattern::Literal(parts)
            }
        };
        Some(Self {
            keyword: normalized,
            pattern,
        })
    }

    /// Lowercased, trimmed keyword this matcher was built from.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Non-overlapping matches in `haystack`. Expects lowercased input.
    pub fn count(&self, haystack: &str) -> usize {
        match &self.pattern {
            Pattern::Compiled(re) => re.find_iter(haystack).count(),
            Pattern::Literal(parts) => count_literal(parts, haystack),
        }
    }

    /// Full analysis of `text` for this keyword.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let lowered = text.to_lowercase();
        let total_words = count_words(&lowered);
        if total_words == 0 {
            return AnalysisResult::EMPTY;
        }

        let occurrence_count = self.count(&lowered);
        AnalysisResult {
            total_words,
            occurrence_count,
            density_percent: density_percent(occurrence_count, total_words),
        }
    }
}

/// Leftmost, non-overlapping scan with the same edge and whitespace rules as
/// the compiled pattern. `parts` is non-empty with no blank entries.
fn count_literal(parts: &[String], haystack: &str) -> usize {
    let Some(head) = parts.first() else {
        return 0;
    };
    let mut count = 0;
    let mut pos = 0;
    while let Some(off) = haystack[pos..].find(head.as_str()) {
        let start = pos + off;
        match literal_match_end(parts, haystack, start) {
            Some(end) => {
                count += 1;
                pos = end;
            }
            None => {
                pos = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
            }
        }
        if pos >= haystack.len() {
            break;
        }
    }
    count
}

fn literal_match_end(parts: &[String], haystack: &str, start: usize) -> Option<usize> {
    if haystack[..start].chars().next_back().is_some_and(is_word_char) {
        return None;
    }
    let mut end = start;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            let rest = &haystack[end..];
            let gap = rest.len() - rest.trim_start().len();
            if gap == 0 {
                return None;
            }
            end += gap;
        }
        if !haystack[end..].starts_with(part.as_str()) {
            return None;
        }
        end += part.len();
    }
    if haystack[end..].chars().next().is_some_and(is_word_char) {
        return None;
    }
    Some(end)
}

fn edge_assertion(c: char) -> &'static str {
    if is_word_char(c) {
        r"\b"
    } else {
        r"\B"
    }
}

fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    WORD_CHAR_RE.is_match(c.encode_utf8(&mut buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, w: &str) -> String {
        vec![w; n].join(" ")
    }

    #[test]
    fn blank_keyword_yields_no_result() {
        for kw in ["", "   ", "\t\n", "\u{3000}"] {
            assert_eq!(analyze("some text here", kw), None, "keyword {kw:?}");
        }
    }

    #[test]
    fn punctuation_only_text_has_zero_words_and_density() {
        for text in ["", "   ", "!!! ... ---", "## **  ** >", "''' ' '"] {
            let r = analyze(text, "seo").expect("keyword is not blank");
            assert_eq!(r.total_words, 0, "text {text:?}");
            assert_eq!(r.occurrence_count, 0);
            assert_eq!(r.density_percent, 0.0);
            assert_eq!(r.density_display(), "0.00");
        }
    }

    #[test]
    fn same_input_same_output() {
        let text = "Leather bags, leather wallets and more leather.";
        let a = analyze(text, "leather");
        let b = analyze(text, "leather");
        assert_eq!(a, b);
        assert_eq!(a.map(|r| r.occurrence_count), Some(3));
    }

    #[test]
    fn matching_ignores_case_on_both_sides() {
        let a = analyze("Widgets are great", "widgets").unwrap();
        let b = analyze("widgets are great", "WIDGETS").unwrap();
        assert_eq!(a.occurrence_count, 1);
        assert_eq!(a.occurrence_count, b.occurrence_count);
    }

    #[test]
    fn no_partial_word_matches() {
        let r = analyze("category of cats", "cat").unwrap();
        assert_eq!(r.occurrence_count, 0);
        assert_eq!(r.total_words, 3);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let r = analyze("cost is $5.99 (approx)", "$5.99").unwrap();
        assert_eq!(r.occurrence_count, 1);
        // cost, is, 5, 99, approx
        assert_eq!(r.total_words, 5);
        assert_eq!(r.density_display(), "20.00");

        // "." must not act as a wildcard
        assert_eq!(analyze("cost is $5x99", "$5.99").unwrap().occurrence_count, 0);

        for kw in ["(a+)*", "[", "\\", "^$", "a|b", "{2}", "?"] {
            let r = analyze("plain words (a+)* here", kw);
            assert!(r.is_some(), "keyword {kw:?}");
        }
        assert_eq!(
            analyze("plain words (a+)* here", "(a+)*").unwrap().occurrence_count,
            1
        );
    }

    #[test]
    fn non_word_edges_still_require_separation() {
        // '(' preceded by a word character is not a standalone match
        assert_eq!(analyze("x(approx) y", "(approx)").unwrap().occurrence_count, 0);
        assert_eq!(analyze("x (approx) y", "(approx)").unwrap().occurrence_count, 1);
    }

    #[test]
    fn density_of_three_in_hundred_words() {
        let text = format!("{} {}", words(3, "seo"), words(97, "filler"));
        let r = analyze(&text, "seo").unwrap();
        assert_eq!(r.total_words, 100);
        assert_eq!(r.occurrence_count, 3);
        assert_eq!(r.density_percent, 3.0);
        assert_eq!(r.density_display(), "3.00");
    }

    #[test]
    fn multi_word_phrase_counts_whole_phrases() {
        let r = analyze(
            "the vintage bag charm is rare, this vintage bag charm sells",
            "vintage bag charm",
        )
        .unwrap();
        assert_eq!(r.occurrence_count, 2);
        assert_eq!(r.total_words, 11);
        assert_eq!(r.density_percent, 18.18);
    }

    #[test]
    fn phrase_spans_line_breaks_and_extra_spaces() {
        let text = "## Vintage\nbag guide\n\nA vintage   bag lasts.";
        let r = analyze(text, "  vintage bag ").unwrap();
        assert_eq!(r.occurrence_count, 2);
    }

    #[test]
    fn apostrophes_belong_to_words() {
        assert_eq!(count_words("don't stop"), 2);
        assert_eq!(count_words("'quoted' words"), 2);
        assert_eq!(analyze("Don't panic. don't!", "don't").unwrap().occurrence_count, 2);
    }

    #[test]
    fn markdown_markup_is_not_counted() {
        let r = analyze("# Title\n\n**Bold** and *it* - [link](x)", "bold").unwrap();
        // title, bold, and, it, link, x
        assert_eq!(r.total_words, 6);
        assert_eq!(r.occurrence_count, 1);
    }

    #[test]
    fn unicode_words_are_tokenized_and_matched() {
        let r = analyze("Café au lait, CAFÉ noir", "café").unwrap();
        assert_eq!(r.total_words, 5);
        assert_eq!(r.occurrence_count, 2);
        assert_eq!(analyze("Cafés only", "café").unwrap().occurrence_count, 0);
    }

    #[test]
    fn hyphenated_keyword_counts_once_but_tokenizes_twice() {
        let r = analyze("e-commerce tips for e-commerce", "e-commerce").unwrap();
        assert_eq!(r.total_words, 6);
        assert_eq!(r.occurrence_count, 2);
        assert_eq!(r.density_percent, 33.33);
    }

    #[test]
    fn occurrences_may_exceed_word_count() {
        let r = analyze("x . .", ".").unwrap();
        assert_eq!(r.total_words, 1);
        assert_eq!(r.occurrence_count, 2);
        assert_eq!(r.density_percent, 200.0);
    }

    #[test]
    fn keyword_absent_or_longer_than_text() {
        let r = analyze("short", "a much longer keyword phrase").unwrap();
        assert_eq!(r.total_words, 1);
        assert_eq!(r.occurrence_count, 0);
        assert_eq!(r.density_percent, 0.0);
    }

    #[test]
    fn keyword_equal_to_whole_text() {
        let r = analyze("Vintage Bag", "vintage bag").unwrap();
        assert_eq!(r.total_words, 2);
        assert_eq!(r.occurrence_count, 1);
        assert_eq!(r.density_percent, 50.0);
    }

    #[test]
    fn rounding_is_two_decimals_half_away_from_zero() {
        assert_eq!(density_percent(1, 3), 33.33);
        assert_eq!(density_percent(2, 3), 66.67);
        assert_eq!(density_percent(1, 8), 12.5);
        assert_eq!(density_percent(5, 0), 0.0);
    }

    #[test]
    fn matcher_exposes_normalized_keyword() {
        let m = KeywordMatcher::new("  Vintage BAG ").unwrap();
        assert_eq!(m.keyword(), "vintage bag");
        assert!(KeywordMatcher::new(" ").is_none());
    }

    fn literal(keyword: &str) -> KeywordMatcher {
        let keyword = keyword.to_lowercase().trim().to_string();
        let parts = keyword.split_whitespace().map(str::to_string).collect();
        KeywordMatcher {
            keyword,
            pattern: Pattern::Literal(parts),
        }
    }

    #[test]
    fn literal_scan_agrees_with_compiled_pattern() {
        let cases = [
            ("category of cats, cat!", "cat"),
            ("cost is $5.99 (approx)", "$5.99"),
            ("x(approx) y (approx)", "(approx)"),
            ("## vintage\nbag guide. a vintage   bag lasts", "vintage bag"),
            ("vintage bags and vintage bag", "vintage bag"),
            ("e-commerce tips for e-commerce", "e-commerce"),
            ("x . .", "."),
            ("café au lait, café noir, cafés", "café"),
            ("don't panic. don't!", "don't"),
            ("aaaa aa aa", "aa"),
        ];
        for (text, kw) in cases {
            let compiled = KeywordMatcher::new(kw).unwrap();
            assert!(matches!(compiled.pattern, Pattern::Compiled(_)));
            assert_eq!(
                literal(kw).count(text),
                compiled.count(text),
                "text {text:?} keyword {kw:?}"
            );
        }
    }

    #[test]
    fn very_long_keyword_still_scores() {
        let long = words(50_000, "word");

        let r = analyze("word word", &long).expect("non-blank keyword must score");
        assert_eq!(r.total_words, 2);
        assert_eq!(r.occurrence_count, 0);
        assert_eq!(r.density_percent, 0.0);

        let r = analyze(&format!("intro {long} outro"), &long).unwrap();
        assert_eq!(r.total_words, 50_002);
        assert_eq!(r.occurrence_count, 1);
    }
}
