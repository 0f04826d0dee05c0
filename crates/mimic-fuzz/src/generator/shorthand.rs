//! Rewriting of greedy word/digit shorthands into concrete text.
//!
//! Inferred patterns are dominated by `\w+` and `\d{m,n}`. Replacing those
//! with readable words and numbers before regex generation keeps synthetic
//! values realistic; whatever regex syntax remains is left to the strategy
//! chain.

use super::data;
use rand::Rng;

const WORD_TAGS: [&str; 3] = ["(.+)", r"\\w", r"\w"];
const DIGIT_TAGS: [&str; 2] = [r"\\d", r"\d"];

/// Characters that mark a pattern as still needing regex generation.
const REGEX_MARKERS: [char; 5] = ['\\', '+', '*', '[', '('];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    OneOrMore,
    Range(usize, usize),
    One,
}

/// Replace every word and digit shorthand with escaped random text.
pub fn rewrite_shorthands<R: Rng>(pattern: &str, rng: &mut R) -> String {
    let mut out = pattern.to_string();
    for tag in WORD_TAGS {
        out = replace_tag(&out, tag, |repeat| match repeat {
            Repeat::OneOrMore => data::rand_words(rng, 3, 6),
            Repeat::Range(min, max) => data::rand_words(rng, min, max),
            Repeat::One => data::rand_word(rng, 3, 6),
        });
    }
    for tag in DIGIT_TAGS {
        out = replace_tag(&out, tag, |repeat| match repeat {
            Repeat::OneOrMore => rng.gen_range(1..10_000).to_string(),
            Repeat::Range(min, max) => data::rand_digits(rng, min, max),
            Repeat::One => rng.gen_range(0..=9).to_string(),
        });
    }
    out
}

/// True when nothing regex-like is left and the text can be used verbatim.
pub fn is_literal(pattern: &str) -> bool {
    !pattern.contains(REGEX_MARKERS)
}

fn replace_tag(pattern: &str, tag: &str, mut fill: impl FnMut(Repeat) -> String) -> String {
    let mut out = pattern.to_string();

    let plus = format!("{tag}+");
    while let Some(start) = out.find(&plus) {
        let text = regex::escape(&fill(Repeat::OneOrMore));
        out.replace_range(start..start + plus.len(), &text);
    }

    let brace = format!("{tag}{{");
    while let Some(start) = out.find(&brace) {
        let (min, max, end) = parse_bounds(&out, start + brace.len());
        let text = regex::escape(&fill(Repeat::Range(min, max)));
        out.replace_range(start..end, &text);
    }

    while let Some(start) = out.find(tag) {
        let text = regex::escape(&fill(Repeat::One));
        out.replace_range(start..start + tag.len(), &text);
    }
    out
}

/// Parse `m,n}` / `n}` starting at `from`; returns `(min, max, end)` where
/// `end` is one past the closing brace. Counts are capped at
/// [`data::MAX_RUN_LEN`].
fn parse_bounds(s: &str, from: usize) -> (usize, usize, usize) {
    let mut min = None;
    let mut digits = String::new();
    let mut end = s.len();
    for (i, b) in s.bytes().enumerate().skip(from) {
        match b {
            b',' => {
                min = Some(parse_count(&digits));
                digits.clear();
            }
            b'}' => {
                end = i + 1;
                break;
            }
            b'0'..=b'9' => digits.push(char::from(b)),
            _ => {}
        }
    }
    let max = parse_count(&digits);
    let min = min.unwrap_or(max);
    (min, max.max(min), end)
}

fn parse_count(digits: &str) -> usize {
    if digits.is_empty() {
        return 0;
    }
    // only ASCII digits reach here, so a parse failure is an overflow
    digits.parse().unwrap_or(usize::MAX).min(data::MAX_RUN_LEN)
}
