//! Random data helpers shared by the generator and the template functions.
//!
//! Every helper takes the RNG explicitly so seeded runs are reproducible.

use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::FirstName;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;

const TOP_LEVEL_DOMAINS: [&str; 6] = ["com", "org", "net", "io", "gov", "edu"];
const URL_SCHEMES: [&str; 4] = ["ftp", "http", "https", "mailto"];
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Longest run of letters or digits a single helper call produces.
pub const MAX_RUN_LEN: usize = 4096;

/// Most words (or sentences) a single helper call joins.
pub const MAX_WORDS: usize = 256;

/// Order `min..=max` and clamp both ends to `cap`.
fn clamp_bounds(min: usize, max: usize, cap: usize) -> (usize, usize) {
    let min = min.min(cap);
    (min, max.max(min).min(cap))
}

/// Uniform integer in `min..max`; `max == 0` means 100000.
pub fn rand_int_min_max<R: Rng>(rng: &mut R, min: i64, max: i64) -> i64 {
    let max = if max == 0 { 100_000 } else { max };
    if min >= max {
        return min;
    }
    rng.gen_range(min..max)
}

/// Uniform float in `min..max`; `max == 0.0` means 100000.
pub fn rand_float_min_max<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    let max = if max == 0.0 { 100_000.0 } else { max };
    if min >= max {
        return min;
    }
    min + rng.gen::<f64>() * (max - min)
}

/// A lorem word with between `min` and `max` letters, at most
/// [`MAX_RUN_LEN`].
pub fn rand_word<R: Rng>(rng: &mut R, min: usize, max: usize) -> String {
    let (min, max) = clamp_bounds(min, max, MAX_RUN_LEN);
    for _ in 0..16 {
        let word: String = Word().fake_with_rng(rng);
        if (min..=max).contains(&word.chars().count()) {
            return word;
        }
    }
    let len = rng.gen_range(min..=max);
    (0..len)
        .map(|_| char::from(LETTERS[rng.gen_range(0..LETTERS.len())]))
        .collect()
}

/// Between `min` and `max` lorem words joined by spaces.
pub fn rand_words<R: Rng>(rng: &mut R, min: usize, max: usize) -> String {
    let (min, max) = clamp_bounds(min, max, MAX_WORDS);
    let words: Vec<String> = Words(min..max.saturating_add(1)).fake_with_rng(rng);
    words.join(" ")
}

pub fn rand_sentence<R: Rng>(rng: &mut R, min: usize, max: usize) -> String {
    let (min, max) = clamp_bounds(min.max(1), max, MAX_WORDS);
    Sentence(min..max.saturating_add(1)).fake_with_rng(rng)
}

pub fn rand_paragraph<R: Rng>(rng: &mut R, min: usize, max: usize) -> String {
    let (min, max) = clamp_bounds(min.max(1), max, MAX_WORDS);
    Paragraph(min..max.saturating_add(1)).fake_with_rng(rng)
}

pub fn rand_name<R: Rng>(rng: &mut R) -> String {
    FirstName().fake_with_rng(rng)
}

pub fn rand_host<R: Rng>(rng: &mut R) -> String {
    let tld = TOP_LEVEL_DOMAINS.choose(rng).copied().unwrap_or("com");
    format!("{}.{}", rand_word(rng, 5, 10), tld).to_lowercase()
}

pub fn rand_url<R: Rng>(rng: &mut R) -> String {
    let scheme = URL_SCHEMES.choose(rng).copied().unwrap_or("https");
    format!("{}://{}", scheme, rand_host(rng)).to_lowercase()
}

pub fn rand_email<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}.{}@{}",
        rand_name(rng),
        rand_word(rng, 5, 10),
        rand_host(rng)
    )
    .to_lowercase()
}

/// US-style phone number, `1-ddd-ddd-dddd`.
pub fn rand_phone<R: Rng>(rng: &mut R) -> String {
    format!(
        "1-{}-{}-{}",
        rand_digits(rng, 3, 3),
        rand_digits(rng, 3, 3),
        rand_digits(rng, 4, 4)
    )
}

/// Between `min` and `max` digits, at most [`MAX_RUN_LEN`]; the first one
/// is never zero.
pub fn rand_digits<R: Rng>(rng: &mut R, min: usize, max: usize) -> String {
    let (min, max) = clamp_bounds(min, max, MAX_RUN_LEN);
    let len = rng.gen_range(min..=max);
    (0..len)
        .map(|i| {
            let d = if i == 0 {
                rng.gen_range(1..=9u8)
            } else {
                rng.gen_range(0..=9u8)
            };
            char::from(b'0' + d)
        })
        .collect()
}

/// A word of exactly `n` letters, or an empty string for `n == 0`.
pub fn rand_string<R: Rng>(rng: &mut R, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    rand_word(rng, n, n)
}

/// Random version 4 UUID drawn from `rng`.
pub fn rand_uuid<R: Rng>(rng: &mut R) -> String {
    uuid::Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string()
}

/// Pick one whitespace-separated token out of all `values`.
pub fn enum_string<R: Rng>(rng: &mut R, values: &[String]) -> String {
    let parts: Vec<&str> = values.iter().flat_map(|v| v.split_whitespace()).collect();
    parts.choose(rng).map(|s| s.to_string()).unwrap_or_default()
}
