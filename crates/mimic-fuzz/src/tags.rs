//! Type-tag vocabulary and canonical fixed patterns.
//!
//! These strings are persisted inside stored scenarios and exchanged with
//! other subsystems, so their spelling must never change.

use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

pub const PREFIX_TYPE_NUMBER: &str = "__number__";
pub const PREFIX_TYPE_BOOLEAN: &str = "__boolean__";
pub const PREFIX_TYPE_STRING: &str = "__string__";
pub const PREFIX_TYPE_EXAMPLE: &str = "__example__";
pub const PREFIX_TYPE_OBJECT: &str = "__object__";
pub const PREFIX_TYPE_ARRAY: &str = "__array__";

/// Every tag, in the order they are stripped.
pub const ALL_TAGS: [&str; 6] = [
    PREFIX_TYPE_NUMBER,
    PREFIX_TYPE_BOOLEAN,
    PREFIX_TYPE_EXAMPLE,
    PREFIX_TYPE_STRING,
    PREFIX_TYPE_OBJECT,
    PREFIX_TYPE_ARRAY,
];

/// Common prefix shared by all tags.
pub const TAG_MARKER: &str = "__";

// Canonical fixed patterns. The generator takes its fast path only on a
// byte-identical match with one of these.
pub const UINT_PREFIX_REGEX: &str = r"__number__\d{1,10}";
pub const INT_PREFIX_REGEX: &str = r"__number__[+-]?\d{1,10}";
pub const NUMBER_PREFIX_REGEX: &str = r"__number__[+-]?((\d{1,10}(\.\d{1,5})?)|(\.\d{1,10}))";
pub const BOOLEAN_PREFIX_REGEX: &str = "__boolean__(false|true)";

pub const EMAIL_REGEX: &str = r"\w+@\w+\\.\w+";
pub const EMAIL_REGEX2: &str = r"\w+@\w+.?\w+";
pub const EMAIL_REGEX3: &str = r".+@.+\..+";
pub const EMAIL_REGEX4: &str = r".+@.+\\..+";

/// Email-shaped fragments the generator answers with a synthetic address.
pub const EMAIL_FRAGMENTS: [&str; 4] = [EMAIL_REGEX, EMAIL_REGEX2, EMAIL_REGEX3, EMAIL_REGEX4];

pub const ANY_WORD_REGEX: &str = r"\w+";
pub const WILD_REGEX: &str = ".+";

/// Marker opening a template expression.
pub const TEMPLATE_MARKER: &str = "{{";

static TAG_STRIPPER: OnceLock<AhoCorasick> = OnceLock::new();

fn tag_stripper() -> &'static AhoCorasick {
    TAG_STRIPPER.get_or_init(|| AhoCorasick::new(ALL_TAGS).expect("tag automaton builds"))
}

/// Remove every type tag, wherever it occurs, leaving the regex body.
pub fn strip_type_tags(pattern: &str) -> String {
    tag_stripper().replace_all(pattern, &[""; 6])
}

/// Prefix `body` with the string tag.
pub fn string_pattern(body: &str) -> String {
    format!("{PREFIX_TYPE_STRING}{body}")
}

/// Wildcard string pattern used when a shape cannot be merged safely.
pub fn wildcard_string_pattern() -> String {
    string_pattern(WILD_REGEX)
}

/// True when `pattern` contains one of the known email fragments.
pub fn is_email_pattern(pattern: &str) -> bool {
    EMAIL_FRAGMENTS.iter().any(|fragment| pattern.contains(fragment))
}
