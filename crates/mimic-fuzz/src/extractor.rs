//! Type-pattern inference: concrete value tree -> tagged pattern tree.
//!
//! Scalars become tagged patterns (`__number__[+-]?\d{1,10}`, ...), strings
//! get a character-class pattern inferred from their content, and containers
//! are rebuilt with the same shape.

use crate::tags::{
    string_pattern, ANY_WORD_REGEX, BOOLEAN_PREFIX_REGEX, INT_PREFIX_REGEX, NUMBER_PREFIX_REGEX,
    UINT_PREFIX_REGEX,
};
use crate::template_request::DataTemplateRequest;
use crate::value::Value;
use tracing::info;

/// Characters that end any pending run and are re-emitted literally.
const BOUNDARY_CHARS: [char; 7] = ['@', '%', '(', ')', '#', '$', '*'];

/// Convert a concrete value into a tagged-pattern tree of the same shape.
///
/// Returns `None` for null and unsupported nodes. Inside containers an absent
/// child is kept as `Value::Null`, which every consumer treats as
/// unconstrained.
pub fn extract_types(value: &Value, request: &DataTemplateRequest) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(Value::Str(BOOLEAN_PREFIX_REGEX.to_string())),
        Value::Int(_) => Some(Value::Str(INT_PREFIX_REGEX.to_string())),
        Value::Uint(_) => Some(Value::Str(UINT_PREFIX_REGEX.to_string())),
        Value::Float(x) => {
            if x.is_finite() && *x == x.trunc() {
                Some(Value::Str(INT_PREFIX_REGEX.to_string()))
            } else {
                Some(Value::Str(NUMBER_PREFIX_REGEX.to_string()))
            }
        }
        Value::Str(s) => Some(Value::Str(string_type_pattern(s, request))),
        Value::StrMap(m) => Some(Value::StrMap(m.clone())),
        Value::Map(m) => Some(Value::Map(
            m.iter()
                .map(|(k, v)| (k.clone(), extract_types(v, request).unwrap_or_default()))
                .collect(),
        )),
        Value::StrSeq(items) => Some(Value::StrSeq(
            items
                .iter()
                .map(|s| string_type_pattern(s, request))
                .collect(),
        )),
        Value::Seq(items) => Some(Value::Seq(
            items
                .iter()
                .map(|v| extract_types(v, request).unwrap_or_default())
                .collect(),
        )),
        Value::Unsupported(kind) => {
            info!(kind = %kind, "cannot extract unknown value type");
            None
        }
    }
}

/// Tagged pattern for a single string value.
pub fn string_type_pattern(value: &str, request: &DataTemplateRequest) -> String {
    if value.is_empty() {
        return string_pattern(&format!("[a-z]{{1,{}}}", request.min_multiplier * 10));
    }
    string_pattern(&value_to_regex(value, request))
}

/// Infer an untagged regex for `value` from its character classes.
///
/// Digit runs become bounded `\d{m,n}` groups, a `.` after digits starts a
/// fractional group, a leading `-` marks a sign, and every other run of
/// characters collapses to `\w+`.
pub fn value_to_regex(value: &str, request: &DataTemplateRequest) -> String {
    let mut builder = RunBuilder::new(request);
    for c in value.chars() {
        builder.push(c);
    }
    builder.finish()
}

struct RunBuilder<'a> {
    request: &'a DataTemplateRequest,
    out: String,
    negative: bool,
    decimal: bool,
    digits: usize,
    fraction: usize,
    alphabets: usize,
}

impl<'a> RunBuilder<'a> {
    fn new(request: &'a DataTemplateRequest) -> Self {
        Self {
            request,
            out: String::new(),
            negative: false,
            decimal: false,
            digits: 0,
            fraction: 0,
            alphabets: 0,
        }
    }

    fn push(&mut self, c: char) {
        if c.is_ascii_digit() {
            self.flush_alphabets();
            if self.decimal {
                self.fraction += 1;
            } else {
                self.digits += 1;
            }
        } else if c == '.' {
            if self.digits > 0 && !self.decimal {
                self.decimal = true;
            } else {
                // a second dot ends the number, e.g. version strings
                self.flush_alphabets();
                self.flush_digits();
                self.out.push_str(".?");
            }
        } else if BOUNDARY_CHARS.contains(&c) {
            self.flush_alphabets();
            self.flush_digits();
            self.out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        } else if c == '-' {
            if self.digits == 0 && self.alphabets == 0 {
                self.negative = true;
            } else {
                self.flush_digits();
                self.flush_alphabets();
                self.out.push_str("[-]");
            }
        } else {
            self.flush_digits();
            self.alphabets += 1;
        }
    }

    fn flush_alphabets(&mut self) {
        if self.alphabets > 0 {
            self.out.push_str(ANY_WORD_REGEX);
            self.alphabets = 0;
        }
    }

    fn flush_digits(&mut self) {
        if self.digits > 0 {
            let min = self.request.min_multiplier;
            let max = self.request.max_multiplier;
            if self.negative {
                self.out.push_str("[+-]?");
            }
            self.out
                .push_str(&format!(r"\d{{{},{}}}", min * self.digits, max * self.digits));
            if self.decimal {
                self.out.push_str(&format!(
                    r"\.\d{{{},{}}}",
                    min * self.fraction,
                    max * self.fraction
                ));
            }
        }
        self.digits = 0;
        self.fraction = 0;
        self.negative = false;
        self.decimal = false;
    }

    fn finish(mut self) -> String {
        self.flush_alphabets();
        self.flush_digits();
        self.out
    }
}
