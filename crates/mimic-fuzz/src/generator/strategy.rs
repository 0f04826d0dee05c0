//! Regex-to-string generation strategies.
//!
//! Strategies are tried in order by [`StrategyChain`]; the first one that
//! produces a string wins. Each strategy walks the parsed HIR of the pattern
//! and picks a random branch, repetition count and class member.

use rand::{Rng, RngCore};
use regex::Regex;
use regex_syntax::hir::{Class, Hir, HirKind, Literal};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Extra repetitions allowed for unbounded quantifiers (`*`, `+`, `{n,}`).
pub const DEFAULT_MAX_REPEAT: u32 = 10;

/// Output cap for the exact strategy.
pub const DEFAULT_MAX_OUTPUT_LEN: usize = 4096;

/// Output cap for the bounded strategy.
pub const DEFAULT_BOUNDED_LIMIT: usize = 64;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] Box<regex_syntax::Error>),
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
    #[error("generated output exceeds {limit} bytes")]
    TooLong { limit: usize },
    #[error("character class is empty")]
    EmptyClass,
    #[error("generated bytes are not valid UTF-8")]
    NonUtf8,
}

pub trait RegexStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, pattern: &str, rng: &mut dyn RngCore) -> Result<String, GenerateError>;
}

fn parse(pattern: &str) -> Result<Hir, GenerateError> {
    regex_syntax::ParserBuilder::new()
        .build()
        .parse(pattern)
        .map_err(|e| GenerateError::InvalidPattern(Box::new(e)))
}

/// Walks the full pattern and fails rather than truncating.
#[derive(Debug, Clone)]
pub struct ExactRegexStrategy {
    pub max_repeat: u32,
    pub max_len: usize,
}

impl Default for ExactRegexStrategy {
    fn default() -> Self {
        Self {
            max_repeat: DEFAULT_MAX_REPEAT,
            max_len: DEFAULT_MAX_OUTPUT_LEN,
        }
    }
}

impl RegexStrategy for ExactRegexStrategy {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn generate(&self, pattern: &str, rng: &mut dyn RngCore) -> Result<String, GenerateError> {
        let hir = parse(pattern)?;
        let mut walker = HirWalker {
            rng,
            max_repeat: self.max_repeat,
            max_len: self.max_len,
            out: Vec::new(),
        };
        walker.emit(&hir)?;
        String::from_utf8(walker.out).map_err(|_| GenerateError::NonUtf8)
    }
}

static LOOKAROUND_REGEX: OnceLock<Regex> = OnceLock::new();
static BACKREF_REGEX: OnceLock<Regex> = OnceLock::new();

fn lookaround_regex() -> &'static Regex {
    LOOKAROUND_REGEX.get_or_init(|| Regex::new(r"\(\?<?[=!][^()]*\)").unwrap())
}

fn backref_regex() -> &'static Regex {
    BACKREF_REGEX.get_or_init(|| Regex::new(r"\\[1-9]").unwrap())
}

/// Lenient fallback: drops constructs the parser rejects (lookarounds,
/// backreferences), keeps repetitions short and truncates the output.
#[derive(Debug, Clone)]
pub struct BoundedRegexStrategy {
    pub limit: usize,
}

impl Default for BoundedRegexStrategy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BOUNDED_LIMIT,
        }
    }
}

impl BoundedRegexStrategy {
    fn simplify(pattern: &str) -> String {
        let pattern = lookaround_regex().replace_all(pattern, "");
        backref_regex().replace_all(&pattern, "").into_owned()
    }
}

impl RegexStrategy for BoundedRegexStrategy {
    fn name(&self) -> &'static str {
        "bounded"
    }

    fn generate(&self, pattern: &str, rng: &mut dyn RngCore) -> Result<String, GenerateError> {
        let hir = parse(&Self::simplify(pattern))?;
        let mut walker = HirWalker {
            rng,
            max_repeat: 2,
            max_len: self.limit.saturating_mul(4),
            out: Vec::new(),
        };
        // stop early once well past the cap; the tail is truncated below
        match walker.emit(&hir) {
            Err(GenerateError::TooLong { .. }) | Ok(()) => {}
            Err(err) => return Err(err),
        }
        let mut out = String::from_utf8(walker.out).map_err(|_| GenerateError::NonUtf8)?;
        if out.len() > self.limit {
            let mut end = self.limit;
            while !out.is_char_boundary(end) {
                end -= 1;
            }
            out.truncate(end);
        }
        Ok(out)
    }
}

struct HirWalker<'r> {
    rng: &'r mut dyn RngCore,
    max_repeat: u32,
    max_len: usize,
    out: Vec<u8>,
}

impl HirWalker<'_> {
    fn emit(&mut self, hir: &Hir) -> Result<(), GenerateError> {
        match hir.kind() {
            HirKind::Empty | HirKind::Look(_) => {}
            HirKind::Literal(Literal(bytes)) => self.out.extend_from_slice(bytes),
            HirKind::Class(class) => self.emit_class(class)?,
            HirKind::Repetition(rep) => {
                let max = rep
                    .max
                    .unwrap_or_else(|| rep.min.saturating_add(self.max_repeat));
                let count = self.rng.gen_range(rep.min..=max.max(rep.min));
                for _ in 0..count {
                    self.emit(&rep.sub)?;
                    self.check_len()?;
                }
            }
            HirKind::Capture(cap) => self.emit(&cap.sub)?,
            HirKind::Concat(subs) => {
                for sub in subs {
                    self.emit(sub)?;
                    self.check_len()?;
                }
            }
            HirKind::Alternation(alts) => {
                if alts.is_empty() {
                    return Ok(());
                }
                let i = self.rng.gen_range(0..alts.len());
                self.emit(&alts[i])?;
            }
        }
        self.check_len()
    }

    fn check_len(&self) -> Result<(), GenerateError> {
        if self.out.len() > self.max_len {
            return Err(GenerateError::TooLong {
                limit: self.max_len,
            });
        }
        Ok(())
    }

    fn emit_class(&mut self, class: &Class) -> Result<(), GenerateError> {
        match class {
            Class::Unicode(ranges) => {
                let spans: Vec<(u32, u32)> = ranges
                    .iter()
                    .map(|r| (r.start() as u32, r.end() as u32))
                    .collect();
                let code = self.pick(&spans)?;
                let c = char::from_u32(code)
                    .or_else(|| ranges.iter().next().map(|r| r.start()))
                    .ok_or(GenerateError::EmptyClass)?;
                let mut buf = [0u8; 4];
                self.out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            Class::Bytes(ranges) => {
                let spans: Vec<(u32, u32)> = ranges
                    .iter()
                    .map(|r| (u32::from(r.start()), u32::from(r.end())))
                    .collect();
                let code = self.pick(&spans)?;
                self.out
                    .push(u8::try_from(code).map_err(|_| GenerateError::EmptyClass)?);
            }
        }
        Ok(())
    }

    /// Pick a code point from `spans`, preferring printable ASCII members.
    fn pick(&mut self, spans: &[(u32, u32)]) -> Result<u32, GenerateError> {
        let printable: Vec<(u32, u32)> = spans
            .iter()
            .filter_map(|&(lo, hi)| {
                let lo = lo.max(0x20);
                let hi = hi.min(0x7E);
                (lo <= hi).then_some((lo, hi))
            })
            .collect();
        let pool: &[(u32, u32)] = if printable.is_empty() {
            spans
        } else {
            &printable
        };
        let total: u64 = pool.iter().map(|&(lo, hi)| u64::from(hi - lo) + 1).sum();
        if total == 0 {
            return Err(GenerateError::EmptyClass);
        }
        let mut n = self.rng.gen_range(0..total);
        for &(lo, hi) in pool {
            let size = u64::from(hi - lo) + 1;
            if n < size {
                return Ok(lo + n as u32);
            }
            n -= size;
        }
        Err(GenerateError::EmptyClass)
    }
}

/// Ordered list of strategies; the first success wins.
pub struct StrategyChain {
    strategies: Vec<Box<dyn RegexStrategy>>,
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ExactRegexStrategy::default()),
            Box::new(BoundedRegexStrategy::default()),
        ])
    }
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn RegexStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the default two-step chain with explicit limits.
    pub fn with_limits(max_repeat: u32, bounded_limit: usize) -> Self {
        Self::new(vec![
            Box::new(ExactRegexStrategy {
                max_repeat,
                max_len: DEFAULT_MAX_OUTPUT_LEN,
            }),
            Box::new(BoundedRegexStrategy {
                limit: bounded_limit,
            }),
        ])
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run each strategy in turn, returning the last error if all fail.
    pub fn generate(&self, pattern: &str, rng: &mut dyn RngCore) -> Result<String, GenerateError> {
        let mut last = GenerateError::Unsupported("no strategies configured");
        for strategy in &self.strategies {
            match strategy.generate(pattern, rng) {
                Ok(out) => return Ok(out),
                Err(err) => {
                    debug!(strategy = strategy.name(), error = %err, "regex strategy failed");
                    last = err;
                }
            }
        }
        Err(last)
    }
}
