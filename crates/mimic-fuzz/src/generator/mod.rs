//! Synthetic data generation from tagged-pattern trees.
//!
//! [`FuzzGenerator::generate`] never fails. Canonical fixed patterns get a
//! dedicated typed generator, other tagged strings and regexes go through the
//! shorthand rewrite and the [`StrategyChain`], templates are rendered without
//! data, and plain literals are returned unchanged.

pub mod data;
pub mod shorthand;
pub mod strategy;

pub use strategy::{
    BoundedRegexStrategy, ExactRegexStrategy, GenerateError, RegexStrategy, StrategyChain,
};

use crate::config::FuzzConfig;
use crate::fixtures::FixtureStore;
use crate::tags::{
    is_email_pattern, strip_type_tags, BOOLEAN_PREFIX_REGEX, INT_PREFIX_REGEX,
    NUMBER_PREFIX_REGEX, PREFIX_TYPE_EXAMPLE, TAG_MARKER, TEMPLATE_MARKER, UINT_PREFIX_REGEX,
    WILD_REGEX,
};
use crate::template::TemplateEngine;
use crate::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shorthand::{is_literal, rewrite_shorthands};
use strategy::{DEFAULT_BOUNDED_LIMIT, DEFAULT_MAX_OUTPUT_LEN, DEFAULT_MAX_REPEAT};
use tracing::{debug, info, warn};

/// Generator handle. Owns its RNG, so independent handles share no state.
pub struct FuzzGenerator<R = StdRng> {
    rng: R,
    chain: StrategyChain,
    max_repeat: u32,
    bounded_limit: usize,
    fixtures: FixtureStore,
}

impl FuzzGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &FuzzConfig) -> Self {
        let generator = match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        };
        let generator = generator.with_limits(config.max_repeat, config.bounded_output_limit);
        match &config.fixtures_dir {
            Some(dir) => generator.with_fixtures(FixtureStore::new(dir)),
            None => generator,
        }
    }
}

impl Default for FuzzGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FuzzGenerator<R> {
    pub fn from_rng(rng: R) -> Self {
        Self {
            rng,
            chain: StrategyChain::default(),
            max_repeat: DEFAULT_MAX_REPEAT,
            bounded_limit: DEFAULT_BOUNDED_LIMIT,
            fixtures: FixtureStore::default(),
        }
    }

    pub fn with_limits(mut self, max_repeat: u32, bounded_limit: usize) -> Self {
        self.max_repeat = max_repeat;
        self.bounded_limit = bounded_limit;
        self.chain = StrategyChain::with_limits(max_repeat, bounded_limit);
        self
    }

    /// Replace the regex strategy chain.
    pub fn with_strategies(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_fixtures(mut self, fixtures: FixtureStore) -> Self {
        self.fixtures = fixtures;
        self
    }

    pub fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Independent generator seeded from this one, with the same settings.
    pub fn fork(&mut self) -> FuzzGenerator<StdRng> {
        FuzzGenerator::from_rng(StdRng::seed_from_u64(self.rng.gen()))
            .with_limits(self.max_repeat, self.bounded_limit)
            .with_fixtures(self.fixtures.clone())
    }

    /// Turn a tagged-pattern tree (or literal data) into a concrete value.
    pub fn generate(&mut self, value: &Value) -> Value {
        match value {
            Value::Str(s) => self.generate_string(s),
            Value::StrMap(m) => Value::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), self.generate_string(v)))
                    .collect(),
            ),
            Value::Map(m) => Value::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), self.generate(v)))
                    .collect(),
            ),
            Value::StrSeq(items) => {
                let out: Vec<Value> = items.iter().map(|s| self.generate_string(s)).collect();
                if out.iter().all(|v| matches!(v, Value::Str(_))) {
                    Value::StrSeq(out.into_iter().map(|v| v.to_string()).collect())
                } else {
                    Value::Seq(out)
                }
            }
            Value::Seq(items) => Value::Seq(items.iter().map(|v| self.generate(v)).collect()),
            Value::Unsupported(kind) => {
                info!(kind = %kind, "cannot populate unknown value type");
                value.clone()
            }
            other => other.clone(),
        }
    }

    /// Generate from a single tagged pattern, regex, template or literal.
    pub fn generate_string(&mut self, s: &str) -> Value {
        if s == NUMBER_PREFIX_REGEX {
            let magnitude = self.rng.gen_range(0..10_000) as f64;
            // exponential sample with rate 1
            let u: f64 = self.rng.gen();
            Value::Float(magnitude * -(1.0 - u).ln())
        } else if s == BOOLEAN_PREFIX_REGEX {
            Value::Bool(self.rng.gen())
        } else if s == UINT_PREFIX_REGEX {
            Value::Uint(self.rng.gen_range(0..10_000))
        } else if s == INT_PREFIX_REGEX {
            Value::Int(self.rng.gen_range(-100..10_000))
        } else if s.starts_with(TAG_MARKER) || s.starts_with('(') {
            Value::Str(self.rand_regex(s))
        } else if s.starts_with(TEMPLATE_MARKER) {
            Value::Str(self.render_template(s))
        } else if s.contains(WILD_REGEX) {
            Value::Str(self.rand_regex(s))
        } else {
            Value::Str(s.to_string())
        }
    }

    fn render_template(&mut self, template: &str) -> String {
        let engine = TemplateEngine::new().with_fixtures(self.fixtures.clone());
        let child = self.fork();
        match engine.render_with(template, &Value::Null, child) {
            Ok(out) => out,
            Err(err) => {
                debug!(error = %err, "template evaluation failed, using sentence");
                data::rand_sentence(&mut self.rng, 1, 3)
            }
        }
    }

    /// Random string for a (possibly tagged) regular expression.
    ///
    /// `__example__` values yield their literal body and email-shaped
    /// patterns yield a synthetic address. When every strategy fails the
    /// result is a short sentence.
    pub fn rand_regex(&mut self, pattern: &str) -> String {
        if pattern.contains(PREFIX_TYPE_EXAMPLE) {
            return strip_type_tags(pattern);
        }
        let pattern = strip_type_tags(pattern);
        if is_email_pattern(&pattern) {
            return data::rand_email(&mut self.rng);
        }
        let mut pattern = rewrite_shorthands(&pattern, &mut self.rng);
        if is_literal(&pattern) {
            truncate_at_boundary(&mut pattern, DEFAULT_MAX_OUTPUT_LEN);
            return pattern;
        }
        match self.chain.generate(&pattern, &mut self.rng) {
            Ok(out) => out,
            Err(err) => {
                warn!(pattern = %pattern, error = %err, "failed to parse regex");
                data::rand_sentence(&mut self.rng, 1, 5)
            }
        }
    }
}

fn truncate_at_boundary(s: &mut String, max_len: usize) {
    if s.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    debug!(len = s.len(), max_len, "truncating generated text");
    s.truncate(end);
}
