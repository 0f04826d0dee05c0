//! Run-length scaling used when synthesizing quantifiers.

use serde::{Deserialize, Serialize};

/// Immutable settings for pattern inference.
///
/// `min_multiplier` and `max_multiplier` scale the bounds of every digit
/// run, e.g. five digits with multipliers 1/2 become `\d{5,10}`. Copies are
/// produced with the `with_*` builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataTemplateRequest {
    #[serde(default)]
    pub include_type: bool,
    #[serde(default = "default_multiplier")]
    pub min_multiplier: usize,
    #[serde(default = "default_multiplier")]
    pub max_multiplier: usize,
}

fn default_multiplier() -> usize {
    1
}

impl Default for DataTemplateRequest {
    fn default() -> Self {
        Self::new(false, 1, 1)
    }
}

impl DataTemplateRequest {
    /// Multipliers are clamped so that `1 <= min <= max`; anything else
    /// would produce quantifiers the regex engine rejects.
    pub fn new(include_type: bool, min_multiplier: usize, max_multiplier: usize) -> Self {
        let min_multiplier = min_multiplier.max(1);
        Self {
            include_type,
            min_multiplier,
            max_multiplier: max_multiplier.max(min_multiplier),
        }
    }

    pub fn with_include(self, include_type: bool) -> Self {
        Self::new(include_type, self.min_multiplier, self.max_multiplier)
    }

    pub fn with_min_multiplier(self, multiplier: usize) -> Self {
        Self::new(self.include_type, multiplier, self.max_multiplier)
    }

    pub fn with_max_multiplier(self, multiplier: usize) -> Self {
        Self::new(self.include_type, self.min_multiplier, multiplier)
    }

    /// Re-apply the clamping rules, e.g. after deserializing.
    pub fn normalized(self) -> Self {
        Self::new(self.include_type, self.min_multiplier, self.max_multiplier)
    }
}
