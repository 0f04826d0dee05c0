//! Type-pattern inference, regex-map validation and synthetic data
//! generation for recorded API scenarios.
//!
//! A sample body is turned into a tree of tagged patterns
//! ([`extract_types`]), flattened into a dotted-path [`RegexMap`] for
//! contract checks ([`flat_regex_map`], [`validate_regex_map`]) and fed to a
//! [`FuzzGenerator`] to synthesize new bodies of the same shape. `{{ ... }}`
//! templates ([`TemplateEngine`]) expose the same generators and path
//! lookups to stored scenarios.
//!
//! # Example
//!
//! ```no_run
//! use mimic_fuzz::{
//!     extract_types, flat_regex_map, unmarshal_array_or_object, validate_regex_map,
//!     DataTemplateRequest, FuzzGenerator,
//! };
//!
//! let sample = unmarshal_array_or_object(br#"{"name": "Leanne", "id": 1}"#)?;
//! let tagged = extract_types(&sample, &DataTemplateRequest::default()).unwrap_or_default();
//! let regex = flat_regex_map(&tagged);
//!
//! let fake = FuzzGenerator::seeded(42).generate(&tagged);
//! validate_regex_map(&fake, &regex)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod config;
pub mod extractor;
pub mod fixtures;
pub mod flattener;
pub mod generator;
pub mod lookup;
pub mod tags;
pub mod template;
pub mod template_request;
pub mod validator;
pub mod value;

pub use codec::{
    extract_regex_map, extract_regex_map_json, extract_regex_map_with_limit,
    unmarshal_array_or_object, CodecError,
};
pub use config::FuzzConfig;
pub use extractor::{extract_types, string_type_pattern, value_to_regex};
pub use fixtures::{FixtureError, FixtureStore};
pub use flattener::{flat_regex_map, flat_regex_map_with_limit, RegexMap};
pub use generator::{FuzzGenerator, GenerateError, RegexStrategy, StrategyChain};
pub use lookup::{find_variable, variable_contains, variable_equals, variable_number, variable_size};
pub use tags::strip_type_tags;
pub use template::{render, TemplateEngine, TemplateError};
pub use template_request::DataTemplateRequest;
pub use validator::{validate_regex_map, RegexMapValidator, ValidationError};
pub use value::Value;
