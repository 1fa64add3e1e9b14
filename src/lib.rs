//! Feature flag evaluation and impression processing core.
//!
//! # Overview
//!
//! Flag definitions are loaded into a [`Configuration`] and published through a
//! [`ConfigurationStore`]. An [`Evaluator`] reads the store and computes, for a key and its
//! [`Attributes`], an [`Evaluation`]: the treatment served and a label explaining why.
//!
//! Each evaluation can be turned into an [`Impression`](impressions::Impression) and passed to an
//! [`ImpressionsManager`](impressions::ImpressionsManager), which deduplicates, counts and tracks
//! unique keys according to its [`ImpressionsMode`](impressions::ImpressionsMode). Storage and
//! synchronization of flags, segments and impressions are left to the embedding SDK.
//!
//! ```
//! # use std::sync::Arc;
//! # use split_core::{Attributes, Configuration, ConfigurationStore, Evaluator, EvaluatorConfig};
//! let store = Arc::new(ConfigurationStore::new());
//! store.set_configuration(Configuration::from_json(br#"[{
//!     "name": "new_checkout",
//!     "seed": 1234,
//!     "defaultTreatment": "off",
//!     "changeNumber": 1,
//!     "conditions": [{
//!         "conditionType": "ROLLOUT",
//!         "label": "in rollout",
//!         "matcherGroup": {"combiner": "AND", "matchers": [{"matcherType": "ALL_KEYS"}]},
//!         "partitions": [{"treatment": "on", "size": 100}]
//!     }]
//! }]"#)?);
//!
//! let evaluator = Evaluator::new(EvaluatorConfig {
//!     configuration_store: store,
//!     segment_membership: None,
//! });
//! let evaluation = evaluator.evaluate("new_checkout", "user-1", None, &Attributes::new())?;
//! assert_eq!(evaluation.treatment, "on");
//! # Ok::<(), split_core::Error>(())
//! ```
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum.
//!
//! Bad data never fails an evaluation: attributes of the wrong type, unparsable values and
//! unknown flags all degrade to a non-match or the `control` treatment. Errors are reserved for
//! wiring mistakes, such as evaluating a segment matcher without a segment membership lookup.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate with target `split` for
//! logging messages. Consider integrating a `log`-compatible logger implementation for better
//! visibility into evaluation.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod attributes;
mod config;
mod configuration;
mod configuration_store;
mod error;
mod eval;
mod models;
mod str;

pub mod hash;
pub mod impressions;
pub mod labels;
pub mod matchers;
pub mod splitter;
pub mod wire;

pub use attributes::{AttributeValue, Attributes};
pub use config::ImpressionsConfig;
pub use configuration::Configuration;
pub use configuration_store::ConfigurationStore;
pub use error::{Error, Result};
pub use eval::{Evaluation, EvaluationContext, Evaluator, EvaluatorConfig, SegmentMembership};
pub use models::{Combiner, Condition, ConditionType, FeatureFlag, Partition};
pub use str::Str;
