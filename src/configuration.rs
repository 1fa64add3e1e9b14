use std::{collections::HashMap, sync::Arc};

use crate::{
    models::FeatureFlag,
    wire::{FeatureFlagWire, TryParse},
    Result, Str,
};

/// A snapshot of compiled flag definitions, keyed by flag name.
#[derive(Debug, Default)]
pub struct Configuration {
    flags: HashMap<Str, Arc<FeatureFlag>>,
}

impl Configuration {
    /// Build a configuration from compiled flags. Later flags replace earlier ones with the same
    /// name.
    pub fn from_flags(flags: impl IntoIterator<Item = FeatureFlag>) -> Configuration {
        let flags = flags
            .into_iter()
            .map(|flag| (flag.name.clone(), Arc::new(flag)))
            .collect();
        Configuration { flags }
    }

    /// Parse a JSON array of flag definitions.
    ///
    /// Flags that fail to parse are skipped (and logged), so they evaluate as not found. Only a
    /// document that is not an array at all is an error.
    pub fn from_json(json: &[u8]) -> Result<Configuration> {
        let flags: Vec<TryParse<FeatureFlagWire>> = serde_json::from_slice(json).map_err(|err| {
            log::warn!(target: "split", "failed to parse flag definitions: {err:?}");
            err
        })?;

        let flags = flags.into_iter().filter_map(|flag| match flag {
            TryParse::Parsed(flag) => Some(FeatureFlag::compile(flag)),
            TryParse::ParseFailed(json) => {
                let flag_name = json.get("name").and_then(|name| name.as_str());
                log::warn!(target: "split",
                           flag_name;
                           "skipping flag definition that failed to parse");
                None
            }
        });

        Ok(Configuration::from_flags(flags))
    }

    /// Get a flag by name.
    pub fn get_flag(&self, name: &str) -> Option<&Arc<FeatureFlag>> {
        self.flags.get(name)
    }

    /// Names of all known flags.
    pub fn flag_names(&self) -> impl Iterator<Item = &Str> {
        self.flags.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::Configuration;

    #[test]
    fn skips_unparsable_flags() {
        let _ = env_logger::builder().is_test(true).try_init();

        let configuration = Configuration::from_json(
            br#"[
                {"name": "good", "seed": 1, "defaultTreatment": "off", "conditions": []},
                {"name": "bad", "seed": "not a number", "defaultTreatment": "off"}
            ]"#,
        )
        .unwrap();

        assert!(configuration.get_flag("good").is_some());
        assert!(configuration.get_flag("bad").is_none());
        assert_eq!(configuration.flag_names().count(), 1);
    }

    #[test]
    fn rejects_non_array() {
        assert!(Configuration::from_json(br#"{"name": "good"}"#).is_err());
    }
}
