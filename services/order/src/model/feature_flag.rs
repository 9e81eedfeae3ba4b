use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map as JsnMap, Value as JsnVal};

/// value of a single flag, apart from the switch each flag may carry
/// arbitrary attributes such as `limit` or `allow`
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FeatureFlagModel {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub attributes: JsnMap<String, JsnVal>,
}

impl FeatureFlagModel {
    pub fn limit(&self) -> Option<u64> {
        let v = self.attributes.get("limit")?;
        v.as_u64()
            .or_else(|| v.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
    }

    pub fn allow(&self) -> Option<&str> {
        self.attributes.get("allow").and_then(JsnVal::as_str)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct FeatureFlagSet {
    flags: HashMap<String, FeatureFlagModel>,
}

impl FeatureFlagSet {
    pub fn get(&self, name: &str) -> Option<&FeatureFlagModel> {
        self.flags.get(name)
    }

    /// absent flag is reported as disabled
    pub fn is_enabled(&self, name: &str) -> bool {
        self.flags.get(name).map(|f| f.enabled).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<(String, FeatureFlagModel)> for FeatureFlagSet {
    fn from_iter<T: IntoIterator<Item = (String, FeatureFlagModel)>>(iter: T) -> Self {
        Self {
            flags: HashMap::from_iter(iter),
        }
    }
}
