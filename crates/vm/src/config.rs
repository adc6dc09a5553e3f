use serde::{Deserialize, Serialize};

use storage::HashFunction;
use types::{VmError, VmResult};

use crate::metering::GasSchedule;

pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;

/// Settings for one [`ExecutionContext`](crate::ExecutionContext).
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes:
///
/// ```json
/// { "gas_limit": 100000, "hash_function": "sha256",
///   "schedule": { "metered_storage": true } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub gas_limit: u64,
    pub schedule: GasSchedule,
    pub hash_function: HashFunction,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            schedule: GasSchedule::default(),
            hash_function: HashFunction::default(),
        }
    }
}

impl ContextConfig {
    pub fn with_gas_limit(gas_limit: u64) -> Self {
        Self {
            gas_limit,
            ..Self::default()
        }
    }

    /// Parses a config document; missing keys take their defaults. A
    /// schedule that cannot price memory is [`VmError::InvalidConfig`].
    pub fn from_json(json: &str) -> VmResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| VmError::InvalidConfig(err.to_string()))?;
        config.schedule.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> VmResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| VmError::InvalidConfig(err.to_string()))
    }
}
