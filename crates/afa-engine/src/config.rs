//! Parameters of the acquisition loop and its policies.
//!
//! Every parameter struct has public fields, a `Default`, and a `validate()`
//! that reports the first problem as a [`ConfigError`]. All of them
//! (de)serialize with serde, so an experiment harness can keep them in JSON:
//!
//! ```
//! use afa_engine::{
//!     BatchSelector as _,
//!     config::{AcquisitionConfig, PolicyConfig},
//! };
//!
//! let policy: PolicyConfig =
//!     serde_json::from_str(r#"{"policy": "seu-error", "es_param": 5}"#)?;
//! let config: AcquisitionConfig = serde_json::from_str(r#"{"batch_size": 10}"#)?;
//! assert_eq!(config.seed, 0);
//! assert_eq!(policy.build()?.name(), "seu-error");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError,
    policy::{BanditPolicy, Policy, RandomPolicy, SeuPolicy},
};

/// Settings of the acquisition loop itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Maximum number of cells acquired per round.
    pub batch_size: usize,
    /// Seed of the loop's random number generator.
    pub seed: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            seed: 0,
        }
    }
}

impl AcquisitionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}

/// Weights of the two reward terms of the bandit score.
///
/// The exploration term always has weight 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BanditParams {
    /// Weight of the instance reward.
    pub alpha: f64,
    /// Weight of the attribute reward.
    pub beta: f64,
}

impl Default for BanditParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

impl BanditParams {
    /// Instance weight `alpha` with the attribute weight set to `1 - alpha`.
    #[must_use]
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            beta: 1.0 - alpha,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Candidate restriction of SEU with uniform sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformSamplingParams {
    /// The sample holds `alpha × batch_size` cells (fewer if not that many are
    /// missing).
    pub alpha: usize,
}

impl Default for UniformSamplingParams {
    fn default() -> Self {
        Self { alpha: 10 }
    }
}

impl UniformSamplingParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alpha < 1 {
            return Err(ConfigError::SamplingAlphaTooSmall { alpha: self.alpha });
        }
        Ok(())
    }
}

/// Candidate restriction of SEU with error sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorSamplingParams {
    /// Number of instances whose missing cells are scored each round.
    pub es_param: usize,
}

impl Default for ErrorSamplingParams {
    fn default() -> Self {
        Self { es_param: 10 }
    }
}

impl ErrorSamplingParams {
    /// Checks `es_param` against a dataset of `num_instances` instances.
    pub fn validate(&self, num_instances: usize) -> Result<(), ConfigError> {
        if self.es_param < 1 || self.es_param > num_instances {
            return Err(ConfigError::EsParamOutOfRange {
                es_param: self.es_param,
                num_instances,
            });
        }
        Ok(())
    }
}

/// Serializable choice of policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum PolicyConfig {
    Bandit(BanditParams),
    SeuUniform(UniformSamplingParams),
    SeuError(ErrorSamplingParams),
    Random,
}

impl PolicyConfig {
    /// Builds the configured policy.
    ///
    /// SEU policies get an equal-frequency discretizer fitted on the dataset
    /// the loop starts from. Dataset-dependent checks (`es_param`) run when
    /// the loop is constructed.
    pub fn build(self) -> Result<Policy, ConfigError> {
        Ok(match self {
            Self::Bandit(params) => {
                params.validate()?;
                Policy::Bandit(BanditPolicy::new(params))
            }
            Self::SeuUniform(params) => {
                params.validate()?;
                Policy::SeuUniform(SeuPolicy::uniform(params))
            }
            Self::SeuError(params) => Policy::SeuError(SeuPolicy::error(params)),
            Self::Random => Policy::Random(RandomPolicy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::BatchSelector as _;

    #[test]
    fn test_with_alpha_complements_beta() {
        let params = BanditParams::with_alpha(0.25);
        assert_eq!(params.beta, 0.75);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            AcquisitionConfig {
                batch_size: 0,
                seed: 1
            }
            .validate(),
            Err(ConfigError::ZeroBatchSize)
        ));
        assert!(matches!(
            BanditParams {
                alpha: f64::NAN,
                beta: 0.0
            }
            .validate(),
            Err(ConfigError::NonFiniteWeight { name: "alpha", .. })
        ));
        assert!(matches!(
            UniformSamplingParams { alpha: 0 }.validate(),
            Err(ConfigError::SamplingAlphaTooSmall { alpha: 0 })
        ));
        assert!(ErrorSamplingParams { es_param: 0 }.validate(5).is_err());
        assert!(ErrorSamplingParams { es_param: 6 }.validate(5).is_err());
        assert!(ErrorSamplingParams { es_param: 5 }.validate(5).is_ok());
    }

    #[test]
    fn test_policy_config_json() {
        let configs = [
            PolicyConfig::Bandit(BanditParams::with_alpha(0.5)),
            PolicyConfig::SeuUniform(UniformSamplingParams { alpha: 3 }),
            PolicyConfig::SeuError(ErrorSamplingParams { es_param: 2 }),
            PolicyConfig::Random,
        ];
        for config in configs {
            let json = serde_json::to_string(&config).unwrap();
            assert_eq!(serde_json::from_str::<PolicyConfig>(&json).unwrap(), config);
        }
        let random: PolicyConfig = serde_json::from_str(r#"{"policy":"random"}"#).unwrap();
        assert_eq!(random, PolicyConfig::Random);
    }

    #[test]
    fn test_build_rejects_invalid_alpha() {
        let config = PolicyConfig::SeuUniform(UniformSamplingParams { alpha: 0 });
        assert!(config.build().is_err());
        assert_eq!(PolicyConfig::Random.build().unwrap().name(), "random");
    }
}
