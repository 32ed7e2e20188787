use afa_classifier::InductionError;
use afa_data::{DataError, OracleError};

use crate::task_group::WorkerPanic;

/// Invalid acquisition setup, detected before any round runs.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("class attribute {class_index} must be the last of {num_attributes} attributes")]
    ClassNotLast {
        class_index: usize,
        num_attributes: usize,
    },
    #[display("class attribute {attribute} is not nominal")]
    NonNominalClass { attribute: usize },
    #[display("instance {instance} has no class label")]
    MissingClassLabel { instance: usize },
    #[display("batch size must be at least 1")]
    ZeroBatchSize,
    #[display("`{name}` must be finite, got {value}")]
    NonFiniteWeight { name: &'static str, value: f64 },
    #[display("`alpha` must be at least 1, got {alpha}")]
    SamplingAlphaTooSmall { alpha: usize },
    #[display("`es_param` must lie in [1, {num_instances}], got {es_param}")]
    EsParamOutOfRange {
        es_param: usize,
        num_instances: usize,
    },
    #[display("attribute {attribute} is still numeric after discretization")]
    NumericAfterDiscretization { attribute: usize },
}

/// Failure of a round or of loop construction.
///
/// A failing round leaves the loop exactly as it was before the round
/// started; rounds already returned stay committed.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum EngineError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("classifier induction failed: {_0}")]
    Induction(InductionError),
    #[display("ground-truth lookup failed: {_0}")]
    Oracle(OracleError),
    #[display("dataset update failed: {_0}")]
    Data(DataError),
    #[display("evaluation worker for task {task} panicked")]
    WorkerPanicked { task: usize },
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<InductionError> for EngineError {
    fn from(err: InductionError) -> Self {
        Self::Induction(err)
    }
}

impl From<OracleError> for EngineError {
    fn from(err: OracleError) -> Self {
        Self::Oracle(err)
    }
}

impl From<DataError> for EngineError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<WorkerPanic> for EngineError {
    fn from(panic: WorkerPanic) -> Self {
        Self::WorkerPanicked { task: panic.task }
    }
}
