//! Active feature-value acquisition: deciding which missing cells to buy.
//!
//! Given a dataset with missing feature values, a ground-truth oracle that can
//! reveal any of them, and a classifier oracle, this crate repeatedly picks a
//! batch of cells, acquires their values, retrains the classifier and reports
//! the round. Policies decide which cells are worth acquiring.
//!
//! # How Acquisition Works
//!
//! 1. **Pool** - every missing feature cell starts in the [`CellPool`]
//! 2. **Select** - a [`Policy`] ranks candidate cells and picks a batch
//! 3. **Acquire** - the [`GroundTruthOracle`] reveals the batch
//! 4. **Retrain** - the [`ClassifierOracle`] trains on the updated dataset
//! 5. **Repeat** - until the round budget is spent or the pool is empty
//!
//! # Architecture
//!
//! ```text
//! AcquisitionLoop (owns dataset, pool, classifier, RNG)
//!     ↓ asks
//! Policy (BatchSelector)
//!     ├─ Bandit      - UCB score over the whole pool
//!     ├─ SeuUniform  - expected utility over a fixed uniform sample
//!     ├─ SeuError    - expected utility over error-driven candidates
//!     │       ↓ fans out counterfactual retraining
//!     │   TaskGroup (scoped worker threads)
//!     └─ Random      - shuffled pool
//!     ↓ returns
//! Selection (batch of cells)
//!     ↓ acquired via
//! GroundTruthOracle → dataset → ClassifierOracle → AcquisitionRound
//! ```
//!
//! # Modules
//!
//! - [`acquisition`] - [`AcquisitionLoop`], its status and round records
//! - [`policy`] - [`BatchSelector`](policy::BatchSelector) and the policies
//! - [`pool`] - [`CellPool`]
//! - [`config`] - serde-friendly parameters and [`PolicyConfig`]
//! - [`task_group`] - bounded fan-out/fan-in over scoped threads
//!
//! # Logging
//!
//! The crate emits [`tracing`] events: `debug` per round and per SEU scoring
//! pass, `info` when acquisition is exhausted, `warn` when SEU discretizes
//! numeric attributes, and `trace` per counterfactual evaluation. Installing
//! a subscriber is up to the caller.
//!
//! # Example
//!
//! ```
//! use afa_classifier::tree::DecisionTreeOracle;
//! use afa_data::{Attribute, Cell, Dataset, ReferenceOracle};
//! use afa_engine::{AcquisitionConfig, AcquisitionLoop, LoopStatus, PolicyConfig};
//!
//! let complete = Dataset::new(
//!     vec![
//!         Attribute::nominal("outlook", ["sunny", "rainy"]),
//!         Attribute::nominal("windy", ["no", "yes"]),
//!         Attribute::nominal("play", ["no", "yes"]),
//!     ],
//!     vec![
//!         vec![Some(0.0), Some(0.0), Some(1.0)],
//!         vec![Some(0.0), Some(1.0), Some(0.0)],
//!         vec![Some(1.0), Some(0.0), Some(1.0)],
//!         vec![Some(1.0), Some(1.0), Some(0.0)],
//!     ],
//! )?;
//! let mut working = complete.clone();
//! working.set_missing(Cell::new(1, 1))?;
//! working.set_missing(Cell::new(3, 0))?;
//!
//! let mut afa = AcquisitionLoop::new(
//!     working,
//!     Box::new(ReferenceOracle::new(complete)),
//!     DecisionTreeOracle::default(),
//!     PolicyConfig::Random.build()?,
//!     AcquisitionConfig { batch_size: 1, seed: 42 },
//! )?;
//! let rounds = afa.perform(5)?;
//! assert_eq!(rounds.len(), 2);
//! assert_eq!(afa.status(), LoopStatus::Exhausted);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Current Limitations
//!
//! - **Accuracy only**: SEU utilities measure training-set accuracy; other
//!   objectives (log-loss, cost-weighted accuracy) are not supported
//! - **Uniform cost**: every cell costs the same; per-attribute acquisition
//!   costs are not modelled
//! - **Whole-model retraining**: each counterfactual retrains from scratch;
//!   incremental learners are not exploited
//! - **Fixed discretization**: bucket boundaries are fitted once on the
//!   starting dataset and never refitted as values arrive

pub use self::{
    acquisition::{AcquisitionLoop, AcquisitionRound, LoopStatus},
    config::{AcquisitionConfig, PolicyConfig},
    error::{ConfigError, EngineError},
    policy::{BatchSelector, Policy},
    pool::CellPool,
};
#[doc(no_inline)]
pub use afa_classifier::ClassifierOracle;
#[doc(no_inline)]
pub use afa_data::GroundTruthOracle;

pub mod acquisition;
pub mod config;
mod error;
pub mod policy;
pub mod pool;
pub mod task_group;
