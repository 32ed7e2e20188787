//! Numeric helpers shared by the acquisition workspace.
//!
//! This crate has no dependencies and knows nothing about datasets or
//! classifiers. It provides the small pieces of arithmetic the higher layers
//! build on:
//!
//! - **Entropy**: Shannon entropy, split gain and a weighted contingency table
//!   with missing-value merging, used for attribute rewards and tree induction
//! - **Cut points**: equal-frequency cut points for bucketing numeric values
//! - **Summary**: min/mean/max summaries of score vectors for logging
//!
//! # Modules
//!
//! - [`entropy`]: entropy and information gain
//! - [`cut_points`]: equal-frequency discretization boundaries
//! - [`summary`]: score summaries
//!
//! # Examples
//!
//! ## Information gain of a perfectly predictive attribute
//!
//! ```
//! use afa_stats::entropy::Contingency;
//!
//! let mut table = Contingency::new(2, 2);
//! table.add(Some(0), 0, 1.0);
//! table.add(Some(0), 0, 1.0);
//! table.add(Some(1), 1, 1.0);
//! table.add(Some(1), 1, 1.0);
//! assert!((table.information_gain() - 1.0).abs() < 1e-12);
//! ```
//!
//! ## Bucketing numeric values
//!
//! ```
//! use afa_stats::cut_points::{bucket_of, equal_frequency_cut_points};
//!
//! let values = [1.0, 2.0, 3.0, 4.0];
//! let cuts = equal_frequency_cut_points(&values, 2);
//! assert_eq!(cuts, vec![2.5]);
//! assert_eq!(bucket_of(&cuts, 1.0), 0);
//! assert_eq!(bucket_of(&cuts, 4.0), 1);
//! ```

pub mod cut_points;
pub mod entropy;
pub mod summary;
