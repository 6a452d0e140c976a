//! Statistical primitives for the pmiacc accuracy tables.
//!
//! This crate provides the small set of descriptive statistics the
//! aggregation pipeline needs:
//!
//! - **Mean**: arithmetic mean of a group
//! - **Median**: middle value, averaging the middle pair for even counts
//! - **Sample variance**: unbiased estimator, undefined below two observations
//!
//! Statistics that are undefined for a given input (an empty group, or a
//! variance over a single value) are returned as `None` so callers can carry
//! them as explicit missing values instead of zeros.
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//!
//! # Examples
//!
//! ```
//! use pmiacc_stats::descriptive::DescriptiveStats;
//!
//! let values = [2.0, 4.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.median, 3.0);
//! ```

pub mod descriptive;
