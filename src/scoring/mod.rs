//! Indicator scoring and IQT aggregation.
//!
//! Per-route metrics are turned into ten ordinal scores, combined with the
//! indicator weights into a continuous index, and banded into a class and
//! display colour.

pub mod aggregate;
pub mod grade;
pub mod types;
pub mod utility;
