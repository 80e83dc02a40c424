//! rfpweights: hierarchical weight allocation for RFP requirement trees.
//!
//! Categories and requirements form a forest. Only childless nodes store a
//! weight; every category's effective weight is the sum of its children, and
//! local percentages are derived from effective weights on demand.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
