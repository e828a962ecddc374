//! Estimate how much time each author has put into a repository from the
//! spacing of their commits.

pub mod cli;
pub mod error;
pub mod estimate;
pub mod git;
pub mod history;
pub mod model;
pub mod report;
pub mod util;

pub use error::{GhoursError, Result};
pub use estimate::EstimatorConfig;
pub use history::HistoryProvider;
