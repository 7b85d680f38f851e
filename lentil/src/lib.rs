pub mod common;
pub mod input; // expression matrix and network loaders
pub mod report;
pub mod run_score;
