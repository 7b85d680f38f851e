#![allow(unused)]

pub use network_util::common_io as io;
pub use network_util::network_stat::*;
pub use network_util::stub_rewire::Edge;

pub use clap::Parser;
pub use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};
pub use log::{info, warn};
pub use rayon::prelude::*;

/// `sample x vertex` expression matrix
pub type Mat = nalgebra::DMatrix<f64>;
