pub mod common_io; // gzip-aware readers and writers
pub mod network_stat; // network sum statistic and permutation test
pub mod stub_rewire; // degree-preserving stub rewiring
pub mod traits; // vertex to sample-vector lookup
