use std::collections::HashMap;
use std::hash::BuildHasher;

/// Look up the per-sample values of a vertex by its external id
pub trait VertexSamples {
    /// number of samples (spots) stored for every vertex
    fn num_samples(&self) -> usize;

    /// sample values of `vertex`, or `None` if the vertex is unknown
    fn vertex_samples(&self, vertex: usize) -> Option<&[f64]>;
}

/// `sample x vertex` matrix: column `j` holds the values of vertex `j`
impl VertexSamples for nalgebra::DMatrix<f64> {
    fn num_samples(&self) -> usize {
        self.nrows()
    }

    fn vertex_samples(&self, vertex: usize) -> Option<&[f64]> {
        if vertex < self.ncols() {
            let nn = self.nrows();
            Some(&self.as_slice()[(vertex * nn)..((vertex + 1) * nn)])
        } else {
            None
        }
    }
}

impl<S: BuildHasher> VertexSamples for HashMap<usize, Vec<f64>, S> {
    fn num_samples(&self) -> usize {
        self.values().next().map(|x| x.len()).unwrap_or(0)
    }

    fn vertex_samples(&self, vertex: usize) -> Option<&[f64]> {
        self.get(&vertex).map(|x| x.as_slice())
    }
}
