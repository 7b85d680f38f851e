use fnv::FnvHashMap as HashMap;
use log::warn;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A directed edge `(source id, target id)` between external vertex ids
pub type Edge = (usize, usize);

/// Random number generator of the `round`-th randomization. Each
/// round is seeded independently so that rounds can be scattered
/// over workers and still reproduce the same stream.
pub fn round_rng(rseed: u64, round: usize) -> StdRng {
    StdRng::seed_from_u64(rseed.wrapping_add(round as u64))
}

/// Degree-preserving rewiring of a directed edge list by stub
/// matching (configuration model).
///
/// Sources (side `a`) and targets (side `b`) live in separate label
/// spaces, each compacted to `0..n` in first-seen order. A vertex
/// present on both sides is tracked twice, and self-loops are
/// detected by comparing external ids.
///
/// Every source stub sits in one arena `stubs`; source `a` owns the
/// slots `stub_start[a] .. stub_start[a] + degree_a[a]`, and the
/// first `fill_a[a]` of them hold the compact target indices
/// connected in the current round.
///
/// A rewiring never exceeds the original degrees, never repeats a
/// target within one source, and never connects a source to the
/// target with the same external id. Stubs that cannot be placed
/// under these constraints stay unconnected for the round; the
/// fraction of connected stubs is returned by [`StubRewire::randomize`].
#[derive(Clone, Debug)]
pub struct StubRewire {
    ids_a: Vec<usize>,
    ids_b: Vec<usize>,
    degree_a: Vec<usize>,
    degree_b: Vec<usize>,
    stub_start: Vec<usize>,
    stubs: Vec<usize>,

    // scratch, fully reset by every `randomize`
    fill_a: Vec<usize>,
    fill_b: Vec<usize>,
    order_a: Vec<usize>,
    candidate_b: Vec<usize>,
    visited_b: Vec<bool>,
}

impl StubRewire {
    /// Build the degree sequences and the stub arena of `edges`.
    ///
    /// The caller is expected to pass distinct `(source, target)`
    /// pairs. Fails if `edges` is empty.
    pub fn new(edges: &[Edge]) -> anyhow::Result<Self> {
        if edges.is_empty() {
            return Err(anyhow::anyhow!("cannot rewire an empty edge list"));
        }

        let mut pos_a: HashMap<usize, usize> = HashMap::default();
        let mut pos_b: HashMap<usize, usize> = HashMap::default();
        let mut ids_a = vec![];
        let mut ids_b = vec![];
        let mut degree_a: Vec<usize> = vec![];
        let mut degree_b: Vec<usize> = vec![];

        for &(a, b) in edges {
            let i = *pos_a.entry(a).or_insert_with(|| {
                ids_a.push(a);
                degree_a.push(0);
                ids_a.len() - 1
            });
            let j = *pos_b.entry(b).or_insert_with(|| {
                ids_b.push(b);
                degree_b.push(0);
                ids_b.len() - 1
            });
            degree_a[i] += 1;
            degree_b[j] += 1;
        }

        let mut stub_start = Vec::with_capacity(degree_a.len());
        let mut offset = 0;
        for &d in degree_a.iter() {
            stub_start.push(offset);
            offset += d;
        }

        let n_a = ids_a.len();
        let n_b = ids_b.len();

        Ok(Self {
            ids_a,
            ids_b,
            degree_a,
            degree_b,
            stub_start,
            stubs: vec![0; edges.len()],
            fill_a: vec![0; n_a],
            fill_b: vec![0; n_b],
            order_a: (0..n_a).collect(),
            candidate_b: (0..n_b).collect(),
            visited_b: vec![false; n_b],
        })
    }

    pub fn num_edges(&self) -> usize {
        self.stubs.len()
    }

    pub fn num_sources(&self) -> usize {
        self.ids_a.len()
    }

    pub fn num_targets(&self) -> usize {
        self.ids_b.len()
    }

    /// compact target indices connected to source `a` in the current round
    pub fn assigned_targets(&self, a: usize) -> &[usize] {
        let start = self.stub_start[a];
        &self.stubs[start..(start + self.fill_a[a])]
    }

    /// Draw one random rewiring and return the completeness ratio,
    /// `#connected stubs / #edges`, always within `[0, 1]`.
    ///
    /// Sources are visited in a random order. Each stub starts at a
    /// random position of the pool of targets with spare capacity and
    /// scans it circularly for the first target that is neither
    /// already taken by this source nor a self-loop.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let n_b = self.num_targets();

        self.fill_a.fill(0);
        self.fill_b.fill(0);
        self.visited_b.fill(false);

        self.order_a.clear();
        self.order_a.extend(0..self.num_sources());
        self.order_a.shuffle(rng);

        self.candidate_b.clear();
        self.candidate_b.extend(0..n_b);

        let mut n_candidate = n_b;
        let mut connected = 0_usize;

        for k in 0..self.order_a.len() {
            let a = self.order_a[k];
            let id_a = self.ids_a[a];
            let start = self.stub_start[a];

            for j in 0..self.degree_a[a] {
                if n_candidate == 0 {
                    break;
                }

                let mut offset = rng.random_range(0..n_candidate);
                let mut found = None;

                for _ in 0..n_candidate {
                    let b = self.candidate_b[offset];
                    if !self.visited_b[b] && self.ids_b[b] != id_a {
                        found = Some(b);
                        break;
                    }
                    offset = (offset + 1) % n_candidate;
                }

                // the pool only shrinks while this source is visited,
                // so none of its remaining stubs can be placed either
                let Some(b) = found else {
                    break;
                };

                self.stubs[start + j] = b;
                self.fill_a[a] += 1;
                self.fill_b[b] += 1;
                self.visited_b[b] = true;
                connected += 1;

                // full: swap out of the live pool
                if self.fill_b[b] == self.degree_b[b] {
                    n_candidate -= 1;
                    self.candidate_b.swap(offset, n_candidate);
                }
            }

            for &b in &self.stubs[start..(start + self.fill_a[a])] {
                self.visited_b[b] = false;
            }
        }

        connected as f64 / self.num_edges() as f64
    }

    /// Write the current rewiring into `out` as external-id edges, in
    /// source index then stub order, and return the number of edges
    /// written. This is less than [`StubRewire::num_edges`] whenever
    /// some stubs stayed unconnected. Edges that do not fit in `out`
    /// are dropped with a warning.
    pub fn materialize(&self, out: &mut [Edge]) -> usize {
        let mut n_edge = 0;
        let mut n_dropped = 0;

        for a in 0..self.num_sources() {
            let id_a = self.ids_a[a];
            for &b in self.assigned_targets(a) {
                if n_edge < out.len() {
                    out[n_edge] = (id_a, self.ids_b[b]);
                    n_edge += 1;
                } else {
                    n_dropped += 1;
                }
            }
        }

        if n_dropped > 0 {
            warn!(
                "edge buffer is already full ({}); dropped {} rewired edges",
                out.len(),
                n_dropped
            );
        }

        n_edge
    }
}
