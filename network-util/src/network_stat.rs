use crate::common_io::generate_minibatch_intervals;
use crate::stub_rewire::{round_rng, Edge, StubRewire};
use crate::traits::VertexSamples;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressDrawTarget};
use log::{error, info, warn};
use rand::Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type DVec = nalgebra::DVector<f64>;

pub const DEFAULT_NUM_RETRY: usize = 10;
pub const DEFAULT_RATIO_THRES: f64 = 0.98;
pub const DEFAULT_BLOCK_SIZE: usize = 100;
pub const DEFAULT_RSEED: u64 = 42;

/// smoothing constant of the ratio and floor of the null variance
pub const EPS: f64 = 1e-8;

const PROGRESS_STEPS: usize = 10;

#[derive(Debug, Clone)]
pub struct NetworkScoreArgs {
    /// number of randomized networks
    pub n_rand: usize,
    /// maximum number of rewiring attempts per randomized network
    pub n_retry: usize,
    /// minimum completeness ratio to accept a rewiring
    pub ratio_thres: f64,
    /// random seed; round `r` is seeded with `rseed + r`
    pub rseed: u64,
    /// number of rounds per parallel job
    pub block_size: usize,
    pub compute_zscore: bool,
    pub show_progress: bool,
}

impl Default for NetworkScoreArgs {
    fn default() -> Self {
        Self {
            n_rand: 1000,
            n_retry: DEFAULT_NUM_RETRY,
            ratio_thres: DEFAULT_RATIO_THRES,
            rseed: DEFAULT_RSEED,
            block_size: DEFAULT_BLOCK_SIZE,
            compute_zscore: true,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkScoreOut {
    /// network sum of the observed network
    pub observed: DVec,
    /// `(observed + ε) / (null mean + ε) - 1`
    pub ratio: DVec,
    /// `(observed - null mean) / null sd`
    pub zscore: Option<DVec>,
    /// one-sided empirical p-value
    pub pvalue: DVec,
    pub null_mean: DVec,
    /// clamped null variance (only with z-scores)
    pub null_var: Option<DVec>,
    /// samples whose null variance was replaced by `EPS`
    pub clamped_variance: Vec<bool>,
    /// rounds that never reached the completeness threshold
    pub num_incomplete_rounds: usize,
    /// lowest completeness ratio among the accepted rewirings
    pub min_completeness: f64,
}

fn lookup_samples<S>(samples: &S, v: usize, n_sample: usize) -> anyhow::Result<&[f64]>
where
    S: VertexSamples + ?Sized,
{
    let x = samples
        .vertex_samples(v)
        .ok_or(anyhow::anyhow!("vertex {} has no sample values", v))?;
    if x.len() != n_sample {
        return Err(anyhow::anyhow!(
            "vertex {} has {} values, expected {}",
            v,
            x.len(),
            n_sample
        ));
    }
    Ok(x)
}

/// Network sum statistic: for each sample `s`,
///
/// `score[s] = Σ_{(a,b)} x[a][s] * x[b][s] / n_edge`
///
/// over the first `n_edge` edges. `n_edge` should be the number of
/// edges actually present (e.g. after a partial rewiring).
pub fn network_sum<S>(samples: &S, edges: &[Edge], n_edge: usize) -> anyhow::Result<DVec>
where
    S: VertexSamples + ?Sized,
{
    if n_edge == 0 {
        return Err(anyhow::anyhow!("no edges to compute a network sum"));
    }

    if n_edge > edges.len() {
        return Err(anyhow::anyhow!(
            "{} edges requested, but only {} available",
            n_edge,
            edges.len()
        ));
    }

    let n_sample = samples.num_samples();
    let mut score = DVec::zeros(n_sample);

    for &(a, b) in edges[..n_edge].iter() {
        let x_a = lookup_samples(samples, a, n_sample)?;
        let x_b = lookup_samples(samples, b, n_sample)?;
        for (s, (&xa, &xb)) in score.iter_mut().zip(x_a.iter().zip(x_b.iter())) {
            *s += xa * xb;
        }
    }

    score /= n_edge as f64;
    Ok(score)
}

/// Outcome of one accept-or-retry randomization
#[derive(Debug, Clone, Copy)]
pub struct RewireRound {
    /// number of edges written to the buffer
    pub n_edge: usize,
    /// completeness ratio of the kept rewiring
    pub ratio: f64,
    /// number of `randomize` calls
    pub n_attempt: usize,
}

impl RewireRound {
    pub fn is_complete(&self, ratio_thres: f64) -> bool {
        self.ratio >= ratio_thres
    }
}

/// Randomize up to `n_retry` times and keep the first rewiring whose
/// completeness reaches `ratio_thres`. If none does, keep the most
/// complete one. The kept rewiring is written to `rand_edges`.
pub fn rewire_round<R: Rng>(
    rewirer: &mut StubRewire,
    rng: &mut R,
    rand_edges: &mut [Edge],
    n_retry: usize,
    ratio_thres: f64,
) -> RewireRound {
    let mut best = RewireRound {
        n_edge: 0,
        ratio: f64::NEG_INFINITY,
        n_attempt: 0,
    };

    for _ in 0..n_retry {
        let ratio = rewirer.randomize(rng);
        best.n_attempt += 1;

        if ratio > best.ratio {
            best.ratio = ratio;
            best.n_edge = rewirer.materialize(rand_edges);
        }

        if ratio >= ratio_thres {
            break;
        }
    }

    best
}

/// Partial sums over randomized networks. Merged across workers.
#[derive(Debug, Clone)]
pub struct NullStat {
    n_round: usize,
    n_greater: DVec,
    sum: DVec,
    sum_sq: DVec,
    n_incomplete: usize,
    min_ratio: f64,
}

impl NullStat {
    pub fn new(n_sample: usize) -> Self {
        Self {
            n_round: 0,
            n_greater: DVec::zeros(n_sample),
            sum: DVec::zeros(n_sample),
            sum_sq: DVec::zeros(n_sample),
            n_incomplete: 0,
            min_ratio: 1.0,
        }
    }

    pub fn num_rounds(&self) -> usize {
        self.n_round
    }

    pub fn add(
        &mut self,
        observed: &DVec,
        score_rand: &DVec,
        round: &RewireRound,
        ratio_thres: f64,
    ) {
        self.n_round += 1;

        for s in 0..score_rand.len() {
            let x = score_rand[s];
            if x >= observed[s] {
                self.n_greater[s] += 1.0;
            }
            self.sum[s] += x;
            self.sum_sq[s] += x * x;
        }

        if !round.is_complete(ratio_thres) {
            self.n_incomplete += 1;
        }
        self.min_ratio = self.min_ratio.min(round.ratio);
    }

    pub fn merge(mut self, other: NullStat) -> Self {
        self.n_round += other.n_round;
        self.n_greater += other.n_greater;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.n_incomplete += other.n_incomplete;
        self.min_ratio = self.min_ratio.min(other.min_ratio);
        self
    }

    /// Turn the partial sums into ratio, z-score and p-value
    pub fn finalize(self, observed: DVec, compute_zscore: bool) -> anyhow::Result<NetworkScoreOut> {
        if self.n_round == 0 {
            return Err(anyhow::anyhow!("no randomized network was scored"));
        }

        let nn = self.n_round as f64;
        let n_sample = observed.len();

        let pvalue = self.n_greater / nn;
        let null_mean = self.sum / nn;

        let ratio = observed.zip_map(&null_mean, |obs, mu| (obs + EPS) / (mu + EPS) - 1.0);

        let mut clamped_variance = vec![false; n_sample];

        let (zscore, null_var) = if compute_zscore {
            let mean_sq = self.sum_sq / nn;
            let mut null_var = DVec::zeros(n_sample);

            for s in 0..n_sample {
                let v = mean_sq[s] - null_mean[s] * null_mean[s];

                null_var[s] = if v.abs() < EPS {
                    clamped_variance[s] = true;
                    EPS
                } else if v < 0.0 {
                    error!("negative variance {} at sample {}; using {}", v, s, EPS);
                    clamped_variance[s] = true;
                    EPS
                } else {
                    v
                };
            }

            let n_clamped = clamped_variance.iter().filter(|&&x| x).count();
            if n_clamped > 0 {
                warn!(
                    "{} out of {} samples had near-zero null variance, clamped to {}",
                    n_clamped, n_sample, EPS
                );
            }

            let zscore = observed.zip_zip_map(&null_mean, &null_var, |obs, mu, v| {
                (obs - mu) / v.sqrt()
            });

            (Some(zscore), Some(null_var))
        } else {
            (None, None)
        };

        Ok(NetworkScoreOut {
            observed,
            ratio,
            zscore,
            pvalue,
            null_mean,
            null_var,
            clamped_variance,
            num_incomplete_rounds: self.n_incomplete,
            min_completeness: self.min_ratio,
        })
    }
}

fn check_args(args: &NetworkScoreArgs) -> anyhow::Result<()> {
    if args.n_rand == 0 {
        return Err(anyhow::anyhow!("need at least one randomization"));
    }
    if args.n_retry == 0 {
        return Err(anyhow::anyhow!("need at least one rewiring attempt"));
    }
    if !(0.0..=1.0).contains(&args.ratio_thres) {
        return Err(anyhow::anyhow!(
            "ratio threshold {} is not within [0, 1]",
            args.ratio_thres
        ));
    }
    if args.block_size == 0 {
        return Err(anyhow::anyhow!("block size must be positive"));
    }
    Ok(())
}

fn log_milestones(done: &AtomicUsize, n_new: usize, n_rand: usize) {
    let before = done.fetch_add(n_new, Ordering::Relaxed);
    let after = before + n_new;
    let step_before = before * PROGRESS_STEPS / n_rand;
    let step_after = after * PROGRESS_STEPS / n_rand;
    if step_after > step_before {
        info!(
            "{}% randomized networks ({}/{})",
            100 * step_after / PROGRESS_STEPS,
            after,
            n_rand
        );
    }
}

/// Test the observed network sum against `n_rand` degree-preserving
/// rewirings of `edges`.
///
/// Rounds are grouped in blocks of `block_size` and blocks run in
/// parallel, each on its own copy of the rewiring engine. Block
/// results are merged in block order.
pub fn network_score<S>(
    samples: &S,
    edges: &[Edge],
    args: &NetworkScoreArgs,
) -> anyhow::Result<NetworkScoreOut>
where
    S: VertexSamples + Sync + ?Sized,
{
    check_args(args)?;

    let observed = network_sum(samples, edges, edges.len())?;
    let n_sample = observed.len();

    let rewirer = StubRewire::new(edges)?;

    info!(
        "rewiring {} edges: {} sources, {} targets",
        rewirer.num_edges(),
        rewirer.num_sources(),
        rewirer.num_targets()
    );

    let jobs = generate_minibatch_intervals(args.n_rand, args.block_size);

    let pb = ProgressBar::new(jobs.len() as u64);
    if !args.show_progress {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    let done = AtomicUsize::new(0);

    let partial_stats = jobs
        .par_iter()
        .progress_with(pb.clone())
        .map(|&(lb, ub)| -> anyhow::Result<NullStat> {
            let mut rewirer = rewirer.clone();
            let mut rand_edges = edges.to_vec();
            let mut stat = NullStat::new(n_sample);

            for r in lb..ub {
                let mut rng = round_rng(args.rseed, r);

                let round = rewire_round(
                    &mut rewirer,
                    &mut rng,
                    &mut rand_edges,
                    args.n_retry,
                    args.ratio_thres,
                );

                if !round.is_complete(args.ratio_thres) {
                    warn!(
                        "round {}: maximal reconnection ratio is {} after {} attempts",
                        r, round.ratio, round.n_attempt
                    );
                }

                // nothing reconnected: the empty network sums to zero
                let score_rand = if round.n_edge == 0 {
                    warn!("round {}: no edge could be reconnected, scored as 0", r);
                    DVec::zeros(n_sample)
                } else {
                    network_sum(samples, &rand_edges, round.n_edge)?
                };
                stat.add(&observed, &score_rand, &round, args.ratio_thres);
            }

            log_milestones(&done, ub - lb, args.n_rand);
            Ok(stat)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    pb.finish_and_clear();

    let stat = partial_stats
        .into_iter()
        .fold(NullStat::new(n_sample), NullStat::merge);

    if stat.n_incomplete > 0 {
        warn!(
            "{} out of {} randomized networks stayed below the completeness ratio {}",
            stat.n_incomplete, stat.n_round, args.ratio_thres
        );
    }

    stat.finalize(observed, args.compute_zscore)
}
