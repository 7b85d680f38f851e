use crate::common::*;
use crate::input::*;
use crate::report::*;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about, term_width = 80)]
/// Ligand-receptor network enrichment per sample by degree-preserving
/// stub rewiring of the interaction network
pub struct ScoreArgs {
    /// expression matrix: the first line lists sample names and each
    /// following line holds a gene name and one value per sample
    /// (whitespace-separated, `.gz` allowed)
    pub matrix_file: Box<str>,

    /// tab-separated interaction network, one directed edge (e.g.,
    /// ligand -> receptor) per line (`.gz` allowed)
    pub network_file: Box<str>,

    /// output file (`.gz` to compress, `stdout` to print)
    pub output_file: Box<str>,

    /// number of randomized networks
    pub n_rand: usize,

    /// maximum number of rewiring attempts per randomized network
    #[arg(long, default_value_t = DEFAULT_NUM_RETRY)]
    pub num_retry: usize,

    /// accept a rewiring once this fraction of edges is reconnected
    #[arg(long, default_value_t = DEFAULT_RATIO_THRES)]
    pub ratio_threshold: f64,

    /// random seed
    #[arg(long, default_value_t = DEFAULT_RSEED)]
    pub rseed: u64,

    /// number of randomized networks per parallel job
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// report ratio and p-value only
    #[arg(long, default_value_t = false)]
    pub no_zscore: bool,

    /// column of the source (ligand) names in the network file (0-based)
    #[arg(long, default_value_t = 1)]
    pub source_column: usize,

    /// column of the target (receptor) names in the network file (0-based)
    #[arg(long, default_value_t = 3)]
    pub target_column: usize,

    /// the network file has no header line
    #[arg(long, default_value_t = false)]
    pub no_header: bool,

    /// verbosity
    #[arg(long, short)]
    pub verbose: bool,
}

/// Score every sample of the expression matrix against randomized
/// networks and write the report
pub fn run_network_score(args: &ScoreArgs) -> anyhow::Result<NetworkScoreOut> {
    let data = read_expression_matrix(&args.matrix_file)?;

    let columns = NetworkColumns {
        source: args.source_column,
        target: args.target_column,
        has_header: !args.no_header,
    };

    let edges = read_network(&args.network_file, &data.vertex_index(), &columns)?;

    if edges.is_empty() {
        return Err(anyhow::anyhow!(
            "no edge of {} was found in {}",
            args.network_file,
            args.matrix_file
        ));
    }

    info!(
        "Testing {} edges over {} samples with {} randomizations",
        edges.len(),
        data.num_samples(),
        args.n_rand
    );

    let score_args = NetworkScoreArgs {
        n_rand: args.n_rand,
        n_retry: args.num_retry,
        ratio_thres: args.ratio_threshold,
        rseed: args.rseed,
        block_size: args.block_size,
        compute_zscore: !args.no_zscore,
        show_progress: args.verbose,
    };

    let out = network_score(&data.samples, &edges, &score_args)?;

    info!(
        "{} incomplete rewirings, minimum completeness {}",
        out.num_incomplete_rounds, out.min_completeness
    );

    write_score_report(&args.output_file, &data.sample_names, &out)?;

    info!("Done");
    Ok(out)
}
