use approx::assert_abs_diff_eq;
use clap::Parser;
use lentil::input::*;
use lentil::report::*;
use lentil::run_score::*;
use network_util::common_io::{create_temp_dir_file, read_records, write_lines};
use network_util::network_stat::*;
use network_util::traits::VertexSamples;

fn write_temp(suffix: &str, content: &str) -> anyhow::Result<String> {
    let file = create_temp_dir_file(suffix)?;
    std::fs::write(&file, content)?;
    Ok(file.to_string_lossy().to_string())
}

#[test]
fn expression_matrix_skips_duplicated_names() -> anyhow::Result<()> {
    let file = write_temp(".txt", "s1 s2\nA 1 2\nB 3 4\nA 9 9\nC 5.5 -1e-2\n")?;

    let data = read_expression_matrix(&file)?;
    assert_eq!(data.num_samples(), 2);
    assert_eq!(data.num_vertices(), 3);
    let sample_names: Vec<Box<str>> = vec!["s1".into(), "s2".into()];
    let vertex_names: Vec<Box<str>> = vec!["A".into(), "B".into(), "C".into()];
    assert_eq!(data.sample_names, sample_names);
    assert_eq!(data.vertex_names, vertex_names);

    assert_eq!(data.samples.vertex_samples(0), Some(&[1.0, 2.0][..]));
    assert_eq!(data.samples.vertex_samples(2), Some(&[5.5, -0.01][..]));
    assert_eq!(data.samples.vertex_samples(3), None);

    let index = data.vertex_index();
    assert_eq!(index.get("B"), Some(&1));
    Ok(())
}

#[test]
fn expression_matrix_with_corner_label_and_gzip() -> anyhow::Result<()> {
    let file = create_temp_dir_file(".txt.gz")?;
    let file = file.to_string_lossy().to_string();
    let lines = vec!["gene\tspot1\tspot2\tspot3", "A\t1\t2\t3", "B\t4\t5\t6"];
    write_lines(&lines, &file)?;

    let data = read_expression_matrix(&file)?;
    assert_eq!(data.num_samples(), 3);
    assert_eq!(data.sample_names[0].as_ref(), "spot1");
    assert_eq!(data.samples.vertex_samples(1), Some(&[4.0, 5.0, 6.0][..]));
    Ok(())
}

#[test]
fn expression_matrix_rejects_bad_numbers() -> anyhow::Result<()> {
    let file = write_temp(".txt", "s1 s2\nA 1 x\n")?;
    assert!(read_expression_matrix(&file).is_err());

    let file = write_temp(".txt", "s1 s2 s3\nA 1 2 3\nB 1\n")?;
    assert!(read_expression_matrix(&file).is_err());
    Ok(())
}

#[test]
fn expression_matrix_short_first_row_is_fatal() -> anyhow::Result<()> {
    // the first row must not be mistaken for a corner-label layout
    let file = write_temp(".txt", "s1 s2\nA 1\nB 3 4\nC 5 6\n")?;
    assert!(read_expression_matrix(&file).is_err());

    // the corner label is still recognized when a later row is short
    let file = write_temp(".txt", "gene s1 s2\nA 1 2\nB 3\nC 5 6\n")?;
    assert!(read_expression_matrix(&file).is_err());

    // rows that fit neither layout
    let file = write_temp(".txt", "s1 s2\nA 1 2 3 4\nB 1 2 3 4\n")?;
    assert!(read_expression_matrix(&file).is_err());
    Ok(())
}

fn toy_vertex_index() -> anyhow::Result<ExpressionData> {
    let file = write_temp(".txt", "s1 s2\nA 1 0.5\nB 2 0.25\nC 3 0.75\n")?;
    read_expression_matrix(&file)
}

#[test]
fn network_drops_unknown_and_duplicated_edges() -> anyhow::Result<()> {
    let data = toy_vertex_index()?;
    let content = "id\tligand\tx\treceptor\r\
                   1\tA\t.\tB\r\
                   2\tB\t.\tC\r\
                   3\tA\t.\tZ\r\
                   4\tA\t.\tB\r\
                   5\tA\t.\tC\r";
    let file = write_temp(".tsv", content)?;

    let edges = read_network(&file, &data.vertex_index(), &NetworkColumns::default())?;
    assert_eq!(edges, vec![(0, 1), (1, 2), (0, 2)]);
    Ok(())
}

#[test]
fn network_without_header() -> anyhow::Result<()> {
    let data = toy_vertex_index()?;
    let file = write_temp(".tsv", "C\tA\nB\tA\n")?;

    let columns = NetworkColumns {
        source: 0,
        target: 1,
        has_header: false,
    };
    let edges = read_network(&file, &data.vertex_index(), &columns)?;
    assert_eq!(edges, vec![(2, 0), (1, 0)]);
    Ok(())
}

fn toy_scores(compute_zscore: bool) -> NetworkScoreOut {
    NetworkScoreOut {
        observed: DVec::from_vec(vec![1.0, 2.0]),
        ratio: DVec::from_vec(vec![0.5, -0.25]),
        zscore: compute_zscore.then(|| DVec::from_vec(vec![2.0, -1.0])),
        pvalue: DVec::from_vec(vec![0.01, 0.75]),
        null_mean: DVec::from_vec(vec![0.5, 2.5]),
        null_var: None,
        clamped_variance: vec![false, false],
        num_incomplete_rounds: 0,
        min_completeness: 1.0,
    }
}

#[test]
fn report_columns() -> anyhow::Result<()> {
    let names: Vec<Box<str>> = vec!["s1".into(), "s2".into()];

    let file = create_temp_dir_file(".tsv")?;
    let file = file.to_string_lossy().to_string();

    write_score_report(&file, &names, &toy_scores(true))?;
    let lines = read_records(&file)?;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].as_ref(), "Sample\tRatio\tZscore\tPvalue");
    assert_eq!(lines[1].as_ref(), "s1\t0.5\t2\t0.01");
    assert_eq!(lines[2].as_ref(), "s2\t-0.25\t-1\t0.75");

    write_score_report(&file, &names, &toy_scores(false))?;
    let lines = read_records(&file)?;
    assert_eq!(lines[0].as_ref(), "Sample\tRatio\tPvalue");
    assert_eq!(lines[1].as_ref(), "s1\t0.5\t0.01");

    assert!(write_score_report(&file, &names[..1], &toy_scores(true)).is_err());
    Ok(())
}

#[test]
fn run_from_command_line() -> anyhow::Result<()> {
    let matrix = write_temp(".txt", "s1 s2\nA 1 0.5\nB 2 0.25\nC 3 0.75\nD 1 1\n")?;
    let network = write_temp(
        ".tsv",
        "id\tligand\tx\treceptor\n1\tA\t.\tB\n2\tB\t.\tC\n3\tA\t.\tC\n",
    )?;
    let output = create_temp_dir_file(".tsv")?;
    let output = output.to_string_lossy().to_string();

    let args = ScoreArgs::try_parse_from([
        "lentil",
        matrix.as_str(),
        network.as_str(),
        output.as_str(),
        "200",
        "--ratio-threshold",
        "0",
        "--rseed",
        "7",
    ])?;
    assert_eq!(args.n_rand, 200);
    assert_eq!(args.num_retry, DEFAULT_NUM_RETRY);

    let out = run_network_score(&args)?;
    for s in 0..2 {
        assert_abs_diff_eq!(out.pvalue[s], 1.0);
        assert_abs_diff_eq!(out.ratio[s], 0.0, epsilon = 1e-12);
    }

    let lines = read_records(&output)?;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].as_ref(), "Sample\tRatio\tZscore\tPvalue");
    assert!(lines[1].starts_with("s1\t"));
    assert!(lines[2].starts_with("s2\t"));
    Ok(())
}

#[test]
fn run_without_matching_edges_fails() -> anyhow::Result<()> {
    let matrix = write_temp(".txt", "s1\nA 1\nB 2\n")?;
    let network = write_temp(".tsv", "id\tligand\tx\treceptor\n1\tX\t.\tY\n")?;
    let output = create_temp_dir_file(".tsv")?;
    let output = output.to_string_lossy().to_string();

    let args = ScoreArgs::try_parse_from([
        "lentil",
        matrix.as_str(),
        network.as_str(),
        output.as_str(),
        "10",
    ])?;
    assert!(run_network_score(&args).is_err());
    Ok(())
}
