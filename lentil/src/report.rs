use crate::common::*;

///
/// Write one tab-separated line per sample:
/// `Sample  Ratio  [Zscore]  Pvalue`
///
/// * `output_file` - file name--either gzipped or not, or `stdout`
/// * `sample_names` - sample names in the matrix order
/// * `out` - network scores
///
pub fn write_score_report(
    output_file: &str,
    sample_names: &[Box<str>],
    out: &NetworkScoreOut,
) -> anyhow::Result<()> {
    let n_sample = sample_names.len();
    if out.pvalue.len() != n_sample || out.ratio.len() != n_sample {
        return Err(anyhow::anyhow!(
            "{} sample names, but {} scores",
            n_sample,
            out.pvalue.len()
        ));
    }

    let mut lines = Vec::with_capacity(n_sample + 1);

    match out.zscore.as_ref() {
        Some(zscore) => {
            lines.push("Sample\tRatio\tZscore\tPvalue".to_string());
            for (s, name) in sample_names.iter().enumerate() {
                lines.push(format!(
                    "{}\t{}\t{}\t{}",
                    name, out.ratio[s], zscore[s], out.pvalue[s]
                ));
            }
        }
        None => {
            lines.push("Sample\tRatio\tPvalue".to_string());
            for (s, name) in sample_names.iter().enumerate() {
                lines.push(format!("{}\t{}\t{}", name, out.ratio[s], out.pvalue[s]));
            }
        }
    }

    io::write_lines(&lines, output_file)
}
