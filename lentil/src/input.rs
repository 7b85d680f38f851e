use crate::common::*;
use network_util::common_io::{read_lines_of_words_delim, Delimiter, ReadLinesOut};

pub struct ExpressionData {
    pub sample_names: Vec<Box<str>>,
    /// vertex (gene) names; the position is the vertex id
    pub vertex_names: Vec<Box<str>>,
    /// column `j` holds the values of vertex `j`
    pub samples: Mat,
}

impl ExpressionData {
    pub fn num_samples(&self) -> usize {
        self.sample_names.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_names.len()
    }

    /// vertex name -> vertex id
    pub fn vertex_index(&self) -> HashMap<Box<str>, usize> {
        self.vertex_names
            .iter()
            .enumerate()
            .map(|(i, x)| (x.clone(), i))
            .collect()
    }
}

///
/// Read a whitespace-separated expression matrix. The first line
/// lists sample names, optionally preceded by a corner label; each
/// following line is a vertex name followed by one value per sample.
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_expression_matrix(input_file: &str) -> anyhow::Result<ExpressionData> {
    let ReadLinesOut { lines, header } =
        read_lines_of_words_delim(input_file, Delimiter::Whitespace, 0)?;

    let lines: Vec<Vec<Box<str>>> = lines.into_iter().filter(|w| !w.is_empty()).collect();

    if lines.is_empty() {
        return Err(anyhow::anyhow!("no data line in {}", input_file));
    }

    // most common row width (ties go to the wider row)
    let mut width_count: HashMap<usize, usize> = HashMap::default();
    for words in lines.iter() {
        *width_count.entry(words.len()).or_default() += 1;
    }
    let row_width = width_count
        .into_iter()
        .max_by_key(|&(w, n)| (n, w))
        .map(|(w, _)| w)
        .unwrap_or(0);

    // name + values on each row, so a header of the same width
    // carries a corner label
    let sample_names: Vec<Box<str>> = if row_width == header.len() {
        header[1..].to_vec()
    } else if row_width == header.len() + 1 {
        header
    } else {
        return Err(anyhow::anyhow!(
            "{}: most rows have {} fields, which does not fit the {} header fields",
            input_file,
            row_width,
            header.len()
        ));
    };

    let n_sample = sample_names.len();
    if n_sample == 0 {
        return Err(anyhow::anyhow!("no sample name in {}", input_file));
    }

    let mut name_set = HashSet::default();
    let mut vertex_names = vec![];
    let mut vertex_lines = vec![];

    for words in lines.iter() {
        let name = words[0].clone();

        // ignore duplicated names
        if !name_set.insert(name.clone()) {
            warn!("Skip duplicated vertex name {}", name);
            continue;
        }

        if words.len() - 1 > n_sample {
            warn!(
                "{}: ignore {} extra fields",
                name,
                words.len() - 1 - n_sample
            );
        }

        vertex_names.push(name);
        vertex_lines.push(words);
    }

    let columns = vertex_lines
        .par_iter()
        .map(|words| -> anyhow::Result<Vec<f64>> {
            let name = &words[0];
            if words.len() - 1 < n_sample {
                return Err(anyhow::anyhow!(
                    "{}: expected {} values, found {}",
                    name,
                    n_sample,
                    words.len() - 1
                ));
            }
            words[1..=n_sample]
                .iter()
                .map(|x| {
                    x.parse::<f64>().map_err(|e| {
                        anyhow::anyhow!("Fail reading number '{}' on line {}: {}", x, name, e)
                    })
                })
                .collect()
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let n_vertex = vertex_names.len();
    let samples = Mat::from_vec(n_sample, n_vertex, columns.concat());

    info!(
        "Read {} vertices x {} samples from {}",
        n_vertex, n_sample, input_file
    );

    Ok(ExpressionData {
        sample_names,
        vertex_names,
        samples,
    })
}

/// Where to find the edge endpoints in a network file
#[derive(Debug, Clone)]
pub struct NetworkColumns {
    pub source: usize,
    pub target: usize,
    pub has_header: bool,
}

impl Default for NetworkColumns {
    fn default() -> Self {
        Self {
            source: 1,
            target: 3,
            has_header: true,
        }
    }
}

///
/// Read directed edges from a tab-separated network file. Only edges
/// whose both endpoints are found in `vertex_index` are kept, and
/// duplicated edges are dropped.
///
/// * `input_file` - file name--either gzipped or not
/// * `vertex_index` - vertex name -> vertex id
/// * `columns` - columns of the source and target names
///
pub fn read_network(
    input_file: &str,
    vertex_index: &HashMap<Box<str>, usize>,
    columns: &NetworkColumns,
) -> anyhow::Result<Vec<Edge>> {
    let hdr_line = if columns.has_header { 0 } else { -1 };
    let ReadLinesOut { lines, header: _ } = read_lines_of_words_delim(input_file, '\t', hdr_line)?;

    let n_vertex = vertex_index.len();
    let lookup = |words: &[Box<str>], col: usize| -> Option<usize> {
        let name = words.get(col)?;
        vertex_index.get(name.trim()).copied()
    };

    let mut included = HashSet::default();
    let mut edges = vec![];
    let mut n_unknown = 0;

    for words in lines.iter() {
        let words = words.as_slice();
        let (Some(i), Some(j)) = (lookup(words, columns.source), lookup(words, columns.target))
        else {
            n_unknown += 1;
            continue;
        };

        // ignore duplicated edge
        if !included.insert(i * n_vertex + j) {
            warn!(
                "Skip duplicated edge\t{}\t{}",
                words[columns.source], words[columns.target]
            );
            continue;
        }

        edges.push((i, j));
    }

    if n_unknown > 0 {
        info!(
            "Dropped {} edges not found in the expression matrix",
            n_unknown
        );
    }

    info!("Read {} edges from {}", edges.len(), input_file);
    Ok(edges)
}
