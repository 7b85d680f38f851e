#![allow(dead_code)]

use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::tempdir;

/// Field delimiter of a text record
pub enum Delimiter {
    Whitespace,
    Str(String),
    Chars(Vec<char>),
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Str(s.to_string())
    }
}

impl From<char> for Delimiter {
    fn from(c: char) -> Self {
        Delimiter::Chars(vec![c])
    }
}

impl From<&[char]> for Delimiter {
    fn from(chars: &[char]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl<const N: usize> From<&[char; N]> for Delimiter {
    fn from(chars: &[char; N]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl Delimiter {
    fn split_words(&self, line: &str) -> Vec<Box<str>> {
        match self {
            Delimiter::Whitespace => line.split_whitespace().map(Box::from).collect(),
            Delimiter::Str(s) => line.split(s.as_str()).map(Box::from).collect(),
            Delimiter::Chars(chars) => line.split(chars.as_slice()).map(Box::from).collect(),
        }
    }
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", input_file, e))?;

    match Path::new(input_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    // we can simply override with stdout
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let file = File::create(output_file)
        .map_err(|e| anyhow::anyhow!("cannot create {}: {}", output_file, e))?;

    match Path::new(output_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Read every non-empty record of the input file into memory.
/// Records may end with `\n`, `\r\n`, or a bare `\r`.
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_records(input_file: &str) -> anyhow::Result<Vec<Box<str>>> {
    let mut buf = open_buf_reader(input_file)?;
    let mut content = String::new();
    buf.read_to_string(&mut content)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", input_file, e))?;

    Ok(content
        .split(['\n', '\r'])
        .filter(|x| !x.trim().is_empty())
        .map(Box::from)
        .collect())
}

///
/// Write every line into the output_file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("unexpected error: {}", e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

pub struct ReadLinesOut<T: Send> {
    pub lines: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

fn is_not_comment_line(line: &str) -> bool {
    !(line.starts_with('#') || line.starts_with('%'))
}

///
/// Read records and split them into words.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: impl Into<Delimiter>,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    let delim = delim.into();

    let records: Vec<Box<str>> = read_records(input_file)?
        .into_iter()
        .filter(|x| is_not_comment_line(x))
        .collect();

    let mut header = vec![];

    let body = if hdr_line < 0 {
        &records[..]
    } else {
        let n_skip = hdr_line as usize;
        if records.len() < (n_skip + 1) {
            return Err(anyhow::anyhow!("not enough data in {}", input_file));
        }
        header.extend(delim.split_words(&records[n_skip]));
        &records[(n_skip + 1)..]
    };

    // Parsing takes more time, so split them into parallel jobs
    let lines = body.par_iter().map(|s| delim.split_words(s)).collect();

    Ok(ReadLinesOut { lines, header })
}

///
/// Create a temporary directory and suggest a file name
/// * `suffix` - suffix of the file name
///
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<std::path::PathBuf> {
    let temp_dir = tempdir()?.path().to_path_buf();
    std::fs::create_dir_all(&temp_dir)?;
    let temp_file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile_in(temp_dir)?
        .path()
        .to_owned();

    Ok(temp_file)
}

/// Generate minibatch intervals
/// * `ntot` - number of total jobs
/// * `batch_size` - the size of each batch
pub fn generate_minibatch_intervals(ntot: usize, batch_size: usize) -> Vec<(usize, usize)> {
    let num_batches = ntot.div_ceil(batch_size);
    (0..num_batches)
        .map(|b| {
            let lb: usize = b * batch_size;
            let ub: usize = ((b + 1) * batch_size).min(ntot);
            (lb, ub)
        })
        .collect::<Vec<_>>()
}
