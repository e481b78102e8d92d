// ============================================================
// Layer 4 — Pretrained Vector Loader
// ============================================================
// Reads fastText text-format vectors:
//
//   <count> <dim>
//   the 0.0123 -0.4410 ...
//   bank 0.2031 0.0020 ...
//
// Rows are ranked by corpus frequency, so truncating the file to
// the first voc_size - 1 tokens keeps the most useful words.
// Index 0 is the reserved unknown token with a zero vector.

use anyhow::{bail, Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::traits::VectorSource;
use crate::domain::vocabulary::{PretrainedVectors, Vocabulary};

/// Default file name inside the data directory.
pub const VECTORS_FILE: &str = "vectors.vec";

pub struct FastTextVectors {
    path: PathBuf,
}

impl FastTextVectors {
    /// Look for `vectors.vec` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { path: data_dir.as_ref().join(VECTORS_FILE) }
    }
}

impl VectorSource for FastTextVectors {
    fn fetch_vocabulary_and_vectors(&self, voc_size: usize) -> Result<(Vocabulary, PretrainedVectors)> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open vectors file '{}'", self.path.display()))?;
        let (vocab, vectors) = parse_vectors(BufReader::new(file), voc_size)
            .with_context(|| format!("Malformed vectors file '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} vectors of dimension {} from '{}'",
            vectors.rows,
            vectors.dim,
            self.path.display()
        );
        Ok((vocab, vectors))
    }
}

/// Parse fastText text vectors, keeping at most `voc_size` rows
/// including the reserved unknown row.
pub fn parse_vectors<R: BufRead>(reader: R, voc_size: usize) -> Result<(Vocabulary, PretrainedVectors)> {
    let mut lines = reader.lines();

    let header = lines.next().context("empty vectors file")??;
    let mut fields = header.split_whitespace();
    let _count: usize = fields
        .next()
        .context("missing vector count in header")?
        .parse()
        .context("vector count is not a number")?;
    let dim: usize = fields
        .next()
        .context("missing dimension in header")?
        .parse()
        .context("dimension is not a number")?;
    if dim == 0 {
        bail!("vector dimension must be positive");
    }

    let mut tokens: Vec<String> = Vec::new();
    // Row 0 is the zero vector of the unknown token
    let mut values: Vec<f32> = vec![0.0; dim];

    for (line_no, line) in lines.enumerate() {
        if tokens.len() + 1 >= voc_size {
            break;
        }
        let line = line?;
        match parse_row(&line, dim) {
            Some((token, row)) => {
                tokens.push(token.to_string());
                values.extend(row);
            }
            None if line.trim().is_empty() => {}
            None => tracing::warn!(
                "Skipping malformed vector row on line {} (expected a token and {dim} values)",
                line_no + 2
            ),
        }
    }

    let vocab = Vocabulary::from_tokens(tokens, voc_size);
    // Duplicated tokens are dropped by the vocabulary; keep rows aligned
    if vocab.len() != values.len() / dim {
        bail!("vectors file contains duplicated tokens");
    }
    let vectors = PretrainedVectors::new(vocab.len(), dim, values)?;
    Ok((vocab, vectors))
}

/// Split one row into its token and exactly `dim` values.
///
/// Values are the last `dim` space-separated fields; everything before
/// them is the token, which may itself contain non-ASCII whitespace.
fn parse_row(line: &str, dim: usize) -> Option<(&str, Vec<f32>)> {
    let line = line.trim_end_matches([' ', '\r']);
    let mut fields = line.rsplitn(dim + 1, ' ');
    let mut row: Vec<f32> = fields
        .by_ref()
        .take(dim)
        .map(|f| f.parse::<f32>().ok())
        .collect::<Option<_>>()?;
    let token = fields.next()?;
    if row.len() != dim || token.is_empty() {
        return None;
    }
    row.reverse();
    Some((token, row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "4 3\n\
the 0.1 0.2 0.3\n\
bank 1 2 3\n\
oil -1 -2 -3\n\
wheat 4 5 6\n";

    #[test]
    fn test_parses_rows_after_reserved_slot() {
        let (vocab, vectors) = parse_vectors(Cursor::new(SAMPLE), 100).unwrap();
        assert_eq!(vocab.len(), 5);
        assert_eq!(vectors.rows, 5);
        assert_eq!(vectors.dim, 3);
        assert_eq!(vectors.row(0), Some(&[0.0, 0.0, 0.0][..]));
        assert_eq!(vocab.get("bank"), 2);
        assert_eq!(vectors.row(2), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn test_truncates_to_voc_size() {
        let (vocab, vectors) = parse_vectors(Cursor::new(SAMPLE), 3).unwrap();
        assert_eq!(vocab.tokens(), &["<unk>", "the", "bank"]);
        assert_eq!(vectors.rows, 3);
        assert_eq!(vectors.values.len(), 9);
    }

    #[test]
    fn test_skips_ragged_rows() {
        let ragged = "3 3\nthe 0.1 0.2\nbank 1 2 3\noil 1 x 3\n";
        let (vocab, vectors) = parse_vectors(Cursor::new(ragged), 10).unwrap();
        assert_eq!(vocab.tokens(), &["<unk>", "bank"]);
        assert_eq!(vectors.row(1), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn test_keeps_unicode_whitespace_token() {
        let text = "3 2\nthe 0.1 0.2\n\u{a0} 0.3 0.4\nbank 0.5 0.6 \n";
        let (vocab, vectors) = parse_vectors(Cursor::new(text), 10).unwrap();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.get("\u{a0}"), 2);
        assert_eq!(vectors.row(2), Some(&[0.3, 0.4][..]));
        assert_eq!(vectors.row(3), Some(&[0.5, 0.6][..]));
    }

    #[test]
    fn test_reads_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VECTORS_FILE), SAMPLE).unwrap();
        let (vocab, _) = FastTextVectors::new(dir.path())
            .fetch_vocabulary_and_vectors(10)
            .unwrap();
        assert_eq!(vocab.get("wheat"), 4);
    }
}
