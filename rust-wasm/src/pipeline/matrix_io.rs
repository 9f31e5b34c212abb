//! Sensing matrix loading
//!
//! Matrices live in a directory as `H-<id>.csv`: no header row, one matrix
//! row per record, comma-separated. A gzip-compressed `H-<id>.csv.gz` is used
//! when the plain file is absent; compression is detected from the content,
//! not the extension.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::{ReconError, Result};
use crate::linalg::SensingMatrix;
use crate::pipeline::request::MatrixId;

/// Check if bytes are gzip compressed
fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// `<dir>/H-<id>.csv`
pub fn matrix_path(dir: &Path, id: &MatrixId) -> PathBuf {
    dir.join(format!("H-{}.csv", id))
}

/// Find the matrix file for `id`, preferring the uncompressed one
pub fn locate_matrix(dir: &Path, id: &MatrixId) -> Result<PathBuf> {
    let plain = matrix_path(dir, id);
    if plain.is_file() {
        return Ok(plain);
    }
    let compressed = dir.join(format!("H-{}.csv.gz", id));
    if compressed.is_file() {
        return Ok(compressed);
    }
    Err(ReconError::MatrixNotFound { path: plain })
}

/// Load the sensing matrix for `id` from `dir`
pub fn load_matrix(dir: &Path, id: &MatrixId) -> Result<SensingMatrix> {
    let path = locate_matrix(dir, id)?;
    let bytes = fs::read(&path)?;
    let matrix = parse_matrix(&bytes, &path)?;
    info!(path = %path.display(), rows = matrix.rows(), cols = matrix.cols(), "loaded sensing matrix");
    Ok(matrix)
}

/// Parse CSV (optionally gzipped) bytes into a dense matrix
///
/// # Arguments
/// * `bytes` - File contents
/// * `source` - Path used in error messages
pub fn parse_matrix(bytes: &[u8], source: &Path) -> Result<SensingMatrix> {
    let reader: Box<dyn Read + '_> = if is_gzip(bytes) {
        debug!(path = %source.display(), "matrix file is gzip compressed");
        Box::new(GzDecoder::new(Cursor::new(bytes)))
    } else {
        Box::new(Cursor::new(bytes))
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut data = Vec::new();
    let mut rows = 0usize;
    let mut cols = 0usize;

    for record in csv_reader.records() {
        let record = record.map_err(|e| ReconError::MalformedMatrix {
            path: source.to_path_buf(),
            line: e.position().map_or(0, |p| p.line()),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(0, |p| p.line());

        for (col, field) in record.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| ReconError::MalformedMatrix {
                path: source.to_path_buf(),
                line,
                message: format!("column {} is not a number: '{}'", col + 1, field),
            })?;
            data.push(value);
        }
        if rows == 0 {
            cols = record.len();
        }
        rows += 1;
    }

    SensingMatrix::from_row_major(rows, cols, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn id(s: &str) -> MatrixId {
        MatrixId::new(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let h = parse_matrix(b"1,2,3\n4, 5 ,6\n", Path::new("H-1.csv")).unwrap();
        assert_eq!(h.shape(), (2, 3));
        assert_eq!(h.view()[[1, 1]], 5.0);
    }

    #[test]
    fn test_parse_scientific_notation() {
        let h = parse_matrix(b"1e-3,-2.5E2\n0,7\n", Path::new("H-1.csv")).unwrap();
        assert_eq!(h.view()[[0, 0]], 1e-3);
        assert_eq!(h.view()[[0, 1]], -250.0);
    }

    #[test]
    fn test_parse_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"2,0\n0,3\n").unwrap();
        let bytes = encoder.finish().unwrap();

        let h = parse_matrix(&bytes, Path::new("H-1.csv.gz")).unwrap();
        assert_eq!(h.shape(), (2, 2));
        assert_eq!(h.view()[[1, 1]], 3.0);
    }

    #[test]
    fn test_ragged_rows() {
        let err = parse_matrix(b"1,2\n3\n", Path::new("H-1.csv")).unwrap_err();
        assert!(matches!(err, ReconError::MalformedMatrix { .. }));
    }

    #[test]
    fn test_non_numeric_field() {
        let err = parse_matrix(b"1,2\n3,abc\n", Path::new("H-1.csv")).unwrap_err();
        match err {
            ReconError::MalformedMatrix { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("column 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(
            parse_matrix(b"", Path::new("H-1.csv")),
            Err(ReconError::EmptyMatrix { .. })
        ));
    }

    #[test]
    fn test_load_and_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("H-7.csv"), "1,0\n0,1\n").unwrap();

        let h = load_matrix(dir.path(), &id("7")).unwrap();
        assert_eq!(h.shape(), (2, 2));

        match load_matrix(dir.path(), &id("8")) {
            Err(ReconError::MatrixNotFound { path }) => {
                assert_eq!(path, dir.path().join("H-8.csv"));
            }
            other => panic!("expected MatrixNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_locate_prefers_plain() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("H-2.csv.gz"), b"").unwrap();
        assert_eq!(
            locate_matrix(dir.path(), &id("2")).unwrap(),
            dir.path().join("H-2.csv.gz")
        );
        fs::write(dir.path().join("H-2.csv"), "1\n").unwrap();
        assert_eq!(locate_matrix(dir.path(), &id("2")).unwrap(), dir.path().join("H-2.csv"));
    }
}
