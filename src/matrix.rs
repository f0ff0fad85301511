//! Plain-text matrix files: one row per line, values separated by whitespace
//! or commas, `#` starting a comment.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};
use ndarray::{Array2, ArrayView2};

use trous_wavelet::Image;

/// Parses matrix text into a validated image.
pub fn parse(text: &str) -> Result<Image> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let row = content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f64>()
                    .with_context(|| format!("line {}: invalid number {tok:?}", lineno + 1))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    if rows.is_empty() {
        bail!("matrix has no rows");
    }
    Image::from_rows(&rows).context("invalid matrix")
}

/// Reads a matrix file.
pub fn read(path: &Path) -> Result<Image> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read matrix: {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse matrix: {}", path.display()))
}

/// Formats a matrix, one space-separated row per line.
///
/// Values use Rust's shortest round-trip representation, so reading the
/// output back is lossless.
pub fn format(data: ArrayView2<'_, f64>) -> String {
    let mut out = String::new();
    for row in data.rows() {
        let mut first = true;
        for v in row {
            if !first {
                out.push(' ');
            }
            first = false;
            let _ = write!(out, "{v:?}");
        }
        out.push('\n');
    }
    out
}

/// Writes a matrix file.
pub fn write(path: &Path, data: &Array2<f64>) -> Result<()> {
    std::fs::write(path, format(data.view()))
        .with_context(|| format!("failed to write matrix: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn parses_mixed_separators_and_comments() {
        let img = parse("# header\n1, 2 3\n\n4,5,6  # trailing\n").unwrap();
        assert_eq!(img.as_array(), &array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = parse("1 2\n3\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid matrix"));
    }

    #[test]
    fn bad_token_reports_line() {
        let err = parse("1 2\n3 x\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(parse("# nothing\n\n").is_err());
    }

    #[test]
    fn write_then_read_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.txt");
        let data = array![[0.1, -2.5e-17], [1.0 / 3.0, 42.0]];
        write(&path, &data).unwrap();
        let back = read(&path).unwrap();
        assert_eq!(back.as_array(), &data);
    }
}
