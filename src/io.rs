//! Point-file parsing and fixed-precision matrix formatting.
//!
//! The exchange format is plain text: one point per line, coordinates
//! comma-separated. The line count fixes n and the field count of the first
//! line fixes d. Output uses the same shape with every entry printed to
//! exactly 4 decimal digits.

use std::io::BufRead;

use ndarray::Array2;

use crate::{Error, Result};

/// Read an n × d point matrix from comma-separated text.
///
/// Blank lines (including a trailing newline) are ignored. Any unparsable
/// field or a row whose width disagrees with the first row is
/// [`Error::InputFormat`], reported with its 1-based line number.
pub fn read_points<R: BufRead>(reader: R) -> Result<Array2<f64>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut width = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.map_err(|e| Error::InputFormat {
            line: lineno,
            reason: e.to_string(),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| Error::InputFormat {
                    line: lineno,
                    reason: format!("bad coordinate {field:?}: {e}"),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if rows.is_empty() {
            width = row.len();
        } else if row.len() != width {
            return Err(Error::InputFormat {
                line: lineno,
                reason: format!("expected {} coordinates, found {}", width, row.len()),
            });
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(Error::InputFormat {
            line: 0,
            reason: "empty input".to_string(),
        });
    }

    let n = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, width), flat).map_err(|e| Error::InputFormat {
        line: 0,
        reason: e.to_string(),
    })
}

/// Render a matrix as comma-separated text, 4 decimal digits per entry.
///
/// One row per line, no trailing comma, trailing newline after the last row.
pub fn format_matrix(m: &Array2<f64>) -> String {
    let mut out = String::new();
    for row in m.rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}
