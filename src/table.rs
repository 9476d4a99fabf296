//! Space-delimited numeric text tables.
//!
//! Numbers are written the way numpy's `savetxt` writes them by default
//! (`%.18e`, two-digit signed exponent, `inf`/`nan` literals) so the files
//! remain interchangeable with the downstream density estimator and plotting
//! scripts.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::error::{PipelineError, Result};

/// Format a value as `%.18e`
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let raw = format!("{:.18e}", x);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => raw,
    }
}

/// Write `rows` preceded by `header` lines (no comment prefix).
///
/// An empty table with no header produces an empty file.
pub fn write_table(path: &Path, header: &[String], rows: ArrayView2<'_, f64>) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut out = BufWriter::new(file);

    let mut emit = || -> std::io::Result<()> {
        for line in header {
            writeln!(out, "{line}")?;
        }
        for row in rows.rows() {
            let fields: Vec<String> = row.iter().map(|&v| format_float(v)).collect();
            writeln!(out, "{}", fields.join(" "))?;
        }
        out.flush()
    };

    emit().map_err(|e| PipelineError::io(path, e))
}

/// Read a whitespace-delimited table, skipping the first `skip_lines` lines,
/// blank lines and `#` comments. Every row must have the same column count.
pub fn read_table(path: &Path, skip_lines: usize) -> Result<Array2<f64>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::MissingInputFile(path.to_path_buf())
        } else {
            PipelineError::io(path, e)
        }
    })?;

    let mut values: Vec<f64> = Vec::new();
    let mut n_cols: Option<usize> = None;
    let mut n_rows = 0;

    for (idx, line) in BufReader::new(file).lines().enumerate().skip(skip_lines) {
        let line = line.map_err(|e| PipelineError::io(path, e))?;
        let line_no = idx + 1;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let start = values.len();
        for token in content.split_whitespace() {
            let v = parse_float(token).ok_or_else(|| PipelineError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("'{token}' is not a number"),
            })?;
            values.push(v);
        }

        let width = values.len() - start;
        match n_cols {
            None => n_cols = Some(width),
            Some(expected) if expected != width => {
                return Err(PipelineError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    message: format!("expected {expected} columns, found {width}"),
                });
            }
            Some(_) => {}
        }
        n_rows += 1;
    }

    let n_cols = n_cols.unwrap_or(0);
    Array2::from_shape_vec((n_rows, n_cols), values).map_err(|e| PipelineError::Parse {
        path: path.to_path_buf(),
        line: 0,
        message: e.to_string(),
    })
}

fn parse_float(token: &str) -> Option<f64> {
    match token {
        "inf" | "+inf" | "Infinity" => Some(f64::INFINITY),
        "-inf" | "-Infinity" => Some(f64::NEG_INFINITY),
        _ => token.parse().ok(),
    }
}
