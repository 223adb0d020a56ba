//! Dense labeled dataset and its delimited text format
//!
//! Each line of the text format holds one sample:
//! - all columns but the last are features
//! - the last column is the label (+1 or -1)
//! - columns are separated by whitespace unless another delimiter is given
//! - blank lines and lines starting with `#` are skipped

use crate::core::{Result, SVMError};
use log::{debug, warn};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Column separator used when reading delimited text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Any run of whitespace
    #[default]
    Whitespace,
    /// A single character such as `,` or `;`
    Char(char),
}

impl Delimiter {
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Whitespace => line.split_whitespace().collect(),
            Delimiter::Char(c) => line.split(*c).map(str::trim).collect(),
        }
    }
}

/// Ordered samples with a feature matrix (`m×n`) and ±1 labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Vec<f64>,
}

impl Dataset {
    /// Create a dataset, checking shape and labels
    pub fn new(features: Array2<f64>, labels: Vec<f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(SVMError::EmptyDataset);
        }
        if features.nrows() != labels.len() {
            return Err(SVMError::DimensionMismatch {
                expected: features.nrows(),
                actual: labels.len(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l != 1.0 && l != -1.0) {
            return Err(SVMError::InvalidLabel(bad));
        }
        Ok(Self { features, labels })
    }

    /// Create a dataset from row vectors
    ///
    /// # Errors
    /// `DimensionMismatch` if the rows do not all have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Self> {
        let n = rows.first().map(Vec::len).ok_or(SVMError::EmptyDataset)?;
        let m = rows.len();
        let mut flat = Vec::with_capacity(m * n);
        for row in rows {
            if row.len() != n {
                return Err(SVMError::DimensionMismatch {
                    expected: n,
                    actual: row.len(),
                });
            }
            flat.extend(row);
        }
        let features = Array2::from_shape_vec((m, n), flat)
            .map_err(|e| SVMError::InvalidDataset(e.to_string()))?;
        Self::new(features, labels)
    }

    /// Load a dataset from a delimited text file
    pub fn from_file<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        Self::from_reader(BufReader::new(file), delimiter)
    }

    /// Load a dataset from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, delimiter: Delimiter) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut labels = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (row, label) = Self::parse_line(line, delimiter)
                .map_err(|e| SVMError::ParseError(format!("line {}: {e}", line_num + 1)))?;
            if let Some(first) = rows.first() {
                let expected = first.len();
                if row.len() != expected {
                    return Err(SVMError::DimensionMismatch {
                        expected,
                        actual: row.len(),
                    });
                }
            }
            rows.push(row);
            labels.push(label);
        }

        if rows.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        debug!("Parsed {} samples with {} features", rows.len(), rows[0].len());
        Self::from_rows(rows, labels)
    }

    fn parse_line(
        line: &str,
        delimiter: Delimiter,
    ) -> std::result::Result<(Vec<f64>, f64), String> {
        let fields = delimiter.split(line);
        let Some((label_str, feature_strs)) = fields.split_last() else {
            return Err("no fields".to_string());
        };
        if feature_strs.is_empty() {
            return Err(format!("expected features before the label in '{line}'"));
        }

        let label = label_str
            .parse::<f64>()
            .map_err(|_| format!("invalid label '{label_str}'"))?;
        if label != 1.0 && label != -1.0 {
            return Err(format!("label must be +1 or -1, got {label_str}"));
        }

        let row = feature_strs
            .iter()
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| format!("invalid feature value '{s}'"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((row, label))
    }

    /// Write the dataset as comma-separated rows, label last
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for (row, label) in self.features.outer_iter().zip(&self.labels) {
            let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{},{}", fields.join(","), label).map_err(SVMError::IoError)?;
        }
        writer.flush().map_err(SVMError::IoError)?;
        Ok(())
    }

    /// Save the dataset to a file (see [`Dataset::write_to`])
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        self.write_to(BufWriter::new(file))
    }

    /// Drop every sample that contains a NaN or infinite feature
    pub fn retain_finite(self) -> Result<Self> {
        let keep: Vec<usize> = self
            .features
            .outer_iter()
            .enumerate()
            .filter_map(|(i, row)| {
                if row.iter().all(|v| v.is_finite()) {
                    Some(i)
                } else {
                    warn!("Dropping sample {i}: non-finite feature value");
                    None
                }
            })
            .collect();

        if keep.len() == self.len() {
            return Ok(self);
        }
        let features = self.features.select(Axis(0), &keep);
        let labels = keep.iter().map(|&i| self.labels[i]).collect();
        Self::new(features, labels)
    }

    /// Whether every feature value is finite
    pub fn is_finite(&self) -> bool {
        self.features.iter().all(|v| v.is_finite())
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed dataset; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of features per sample
    pub fn dim(&self) -> usize {
        self.features.ncols()
    }

    /// Feature matrix
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Labels, one per sample
    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Feature vector of sample `i`
    pub fn sample(&self, i: usize) -> ArrayView1<'_, f64> {
        self.features.row(i)
    }

    /// Number of (positive, negative) samples
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l > 0.0).count();
        (positives, self.labels.len() - positives)
    }
}
