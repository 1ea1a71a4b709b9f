use joinx_core::{Error, Result};

/// Zero-mean, unit-variance scaling fit over a set of rows
///
/// Missing cells are skipped while fitting and mapped to the column mean
/// (zero after scaling) when transforming. A column with no spread keeps a
/// scale of one, so constant columns encode to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and population standard deviation
    pub fn fit<'a, I>(rows: I, n_features: usize) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [Option<f64>]>,
    {
        let mut sum = vec![0.0; n_features];
        let mut sum_sq = vec![0.0; n_features];
        let mut count = vec![0usize; n_features];

        let rows: Vec<&[Option<f64>]> = rows.into_iter().collect();
        for row in &rows {
            check_width(row.len(), n_features)?;
            for (j, cell) in row.iter().enumerate() {
                if let Some(v) = cell {
                    sum[j] += v;
                    count[j] += 1;
                }
            }
        }

        let mean: Vec<f64> = sum
            .iter()
            .zip(&count)
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();

        // Second pass around the mean keeps large timestamps from cancelling out
        for row in &rows {
            for (j, cell) in row.iter().enumerate() {
                if let Some(v) = cell {
                    let d = v - mean[j];
                    sum_sq[j] += d * d;
                }
            }
        }

        let scale = sum_sq
            .iter()
            .zip(&count)
            .zip(&mean)
            .map(|((&ss, &c), &m)| {
                let std = if c > 0 { (ss / c as f64).sqrt() } else { 0.0 };
                if std <= 10.0 * f64::EPSILON * m.abs().max(1.0) {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardise rows. Missing cells become zero.
    pub fn transform<'a, I>(&self, rows: I) -> Result<Vec<Vec<f64>>>
    where
        I: IntoIterator<Item = &'a [Option<f64>]>,
    {
        rows.into_iter()
            .map(|row| {
                check_width(row.len(), self.n_features())?;
                Ok(row
                    .iter()
                    .enumerate()
                    .map(|(j, cell)| cell.map_or(0.0, |v| (v - self.mean[j]) / self.scale[j]))
                    .collect())
            })
            .collect()
    }
}

fn check_width(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::InvalidDimension { expected, actual });
    }
    Ok(())
}
