use super::super::featurizer::SparseVector;

/// Per-feature bin boundaries.
///
/// Bin 0 always holds zero (absent sparse entries). A value `v` falls in the first bin `b`
/// with `v <= bounds[b]`; the last bound is `f64::MAX`.
#[derive(Clone, Debug, PartialEq)]
pub struct BinMapper {
    bounds: Vec<Vec<f64>>,
}

impl BinMapper {
    /// Compute boundaries from the non-zero values of each feature
    pub fn fit(rows: &[SparseVector], dimension: usize, max_bins: usize) -> Self {
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); dimension];

        for row in rows {
            for &(feature, value) in row.entries() {
                if let Some(column) = values.get_mut(feature as usize) {
                    column.push(f64::from(value));
                }
            }
        }

        let bounds = values
            .into_iter()
            .map(|column| feature_bounds(column, max_bins))
            .collect();

        Self { bounds }
    }

    /// Number of bins used by a feature
    pub fn num_bins(&self, feature: usize) -> usize {
        self.bounds[feature].len()
    }

    /// Upper bound of a bin, used as a split threshold
    pub fn upper_bound(&self, feature: usize, bin: usize) -> f64 {
        self.bounds[feature][bin]
    }

    /// Map a raw value to its bin
    pub fn bin(&self, feature: usize, value: f64) -> u16 {
        let bounds = &self.bounds[feature];
        let bin = bounds.partition_point(|bound| *bound < value);

        bin.min(bounds.len() - 1) as u16
    }

    /// Map every non-zero entry of a row to `(feature, bin)`
    pub fn bin_row(&self, row: &SparseVector) -> Vec<(u32, u16)> {
        row.entries()
            .iter()
            .filter(|(feature, _)| (*feature as usize) < self.bounds.len())
            .map(|&(feature, value)| (feature, self.bin(feature as usize, f64::from(value))))
            .collect()
    }
}

fn feature_bounds(mut column: Vec<f64>, max_bins: usize) -> Vec<f64> {
    column.retain(|v| *v > 0.0);
    column.sort_by(|a, b| a.total_cmp(b));
    column.dedup();

    let mut bounds = vec![0.0];
    let distinct = column.len();

    if distinct > 0 {
        let groups = (max_bins - 1).min(distinct);

        // Cut between consecutive distinct values so each group holds ~equal distinct values
        for g in 1..groups {
            let i = g * distinct / groups;
            let cut = (column[i - 1] + column[i]) / 2.0;
            if bounds.last().map_or(true, |last| cut > *last) {
                bounds.push(cut);
            }
        }
    }

    bounds.push(f64::MAX);

    bounds
}
