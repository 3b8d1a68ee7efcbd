use tracing::info;

/// Summary statistics of a set of edge lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStats {
    pub count: usize,
    pub average: f64,
    /// Most frequent length after rounding to four decimals.
    pub mode: f64,
    pub mode_frequency: usize,
    pub above_average: usize,
    pub below_average: usize,
    /// Mean of the lengths below the average, or zero if there are none.
    pub below_average_mean: f64,
}

impl EdgeStats {
    /// Returns `None` for an empty slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn from_lengths(lengths: &[f64]) -> Option<Self> {
        if lengths.is_empty() {
            return None;
        }
        let count = lengths.len();
        let average = lengths.iter().sum::<f64>() / count as f64;

        // Frequencies of rounded lengths in order of first appearance; ties
        // go to the earliest.
        let mut buckets: Vec<(i64, usize)> = Vec::new();
        for l in lengths {
            let key = (l * 1e4).round() as i64;
            match buckets.iter_mut().find(|(k, _)| *k == key) {
                Some((_, n)) => *n += 1,
                None => buckets.push((key, 1)),
            }
        }
        let (mode_key, mode_frequency) = buckets
            .iter()
            .fold((0, 0), |best, &(k, n)| if n > best.1 { (k, n) } else { best });

        let below: Vec<f64> = lengths.iter().copied().filter(|l| *l < average).collect();
        let below_average_mean = if below.is_empty() {
            0.0
        } else {
            below.iter().sum::<f64>() / below.len() as f64
        };

        Some(Self {
            count,
            average,
            mode: mode_key as f64 / 1e4,
            mode_frequency,
            above_average: lengths.iter().filter(|l| **l > average).count(),
            below_average: below.len(),
            below_average_mean,
        })
    }

    pub fn log(&self, set: &'static str) {
        info!(
            set,
            count = self.count,
            average = self.average,
            mode = self.mode,
            mode_frequency = self.mode_frequency,
            above_average = self.above_average,
            below_average = self.below_average,
            below_average_mean = self.below_average_mean,
            "edge length statistics"
        );
    }
}
