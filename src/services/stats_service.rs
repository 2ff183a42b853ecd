//! Descriptive statistics behind the tips charts

use std::collections::BTreeMap;

/// One histogram bin, `[start, end)` except the last which is closed
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Five-number summary with Tukey whiskers
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Pairwise Pearson correlations; `None` where a column is constant
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Mean of `value` per distinct `key`, ordered by key
pub fn mean_by<T, K, V>(items: &[T], key: K, value: V) -> Vec<(String, f64)>
where
    K: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
{
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for item in items {
        let entry = groups.entry(key(item)).or_insert((0.0, 0));
        entry.0 += value(item);
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(k, (sum, n))| (k.to_string(), sum / n as f64))
        .collect()
}

/// Equal-width histogram over the data range
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Gaussian kernel density at each point of `grid`, bandwidth by Scott's rule
pub fn kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = values.len();
    let bandwidth = match std_dev(values) {
        Some(sd) if sd > 0.0 => sd * (n as f64).powf(-0.2),
        _ => return vec![0.0; grid.len()],
    };
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|&x| {
            values
                .iter()
                .map(|&v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// Percentile by linear interpolation between closest ranks; `sorted` must be ascending
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&sorted, 0.25)?;
    let median = percentile(&sorted, 0.5)?;
    let q3 = percentile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let inside = sorted.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
    let whisker_low = inside.clone().fold(f64::INFINITY, f64::min);
    let whisker_high = inside.fold(f64::NEG_INFINITY, f64::max);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

/// Pearson correlation; `None` when either side has no variance
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

pub fn correlation_matrix(columns: &[(String, Vec<f64>)]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();
    CorrelationMatrix {
        labels: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Indicator columns for a categorical variable: one per sorted level, first level dropped
pub fn one_hot(name: &str, values: &[&str]) -> Vec<(String, Vec<f64>)> {
    let mut levels: Vec<&str> = values.to_vec();
    levels.sort_unstable();
    levels.dedup();

    levels
        .into_iter()
        .skip(1)
        .map(|level| {
            let column = values
                .iter()
                .map(|v| if *v == level { 1.0 } else { 0.0 })
                .collect();
            (format!("{}_{}", name, level), column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_by_matches_reference() {
        let rows = vec![("Sun", 3.0), ("Sat", 2.0), ("Sun", 5.0), ("Thur", 1.5), ("Sat", 4.0)];
        let means = mean_by(&rows, |r| r.0, |r| r.1);
        assert_eq!(
            means,
            vec![
                ("Sat".to_string(), 3.0),
                ("Sun".to_string(), 4.0),
                ("Thur".to_string(), 1.5)
            ]
        );
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = vec![1.0, 2.0, 2.5, 3.0, 10.0];
        let bins = histogram(&values, 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].count, 1);
        // max lands in the closed last bin
        assert_eq!(bins[19].count, 1);
        assert!(close(bins[19].end, 10.0));

        let flat = histogram(&[2.0, 2.0], 4);
        assert_eq!(flat.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(histogram(&[], 20).is_empty());
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let values = vec![1.0, 2.0, 2.0, 3.0, 4.5];
        let grid: Vec<f64> = (0..=2000).map(|i| -5.0 + i as f64 * 0.01).collect();
        let density = kde(&values, &grid);
        let area: f64 = density.iter().sum::<f64>() * 0.01;
        assert!((area - 1.0).abs() < 1e-3, "area was {}", area);
        assert_eq!(kde(&[1.0, 1.0], &grid[..3]), vec![0.0; 3]);
    }

    #[test]
    fn test_percentile_and_box_stats() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0];
        assert!(close(percentile(&sorted, 0.25).unwrap(), 1.75));
        assert!(close(percentile(&sorted, 0.5).unwrap(), 2.5));

        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert!(close(stats.median, 3.0));
        assert!(close(stats.q1, 2.0));
        assert!(close(stats.q3, 4.0));
        assert!(close(stats.whisker_low, 1.0));
        assert!(close(stats.whisker_high, 4.0));
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(box_stats(&[]).is_none());
    }

    #[test]
    fn test_pearson() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
        assert!(close(pearson(&x, &[4.0, 3.0, 2.0, 1.0]).unwrap(), -1.0));
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_none());
        assert!(pearson(&x, &[1.0]).is_none());
    }

    #[test]
    fn test_one_hot_drops_first_level() {
        let columns = one_hot("day", &["Sun", "Sat", "Thur", "Sun"]);
        let names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["day_Sun", "day_Thur"]);
        assert_eq!(columns[0].1, vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(columns[1].1, vec![0.0, 0.0, 1.0, 0.0]);
        assert!(one_hot("sex", &["Male", "Male"]).is_empty());
    }

    #[test]
    fn test_correlation_matrix_shape() {
        let columns = vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0]),
            ("b".to_string(), vec![3.0, 1.0, 2.0]),
            ("c".to_string(), vec![5.0, 5.0, 5.0]),
        ];
        let matrix = correlation_matrix(&columns);
        assert_eq!(matrix.labels, vec!["a", "b", "c"]);
        assert!(close(matrix.values[0][0].unwrap(), 1.0));
        assert_eq!(matrix.values[0][1], matrix.values[1][0]);
        assert!(matrix.values[2][2].is_none());
    }
}
