/// Оценка модели по остаткам на исторических проектах

use crate::types::{DiagnosticsOutput, HistoricalRecord, ResidualPoint, SegmentSummary};

/// Границы длины трассы, км (правая граница не включается)
pub const LENGTH_BINS: [(&str, f64, f64); 4] = [
    ("short", 0.0, 6.0),
    ("medium", 6.0, 12.0),
    ("medium-long", 12.0, 20.0),
    ("long", 20.0, f64::INFINITY),
];

/// Доля тоннеля в длине, %
pub const TUNNEL_BINS: [(&str, f64, f64); 3] = [
    ("no tunnel", 0.0, 1.0),
    ("mixed", 1.0, 99.0),
    ("subway", 99.0, f64::INFINITY),
];

pub fn length_category(length: f64) -> Option<&'static str> {
    LENGTH_BINS
        .iter()
        .find(|(_, lo, hi)| length >= *lo && length < *hi)
        .map(|(name, _, _)| *name)
}

pub fn tunnel_category(tunnel: f64, length: f64) -> Option<&'static str> {
    let share = if length > 0.0 {
        tunnel / length * 100.0
    } else {
        0.0
    };
    TUNNEL_BINS
        .iter()
        .find(|(_, lo, hi)| share >= *lo && share < *hi)
        .map(|(name, _, _)| *name)
}

/// Остатки (факт - прогноз) и стандартизованные остатки
pub fn residuals(records: &[HistoricalRecord]) -> Vec<ResidualPoint> {
    if records.is_empty() {
        return Vec::new();
    }

    let raw: Vec<f64> = records
        .iter()
        .map(|r| r.actual_cost - r.predicted_cost)
        .collect();

    let mean = raw.iter().sum::<f64>() / raw.len() as f64;
    let variance = raw.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / raw.len() as f64;
    let std = variance.sqrt();

    records
        .iter()
        .zip(raw)
        .map(|(record, residual)| ResidualPoint {
            length: record.length,
            tunnel: record.tunnel,
            actual: record.actual_cost,
            predicted: record.predicted_cost,
            residual,
            standardized: if std > 1e-12 {
                (residual - mean) / std
            } else {
                0.0
            },
        })
        .collect()
}

pub fn summarize<'a>(segment: &str, points: impl IntoIterator<Item = &'a ResidualPoint>) -> SegmentSummary {
    let mut count: usize = 0;
    let mut residual_sum = 0.0;
    let mut abs_sum = 0.0;
    let mut standardized_sum = 0.0;

    for point in points {
        count += 1;
        residual_sum += point.residual;
        abs_sum += point.residual.abs();
        standardized_sum += point.standardized;
    }

    let n = count.max(1) as f64;
    SegmentSummary {
        segment: segment.to_string(),
        count,
        mean_residual: residual_sum / n,
        mae: abs_sum / n,
        mean_standardized: standardized_sum / n,
    }
}

/// Средняя абсолютная ошибка по проектам не длиннее `max_length`.
/// Если таких нет, берётся весь набор. Пустой набор -> None.
pub fn local_mae(records: &[HistoricalRecord], max_length: f64) -> Option<(f64, usize)> {
    let comparable: Vec<&HistoricalRecord> =
        records.iter().filter(|r| r.length <= max_length).collect();

    let pool: Vec<&HistoricalRecord> = if comparable.is_empty() {
        tracing::debug!("No historical projects up to {} km, using all {}", max_length, records.len());
        records.iter().collect()
    } else {
        comparable
    };

    if pool.is_empty() {
        return None;
    }

    let mae = pool
        .iter()
        .map(|r| (r.actual_cost - r.predicted_cost).abs())
        .sum::<f64>()
        / pool.len() as f64;

    Some((mae, pool.len()))
}

pub fn diagnostics(records: &[HistoricalRecord]) -> DiagnosticsOutput {
    let points = residuals(records);

    let by_length = LENGTH_BINS
        .iter()
        .map(|(name, _, _)| {
            summarize(
                name,
                points.iter().filter(|p| length_category(p.length) == Some(*name)),
            )
        })
        .collect();

    let by_tunnel = TUNNEL_BINS
        .iter()
        .map(|(name, _, _)| {
            summarize(
                name,
                points
                    .iter()
                    .filter(|p| tunnel_category(p.tunnel, p.length) == Some(*name)),
            )
        })
        .collect();

    DiagnosticsOutput {
        overall: summarize("all", &points),
        by_length,
        by_tunnel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn record(length: f64, tunnel: f64, actual: f64, predicted: f64) -> HistoricalRecord {
        HistoricalRecord {
            length,
            tunnel,
            actual_cost: actual,
            predicted_cost: predicted,
        }
    }

    fn dataset() -> Vec<HistoricalRecord> {
        vec![
            record(4.0, 0.0, 100.0, 90.0),    // +10
            record(8.0, 8.0, 800.0, 820.0),   // -20
            record(15.0, 7.0, 1500.0, 1400.0), // +100
            record(30.0, 30.0, 4000.0, 4300.0), // -300
        ]
    }

    #[test]
    fn bins_are_right_open() {
        assert_eq!(length_category(0.0), Some("short"));
        assert_eq!(length_category(6.0), Some("medium"));
        assert_eq!(length_category(19.99), Some("medium-long"));
        assert_eq!(length_category(20.0), Some("long"));
        assert_eq!(length_category(-1.0), None);

        assert_eq!(tunnel_category(0.0, 10.0), Some("no tunnel"));
        assert_eq!(tunnel_category(5.0, 10.0), Some("mixed"));
        assert_eq!(tunnel_category(10.0, 10.0), Some("subway"));
        assert_eq!(tunnel_category(0.0, 0.0), Some("no tunnel"));
    }

    #[test]
    fn standardized_residuals_have_zero_mean_unit_variance() {
        let points = residuals(&dataset());
        let n = points.len() as f64;

        let mean = points.iter().map(|p| p.standardized).sum::<f64>() / n;
        let var = points.iter().map(|p| (p.standardized - mean).powi(2)).sum::<f64>() / n;

        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
        assert_eq!(points[0].residual, 10.0);
    }

    #[test]
    fn constant_residuals_standardize_to_zero() {
        let records = vec![record(1.0, 0.0, 5.0, 4.0), record(2.0, 0.0, 6.0, 5.0)];
        assert!(residuals(&records).iter().all(|p| p.standardized == 0.0));
    }

    #[test]
    fn local_mae_uses_only_shorter_projects() {
        let records = dataset();

        let (mae, n) = local_mae(&records, 10.0).unwrap();
        assert_eq!(n, 2);
        assert_abs_diff_eq!(mae, 15.0);

        let (mae, n) = local_mae(&records, 100.0).unwrap();
        assert_eq!(n, 4);
        assert_abs_diff_eq!(mae, 107.5);
    }

    #[test]
    fn local_mae_falls_back_to_all_projects() {
        let (mae, n) = local_mae(&dataset(), 1.0).unwrap();
        assert_eq!(n, 4);
        assert_abs_diff_eq!(mae, 107.5);

        assert_eq!(local_mae(&[], 10.0), None);
    }

    #[test]
    fn segments_partition_dataset() {
        let output = diagnostics(&dataset());

        assert_eq!(output.overall.count, 4);
        assert_eq!(output.by_length.iter().map(|s| s.count).sum::<usize>(), 4);
        assert_eq!(output.by_tunnel.iter().map(|s| s.count).sum::<usize>(), 4);

        let short = &output.by_length[0];
        assert_eq!(short.segment, "short");
        assert_eq!(short.count, 1);
        assert_abs_diff_eq!(short.mae, 10.0);

        let subway = output.by_tunnel.iter().find(|s| s.segment == "subway").unwrap();
        assert_eq!(subway.count, 2);
        assert_abs_diff_eq!(subway.mean_residual, -160.0);
    }

    #[test]
    fn empty_dataset_gives_empty_segments() {
        let output = diagnostics(&[]);
        assert_eq!(output.overall.count, 0);
        assert_eq!(output.overall.mae, 0.0);
        assert_eq!(output.by_length.len(), 4);
    }
}
