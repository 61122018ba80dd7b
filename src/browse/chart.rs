//! Line chart series over a page of records

use crate::core::StockRecord;
use chrono::DateTime;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn from_records(records: &[StockRecord]) -> Self {
        let series = |label, value: fn(&StockRecord) -> f64| Dataset {
            label,
            values: records.iter().map(value).collect(),
        };
        Self {
            labels: records.iter().map(|r| date_label(&r.datetime)).collect(),
            datasets: vec![
                series("End Price", |r| r.endprice),
                series("Highest Price", |r| r.highestprice),
                series("Lowest Price", |r| r.lowestprice),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Calendar date of an RFC 3339 timestamp, or the raw text if it does not parse.
pub fn date_label(datetime: &str) -> String {
    DateTime::parse_from_rfc3339(datetime)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| datetime.to_string())
}

/// Renders values as a row of block characters scaled between `min` and `max`.
pub fn sparkline(values: &[f64], min: f64, max: f64) -> String {
    let span = max - min;
    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                return BARS[BARS.len() / 2];
            }
            let scaled = ((v - min) / span * (BARS.len() - 1) as f64).round();
            BARS[(scaled.max(0.0) as usize).min(BARS.len() - 1)]
        })
        .collect()
}

/// Smallest and largest value across every dataset.
pub fn bounds(datasets: &[Dataset]) -> Option<(f64, f64)> {
    datasets
        .iter()
        .flat_map(|d| d.values.iter().copied())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candle(datetime: &str, low: f64, high: f64, end: f64) -> StockRecord {
        serde_json::from_value(json!({
            "datatype": "Candles",
            "datetime": datetime,
            "lowestprice": low,
            "highestprice": high,
            "endprice": end,
        }))
        .unwrap()
    }

    #[test]
    fn test_chart_from_records() {
        let records = vec![
            candle("2024-01-01T10:00:00.000Z", 1.0, 3.0, 2.0),
            candle("2024-01-02T10:00:00+02:00", 2.0, 5.0, 4.0),
            candle("yesterday", 0.0, 0.0, 0.0),
        ];

        let chart = ChartData::from_records(&records);

        assert_eq!(chart.labels, vec!["2024-01-01", "2024-01-02", "yesterday"]);
        assert_eq!(chart.datasets.len(), 3);
        assert_eq!(chart.datasets[0].label, "End Price");
        assert_eq!(chart.datasets[0].values, vec![2.0, 4.0, 0.0]);
        assert_eq!(chart.datasets[1].values, vec![3.0, 5.0, 0.0]);
        assert_eq!(chart.datasets[2].values, vec![1.0, 2.0, 0.0]);
        assert_eq!(bounds(&chart.datasets), Some((0.0, 5.0)));
    }

    #[test]
    fn test_sparkline_scaling() {
        assert_eq!(sparkline(&[0.0, 7.0, 3.5], 0.0, 7.0), "▁█▅");
        assert_eq!(sparkline(&[2.0, 2.0], 2.0, 2.0), "▅▅");
        assert_eq!(sparkline(&[], 0.0, 1.0), "");
        assert!(bounds(&[]).is_none());
    }
}
