//! Report summary derivation for the chart surface

use serde::{Deserialize, Serialize};

/// One point of the duration history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationPoint {
    /// Creation time as an RFC 3339 string
    pub created_at: String,
    /// Mission duration in seconds
    pub duration_sec: f64,
}

/// `GET /reports/summary` document. Missing fields default to zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportSummary {
    /// Number of missions
    pub total_missions: u64,
    /// Completed missions
    pub completed: u64,
    /// Aborted missions
    pub aborted: u64,
    /// Mean duration in seconds
    pub average_duration_sec: f64,
    /// Mean altitude in meters
    pub average_altitude: f64,
    /// Per-mission durations in seconds
    pub durations: Vec<f64>,
    /// Per-mission altitudes in meters
    pub altitudes: Vec<f64>,
    /// Durations over time
    pub durations_over_time: Vec<DurationPoint>,
}

/// Labelled numeric series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Series name
    pub label: &'static str,
    /// Category labels
    pub labels: Vec<String>,
    /// Values, one per label
    pub values: Vec<f64>,
}

/// Headline number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    /// Card title
    pub title: &'static str,
    /// Rendered value
    pub value: String,
}

/// Chart-surface data derived from a report summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportProjection {
    /// Headline cards
    pub cards: Vec<SummaryCard>,
    /// Duration per mission
    pub durations: Series,
    /// Altitude per mission
    pub altitudes: Series,
    /// Completed versus aborted
    pub completion: Series,
    /// Duration history
    pub duration_trend: Series,
}

impl ReportSummary {
    /// Derive chart data
    pub fn project(&self) -> ReportProjection {
        ReportProjection {
            cards: vec![
                SummaryCard {
                    title: "Total Missions",
                    value: self.total_missions.to_string(),
                },
                SummaryCard {
                    title: "Completed",
                    value: self.completed.to_string(),
                },
                SummaryCard {
                    title: "Aborted",
                    value: self.aborted.to_string(),
                },
                SummaryCard {
                    title: "Avg Duration",
                    value: format_duration(self.average_duration_sec),
                },
                SummaryCard {
                    title: "Avg Altitude",
                    value: format!("{}m", self.average_altitude),
                },
            ],
            durations: per_mission_series("Duration (sec)", &self.durations),
            altitudes: per_mission_series("Altitude (m)", &self.altitudes),
            completion: Series {
                label: "Completion Ratio",
                labels: vec!["Completed".to_string(), "Aborted".to_string()],
                values: vec![self.completed as f64, self.aborted as f64],
            },
            duration_trend: Series {
                label: "Mission Duration (sec)",
                labels: self
                    .durations_over_time
                    .iter()
                    .map(|point| date_label(&point.created_at))
                    .collect(),
                values: self
                    .durations_over_time
                    .iter()
                    .map(|point| point.duration_sec)
                    .collect(),
            },
        }
    }
}

fn per_mission_series(label: &'static str, values: &[f64]) -> Series {
    Series {
        label,
        labels: (1..=values.len()).map(|i| format!("Mission {}", i)).collect(),
        values: values.to_vec(),
    }
}

/// Whole seconds rendered as `Xm Ys`
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}m {}s", total / 60, total % 60)
}

fn date_label(created_at: &str) -> String {
    created_at
        .split_once('T')
        .map(|(date, _)| date)
        .unwrap_or(created_at)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let summary: ReportSummary = serde_json::from_str(r#"{"totalMissions": 3}"#).unwrap();
        assert_eq!(summary.total_missions, 3);
        assert_eq!(summary.completed, 0);
        assert!(summary.durations_over_time.is_empty());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0m 0s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(59.6), "1m 0s");
        assert_eq!(format_duration(-3.0), "0m 0s");
    }

    #[test]
    fn test_projection() {
        let summary = ReportSummary {
            total_missions: 4,
            completed: 3,
            aborted: 1,
            average_duration_sec: 600.0,
            average_altitude: 95.5,
            durations: vec![500.0, 700.0],
            altitudes: vec![90.0, 101.0],
            durations_over_time: vec![DurationPoint {
                created_at: "2026-03-01T10:00:00Z".to_string(),
                duration_sec: 500.0,
            }],
        };

        let projection = summary.project();
        assert_eq!(projection.cards[3].value, "10m 0s");
        assert_eq!(projection.cards[4].value, "95.5m");
        assert_eq!(projection.durations.labels, vec!["Mission 1", "Mission 2"]);
        assert_eq!(projection.completion.values, vec![3.0, 1.0]);
        assert_eq!(projection.duration_trend.labels, vec!["2026-03-01"]);
    }
}
