//! Connection Assembler - packages analysis results into [`Connection`]s.
//!
//! Narrative text is attached later by the application layer; everything
//! here is pure.

use crate::domain::foundation::{ConnectionId, Timestamp};

use super::analyzer::PairAnalysis;
use super::confounder::ConfounderOutcome;
use super::connection::{Connection, DataPoint, DomainRef};
use super::filter::{Direction, Strength};

#[derive(Debug, Clone)]
pub struct ConnectionAssembler {
    max_data_points: usize,
}

impl ConnectionAssembler {
    pub fn new(max_data_points: usize) -> Self {
        Self { max_data_points }
    }

    pub fn assemble(
        &self,
        analysis: &PairAnalysis,
        outcome: &ConfounderOutcome,
        created_at: Timestamp,
    ) -> Connection {
        let coefficient = analysis.result.coefficient;
        Connection {
            id: ConnectionId::new(),
            domain_a: DomainRef::from(analysis.pair.series_a.as_ref()),
            domain_b: DomainRef::from(analysis.pair.series_b.as_ref()),
            metrics: analysis.result.clone(),
            direction: Direction::from_coefficient(coefficient),
            strength: Strength::from_coefficient(coefficient),
            survives_confounder_control: outcome.survives,
            confounder_note: outcome.note.clone(),
            confounder_coefficient: Some(outcome.adjusted_coefficient),
            with_without: analysis.with_without.clone(),
            data_points: self.data_points(analysis),
            title: None,
            description: None,
            explanation: None,
            created_at,
        }
    }

    /// Most recent `max_data_points` aligned days, oldest first.
    fn data_points(&self, analysis: &PairAnalysis) -> Vec<DataPoint> {
        let aligned = &analysis.aligned;
        let skip = aligned.len().saturating_sub(self.max_data_points);
        aligned
            .dates
            .iter()
            .zip(aligned.a.iter().zip(aligned.b.iter()))
            .skip(skip)
            .map(|(date, (a, b))| DataPoint {
                date: *date,
                value_a: *a,
                value_b: *b,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connections::analyzer::CorrelationAnalyzer;
    use crate::domain::connections::connection::Narrative;
    use crate::domain::connections::pairs::CandidatePair;
    use crate::domain::connections::series::{DomainSeries, ValueType};
    use crate::domain::foundation::DomainId;
    use chrono::{Duration, NaiveDate};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn series(domain: &str, value_type: ValueType, values: &[f64]) -> Arc<DomainSeries> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        Arc::new(DomainSeries {
            domain_id: DomainId::new(domain).unwrap(),
            metric_name: "value".to_string(),
            value_type,
            unit: Some("h".to_string()),
            display_name: format!("{} value", domain),
            values: values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v))
                .collect::<BTreeMap<_, _>>(),
        })
    }

    fn analysis() -> PairAnalysis {
        let flags: Vec<f64> = (0..20).map(|i| (i % 2) as f64).collect();
        let sleep: Vec<f64> = (0..20).map(|i| 6.0 + (i % 2) as f64 * 2.0 + i as f64 * 0.01).collect();
        let a = series("badminton", ValueType::Binary, &flags);
        let b = series("sleep", ValueType::Continuous, &sleep);
        let pair = CandidatePair {
            overlap_dates: a.values.keys().copied().collect(),
            series_a: a,
            series_b: b,
        };
        CorrelationAnalyzer::new(14, false, 0).analyze(&pair).unwrap()
    }

    fn outcome(survives: bool) -> ConfounderOutcome {
        ConfounderOutcome {
            survives,
            note: (!survives).then(|| "weekly".to_string()),
            adjusted_coefficient: 0.42,
            tests: Vec::new(),
        }
    }

    #[test]
    fn assembles_direction_strength_and_sides() {
        let connection = ConnectionAssembler::new(90).assemble(&analysis(), &outcome(true), Timestamp::now());

        assert_eq!(connection.direction, Direction::Positive);
        assert_eq!(connection.strength, Strength::Strong);
        assert_eq!(connection.domain_a.domain_type.as_str(), "badminton");
        assert_eq!(connection.domain_b.display_name, "sleep value");
        assert!(connection.survives_confounder_control);
        assert_eq!(connection.confounder_coefficient, Some(0.42));
        assert!(connection.with_without.is_some());
        assert_eq!(connection.data_points.len(), 20);
        assert!(!connection.has_narrative());
    }

    #[test]
    fn caps_data_points_keeping_the_most_recent() {
        let analysis = analysis();
        let connection = ConnectionAssembler::new(5).assemble(&analysis, &outcome(true), Timestamp::now());

        assert_eq!(connection.data_points.len(), 5);
        assert_eq!(connection.data_points.last().unwrap().date, *analysis.aligned.dates.last().unwrap());
        assert!(connection.data_points[0].date < connection.data_points[4].date);
    }

    #[test]
    fn carries_confounder_note_when_not_surviving() {
        let connection = ConnectionAssembler::new(90).assemble(&analysis(), &outcome(false), Timestamp::now());
        assert!(!connection.survives_confounder_control);
        assert_eq!(connection.confounder_note.as_deref(), Some("weekly"));
    }

    #[test]
    fn serializes_with_camel_case_wire_names() {
        let connection = ConnectionAssembler::new(90).assemble(&analysis(), &outcome(true), Timestamp::now());
        let json = serde_json::to_value(&connection).unwrap();

        assert_eq!(json["domainA"]["type"], "badminton");
        assert_eq!(json["domainA"]["displayName"], "badminton value");
        assert_eq!(json["metrics"]["correlationType"], "spearman");
        assert!(json["metrics"]["adjustedPValue"].is_number());
        assert_eq!(json["survivesConfounderControl"], true);
        assert!(json["withWithout"]["withActivity"]["stdDev"].is_number());
        assert!(json.get("title").is_none());
        assert!(json.get("confounderNote").is_none());
    }

    #[test]
    fn narrative_fills_text_fields_and_summary_carries_statistics() {
        let connection = ConnectionAssembler::new(90)
            .assemble(&analysis(), &outcome(true), Timestamp::now())
            .with_narrative(Narrative {
                title: "Badminton and sleep".to_string(),
                description: "You sleep longer after playing.".to_string(),
                explanation: "Correlation only.".to_string(),
            });

        assert!(connection.has_narrative());
        let summary = connection.summary();
        assert_eq!(summary.domain_a, "badminton value");
        assert_eq!(summary.coefficient, connection.metrics.coefficient);
        assert_eq!(summary.unit_b.as_deref(), Some("h"));

        let round_trip: Connection = serde_json::from_value(serde_json::to_value(&connection).unwrap()).unwrap();
        assert_eq!(round_trip.title.as_deref(), Some("Badminton and sleep"));
    }
}
