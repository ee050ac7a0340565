//! Report encoder
//!
//! Wraps analysis reports in a producer envelope and serializes them to the
//! JSON handed to the HTTP layer.

use crate::error::AnalyticsError;
use crate::{PRODUCER_NAME, PULSE_VERSION};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Producer metadata attached to every report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Serialized report with provenance
#[derive(Debug, Clone, Serialize)]
pub struct ReportEnvelope<'r, T: Serialize> {
    pub report_id: String,
    pub producer: ReportProducer,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: &'r T,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a report in an envelope with a fresh report ID
    pub fn encode<'r, T: Serialize>(&self, report: &'r T) -> ReportEnvelope<'r, T> {
        ReportEnvelope {
            report_id: Uuid::new_v4().to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: PULSE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            generated_at: Utc::now(),
            report,
        }
    }

    /// Encode to a JSON string
    pub fn encode_to_json<T: Serialize>(
        &self,
        report: &T,
        pretty: bool,
    ) -> Result<String, AnalyticsError> {
        let envelope = self.encode(report);
        let json = if pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DistractionReport;
    use chrono::TimeZone;

    fn report() -> DistractionReport {
        DistractionReport {
            analysis_date: Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap(),
            team_id: Some("t1".to_string()),
            team_size: 2,
            distraction_profile: vec![],
            insights: vec!["quiet week".to_string()],
            total_unproductive_hours: 0.0,
            period_days: 30,
        }
    }

    #[test]
    fn test_envelope_flattens_report_fields() {
        let encoder = ReportEncoder::with_instance_id("instance-1".to_string());
        let json = encoder.encode_to_json(&report(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["producer"]["name"], "pulse-analytics");
        assert_eq!(value["producer"]["instance_id"], "instance-1");
        assert_eq!(value["team_id"], "t1");
        assert_eq!(value["team_size"], 2);
        assert_eq!(value["period_days"], 30);
        assert!(value["report_id"].is_string());
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_each_report_gets_a_new_id() {
        let encoder = ReportEncoder::new();
        let data = report();
        let first = encoder.encode(&data);
        let second = encoder.encode(&data);

        assert_ne!(first.report_id, second.report_id);
        assert_eq!(first.producer, second.producer);
    }

    #[test]
    fn test_pretty_output_is_multiline() {
        let encoder = ReportEncoder::new();
        let pretty = encoder.encode_to_json(&report(), true).unwrap();
        let compact = encoder.encode_to_json(&report(), false).unwrap();

        assert!(pretty.contains('\n'));
        assert!(!compact.contains('\n'));
    }
}
