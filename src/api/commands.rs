//! Commands - Request/response entry points used by the CLI
//!
//! Each command takes a serde request, runs one pass through the core and
//! returns a serializable response or an `ErrorResponse`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::logic::config::{ModelConfig, TrainingConfig};
use crate::logic::error::FaultError;
use crate::logic::faults::{self, LogSummary, RuleThresholds, SessionAnalysis};
use crate::logic::metrics::EvaluationMetrics;
use crate::logic::model::{FaultClassifier, FaultPrediction, PredictionThreshold, TrainingSummary};
use crate::logic::records::{group_logs_by_session, ChargingRecord, ChargingSession};
use crate::logic::store::ModelStore;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Structured failure returned by every command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

impl From<FaultError> for ErrorResponse {
    fn from(e: FaultError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

pub type CommandResult<T> = Result<T, ErrorResponse>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    /// Derived from the logs when empty
    pub sessions: Vec<ChargingSession>,
    pub logs: Vec<ChargingRecord>,
    pub thresholds: Option<RuleThresholds>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub sessions_analyzed: usize,
    pub sessions_with_faults: usize,
    /// Per-log counts across every analyzed session
    pub log_summary: LogSummary,
    /// Anomalous logs / total logs, 0 with no logs
    pub anomaly_rate: f64,
    pub results: Vec<SessionAnalysis>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainRequest {
    /// Restrict training to these sessions' logs; all logs when empty
    pub sessions: Vec<ChargingSession>,
    pub logs: Vec<ChargingRecord>,
    pub config: TrainingConfig,
    pub model_name: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub summary: TrainingSummary,
    /// Held-out tail evaluation; absent when nothing was held out
    pub metrics: Option<EvaluationMetrics>,
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictRequest {
    pub logs: Vec<ChargingRecord>,
    pub model_name: String,
    pub threshold: Option<PredictionThreshold>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub records_scored: usize,
    pub predictions: Vec<FaultPrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelListResponse {
    pub models: Vec<String>,
}

// ============================================================================
// ANALYZE
// ============================================================================

fn sessions_from_logs(logs: &[ChargingRecord]) -> Vec<ChargingSession> {
    group_logs_by_session(logs)
        .iter()
        .filter_map(|(id, session_logs)| ChargingSession::from_logs(id.as_str(), session_logs))
        .collect()
}

/// Rule-based analysis of every session
pub fn analyze_command(request: AnalyzeRequest) -> CommandResult<AnalyzeResponse> {
    let sessions = if request.sessions.is_empty() {
        sessions_from_logs(&request.logs)
    } else {
        request.sessions
    };

    let thresholds = request.thresholds.unwrap_or_default();
    let results = faults::analyze_all_at(&sessions, &request.logs, &thresholds, Utc::now());

    let mut log_summary = LogSummary::default();
    for result in &results {
        log_summary.merge(&result.log_summary);
    }

    Ok(AnalyzeResponse {
        sessions_analyzed: results.len(),
        sessions_with_faults: results.iter().filter(|r| r.has_faults()).count(),
        anomaly_rate: log_summary.anomaly_rate(),
        log_summary,
        results,
    })
}

// ============================================================================
// TRAIN
// ============================================================================

fn select_logs(sessions: &[ChargingSession], logs: Vec<ChargingRecord>) -> Vec<ChargingRecord> {
    if sessions.is_empty() {
        return logs;
    }
    logs.into_iter()
        .filter(|log| sessions.iter().any(|s| s.id == log.session_id))
        .collect()
}

/// Trailing records the classifier held out for validation
fn holdout_tail(logs: &[ChargingRecord], validation_split: f32) -> &[ChargingRecord] {
    let count = ((logs.len() as f64) * validation_split.clamp(0.0, 1.0) as f64).floor() as usize;
    &logs[logs.len() - count..]
}

/// Train a fresh classification model, evaluate the held-out tail, save
/// under `model_name` when given
pub async fn train_command(request: TrainRequest, store: &dyn ModelStore) -> CommandResult<TrainResponse> {
    let logs = select_logs(&request.sessions, request.logs);
    log::info!("Train command: {} log(s) selected", logs.len());

    let mut model_config = ModelConfig::classification();
    model_config.seed = request.seed;

    let mut classifier = FaultClassifier::new(model_config);
    classifier.initialize()?;
    let summary = classifier.train(&logs, Some(request.config.clone())).await?;

    let holdout = holdout_tail(&logs, request.config.validation_split);
    let metrics = if holdout.is_empty() {
        None
    } else {
        Some(classifier.evaluate(holdout).await?)
    };

    if let Some(name) = &request.model_name {
        classifier.save(store, name)?;
    }

    Ok(TrainResponse {
        summary,
        metrics,
        model_name: request.model_name,
    })
}

// ============================================================================
// PREDICT / MODELS
// ============================================================================

/// Score each log with a stored classification model
pub async fn predict_command(request: PredictRequest, store: &dyn ModelStore) -> CommandResult<PredictResponse> {
    let mut classifier = FaultClassifier::new(ModelConfig::classification())
        .with_threshold(request.threshold.unwrap_or_default());
    classifier.initialize()?;
    classifier.load(store, &request.model_name)?;

    let mut predictions = Vec::new();
    for log in &request.logs {
        predictions.extend(classifier.predict(log).await?);
    }

    Ok(PredictResponse {
        records_scored: request.logs.len(),
        predictions,
    })
}

pub fn list_models_command(store: &dyn ModelStore) -> CommandResult<ModelListResponse> {
    Ok(ModelListResponse {
        models: store.list()?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::faults::Severity;
    use crate::logic::store::MemoryModelStore;
    use chrono::{Duration, TimeZone, Utc};

    fn log(id: &str, session: &str, minutes: i64, status: &str, power: f64) -> ChargingRecord {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap();
        ChargingRecord::new(id, session, start, status)
            .with_created_at(start + Duration::minutes(minutes))
            .with_stopped_at(start + Duration::minutes(120))
            .with_consumption(1000.0 + minutes as f64)
            .with_output_power(power)
    }

    fn training_logs(count: usize) -> Vec<ChargingRecord> {
        (0..count)
            .map(|i| {
                let power = if i % 2 == 0 { 7000.0 } else { 9500.0 };
                log(&format!("l{}", i), &format!("s{}", i % 3), i as i64, "finished", power)
            })
            .collect()
    }

    #[test]
    fn test_analyze_derives_sessions_from_logs() {
        let logs = vec![
            log("a1", "A", 0, "charging", 2.0),
            log("a2", "A", 10, "charging", 2.5),
            log("b1", "B", 0, "charging", 7000.0),
        ];
        let response = analyze_command(AnalyzeRequest {
            logs,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(response.sessions_analyzed, 2);
        let a = response.results.iter().find(|r| r.session_id == "A").unwrap();
        assert!(a.reports.iter().any(|r| r.reason == "Low Power Output"));
        assert_eq!(a.max_severity(), Some(Severity::High));

        // kW-scale readings sit far from the 7 kW nominal in watts
        assert_eq!(a.log_summary.anomalous_logs, 2);
        assert_eq!(response.log_summary.total_logs, 3);
        assert!((response.anomaly_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_empty_request() {
        let response = analyze_command(AnalyzeRequest::default()).unwrap();
        assert_eq!(response.sessions_analyzed, 0);
        assert_eq!(response.sessions_with_faults, 0);
        assert_eq!(response.anomaly_rate, 0.0);
    }

    #[test]
    fn test_holdout_tail() {
        let logs = training_logs(10);
        assert_eq!(holdout_tail(&logs, 0.2).len(), 2);
        assert_eq!(holdout_tail(&logs, 0.2)[0].id, "l8");
        assert!(holdout_tail(&logs, 0.0).is_empty());
    }

    #[test]
    fn test_select_logs_by_session() {
        let sessions = vec![ChargingSession::new("s1", "finished")];
        let selected = select_logs(&sessions, training_logs(9));
        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|l| l.session_id == "s1"));
    }

    #[tokio::test]
    async fn test_train_without_records_is_structured_error() {
        let store = MemoryModelStore::new();
        let error = train_command(TrainRequest::default(), &store).await.unwrap_err();
        assert_eq!(error.kind, "validation_error");
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_train_saves_and_predict_loads() {
        let store = MemoryModelStore::new();
        let request = TrainRequest {
            logs: training_logs(20),
            config: TrainingConfig {
                epochs: 3,
                batch_size: 8,
                validation_split: 0.0,
                ..Default::default()
            },
            model_name: Some("fleet-a".to_string()),
            seed: Some(11),
            ..Default::default()
        };

        let response = train_command(request, &store).await.unwrap();
        assert_eq!(response.summary.epochs_completed, 3);
        assert!(response.metrics.is_none());
        assert_eq!(list_models_command(&store).unwrap().models, vec!["fleet-a".to_string()]);

        let predicted = predict_command(
            PredictRequest {
                logs: training_logs(4),
                model_name: "fleet-a".to_string(),
                threshold: None,
            },
            &store,
        )
        .await
        .unwrap();
        assert_eq!(predicted.records_scored, 4);
        assert!(predicted.predictions.iter().all(|p| p.probability > 0.7));
    }

    #[tokio::test]
    async fn test_predict_unknown_model() {
        let store = MemoryModelStore::new();
        let error = predict_command(
            PredictRequest {
                logs: training_logs(1),
                model_name: "missing".to_string(),
                threshold: None,
            },
            &store,
        )
        .await
        .unwrap_err();
        assert_eq!(error.kind, "persistence_error");
    }
}
