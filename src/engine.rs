//! Monitor Engine - Per-patient risk pipelines
//!
//! Owns one pipeline per patient and wires the stages together:
//! buffer -> feature extractor -> classifier -> stabilizer -> explanation
//! -> alert coordinator. Patients are independent: each pipeline's
//! mutable state is touched only behind its own locks, so pipelines run
//! concurrently without cross-patient coordination. Ingestion may run
//! concurrently with evaluation for the same patient; the timeline lock
//! guarantees snapshots are never torn.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::alerts::{AlertCoordinator, AlertRecord};
use crate::config::MonitorConfig;
use crate::error::{EvaluationError, IngestError, ScoreError};
use crate::explain::ExplanationEngine;
use crate::features::FeatureExtractor;
use crate::risk::{
    RiskAssessment, RiskLevel, RiskModel, TransitionStabilizer, WeightedRiskModel,
};
use crate::vitals::{PatientTimeline, VitalChannel};

/// Subscribers more than this many assessments behind start missing
/// elements (tokio broadcast semantics); resubscribe to restart.
const SUBSCRIPTION_BUFFER: usize = 64;

// ============================================================================
// PER-PATIENT PIPELINE
// ============================================================================

/// Cross-tick state mutated only under the evaluation lock.
struct EvalState {
    stabilizer: TransitionStabilizer,
    tick: u64,
    last_assessment: Option<RiskAssessment>,
    /// Last assessment with a concrete (non-Unknown) stabilized level.
    /// Alert transitions compare against this so a data gap never
    /// swallows the escalation that commits when data returns.
    last_concrete: Option<RiskAssessment>,
    history: VecDeque<RiskAssessment>,
}

struct PatientPipeline {
    timeline: RwLock<PatientTimeline>,
    eval: Mutex<EvalState>,
    alerts: Mutex<AlertCoordinator>,
    tx: broadcast::Sender<RiskAssessment>,
}

impl PatientPipeline {
    fn new(config: &Arc<MonitorConfig>, now: DateTime<Utc>) -> Self {
        let (tx, _) = broadcast::channel(SUBSCRIPTION_BUFFER);
        Self {
            timeline: RwLock::new(PatientTimeline::new(config.clone())),
            eval: Mutex::new(EvalState {
                stabilizer: TransitionStabilizer::new(config.hysteresis, now),
                tick: 0,
                last_assessment: None,
                last_concrete: None,
                history: VecDeque::new(),
            }),
            alerts: Mutex::new(AlertCoordinator::new(config.alerts)),
            tx,
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct MonitorEngine {
    config: Arc<MonitorConfig>,
    model: Arc<dyn RiskModel>,
    extractor: FeatureExtractor,
    explainer: ExplanationEngine,
    patients: RwLock<HashMap<String, Arc<PatientPipeline>>>,
}

impl MonitorEngine {
    /// Engine with the default weighted scoring model.
    pub fn new(config: MonitorConfig) -> Self {
        let config = Arc::new(config);
        let model = Arc::new(WeightedRiskModel::new(config.clone()));
        Self::with_model(config, model)
    }

    /// Engine with a substituted scoring model (capability interface:
    /// anything implementing [`RiskModel`]).
    pub fn with_model(config: Arc<MonitorConfig>, model: Arc<dyn RiskModel>) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.clone()),
            explainer: ExplanationEngine::new(config.clone()),
            config,
            model,
            patients: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn pipeline(&self, patient_id: &str) -> Option<Arc<PatientPipeline>> {
        self.patients.read().get(patient_id).cloned()
    }

    fn pipeline_or_create(&self, patient_id: &str) -> Arc<PatientPipeline> {
        if let Some(p) = self.pipeline(patient_id) {
            return p;
        }
        let mut patients = self.patients.write();
        patients
            .entry(patient_id.to_string())
            .or_insert_with(|| {
                log::info!("[Engine] monitoring new patient {patient_id}");
                Arc::new(PatientPipeline::new(&self.config, Utc::now()))
            })
            .clone()
    }

    // ------------------------------------------------------------------------
    // INGESTION
    // ------------------------------------------------------------------------

    /// Append one validated vital reading to the patient's timeline.
    ///
    /// May be called concurrently with evaluation for the same patient;
    /// the write lock covers append + eviction so readers never observe
    /// a torn timeline.
    pub fn ingest(
        &self,
        patient_id: &str,
        channel: VitalChannel,
        timestamp: DateTime<Utc>,
        value: f32,
    ) -> Result<(), IngestError> {
        let pipeline = self.pipeline_or_create(patient_id);
        let result = pipeline.timeline.write().ingest(channel, timestamp, value);
        if let Err(ref e) = result {
            log::warn!("[Engine] rejected sample for {patient_id}: {e}");
        }
        result
    }

    // ------------------------------------------------------------------------
    // EVALUATION
    // ------------------------------------------------------------------------

    /// Run one evaluation tick for a patient at the current wall clock.
    pub fn evaluate(&self, patient_id: &str) -> Result<RiskAssessment, EvaluationError> {
        self.evaluate_at(patient_id, Utc::now())
    }

    /// Deterministic evaluation tick at an explicit time; used by replay
    /// and tests. Ticks for the same patient are serialized by the
    /// evaluation lock; distinct patients evaluate in parallel.
    pub fn evaluate_at(
        &self,
        patient_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RiskAssessment, EvaluationError> {
        let pipeline = self
            .pipeline(patient_id)
            .ok_or_else(|| EvaluationError::UnknownPatient(patient_id.to_string()))?;

        let mut eval = pipeline.eval.lock();
        eval.tick += 1;
        let tick = eval.tick;

        let snapshot = pipeline
            .timeline
            .read()
            .snapshot(now, self.config.long_window_secs);
        let features = self.extractor.extract(&snapshot);

        let (assessment, changed) = match self.model.score(&features) {
            Ok(raw) => {
                let obs = eval.stabilizer.observe(raw.level, now);
                let stabilized = obs.stabilized_level;
                let contributors = self.explainer.explain(&features, &raw);

                let assessment = RiskAssessment {
                    patient_id: patient_id.to_string(),
                    timestamp: now,
                    tick,
                    raw_score: Some(raw.score),
                    raw_level: raw.level,
                    stabilized_level: stabilized,
                    top_contributors: contributors,
                    insufficient_channels: features.insufficient_channels().to_vec(),
                    recommendation: stabilized.recommendation().to_string(),
                };

                // Recovering from a data gap counts as a change even when
                // the stabilizer's level never moved
                let recovered = eval.last_assessment.as_ref().is_some_and(|a| a.is_unknown());
                (assessment, obs.changed || recovered)
            }
            Err(ScoreError::NoUsableFeatures) => {
                // Explicit Unknown, never a misleading Low; the stabilizer
                // only resets its candidate streak across the gap.
                eval.stabilizer.observe(RiskLevel::Unknown, now);
                let assessment = RiskAssessment::unknown(
                    patient_id,
                    now,
                    tick,
                    features.insufficient_channels().to_vec(),
                );
                // Falling into Unknown is a change the dashboard must see
                let fell_unknown =
                    eval.last_assessment.as_ref().is_some_and(|a| !a.is_unknown());
                (assessment, fell_unknown)
            }
        };

        // Alerting is best-effort and never blocks the pipeline. Compare
        // against the last concrete level so an escalation committing on
        // the first tick after a data gap still fires.
        pipeline
            .alerts
            .lock()
            .evaluate(eval.last_concrete.as_ref(), &assessment);

        let heartbeat = self.config.hysteresis.heartbeat_ticks.max(1) as u64;
        if changed || tick % heartbeat == 0 {
            // Send fails only when nobody subscribed
            let _ = pipeline.tx.send(assessment.clone());
        }

        eval.history.push_back(assessment.clone());
        while eval.history.len() > self.config.history_len {
            eval.history.pop_front();
        }
        eval.last_assessment = Some(assessment.clone());
        if !assessment.is_unknown() {
            eval.last_concrete = Some(assessment.clone());
        }

        Ok(assessment)
    }

    // ------------------------------------------------------------------------
    // QUERIES
    // ------------------------------------------------------------------------

    /// Stream of assessments for a patient: one element per committed
    /// level change or heartbeat tick. Resubscribe to restart.
    pub fn subscribe(&self, patient_id: &str) -> broadcast::Receiver<RiskAssessment> {
        self.pipeline_or_create(patient_id).tx.subscribe()
    }

    /// Alert records for a patient at or after `since`, oldest first.
    pub fn get_alerts(&self, patient_id: &str, since: DateTime<Utc>) -> Vec<AlertRecord> {
        self.pipeline(patient_id)
            .map_or_else(Vec::new, |p| p.alerts.lock().alerts_since(since))
    }

    /// Most recent assessment, if the patient has been evaluated.
    pub fn last_assessment(&self, patient_id: &str) -> Option<RiskAssessment> {
        self.pipeline(patient_id)
            .and_then(|p| p.eval.lock().last_assessment.clone())
    }

    /// Up to `n` most recent assessments, oldest first (the dashboard's
    /// risk trajectory reads this).
    pub fn assessment_history(&self, patient_id: &str, n: usize) -> Vec<RiskAssessment> {
        self.pipeline(patient_id).map_or_else(Vec::new, |p| {
            let eval = p.eval.lock();
            let skip = eval.history.len().saturating_sub(n);
            eval.history.iter().skip(skip).cloned().collect()
        })
    }

    /// Patients currently monitored.
    pub fn patient_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.patients.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

// ============================================================================
// TESTS
// ============================================================================
