//! Training session: the epoch loop that drives the trainer, charts and diagram.
//!
//! A session moves through `Idle -> Training -> Stopping -> Idle`. Cancellation
//! is cooperative: [`CancellationToken::cancel`] only raises a flag, which the
//! loop checks at the start of each epoch. A running `fit` call is never
//! interrupted, so cancellation takes effect between epochs.
//!
//! Trainer failures are contained here. They are logged, the trainer is
//! disposed and the session returns to `Idle`; the visualizer keeps its last
//! good frame.
//!
//! The loop can be driven in two ways. [`TrainingSession::run`] blocks until the
//! run ends and calls a [`FrameYield`] hook after every epoch. Hosts with their
//! own scheduler (such as a browser animation frame) call
//! [`TrainingSession::start`] once and then [`TrainingSession::step`] once per
//! tick.

use crate::chart::ChartSink;
use crate::dataset::Dataset;
use crate::surface::Surface;
use crate::trainer::{EpochMetrics, Trainer, TrainerFactory};
use crate::{LayerWidths, PlaygroundConfig, Result, Visualizer, VizError};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop before the next epoch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once a stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Where the session is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Training,
    /// Stop requested; the run ends at the next epoch boundary
    Stopping,
}

impl SessionState {
    /// Caption for the start/stop toggle.
    pub fn button_label(self) -> &'static str {
        match self {
            SessionState::Idle | SessionState::Stopping => "Start Training",
            SessionState::Training => "Stop Training",
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingOutcome {
    Completed { epochs: usize },
    Interrupted { epochs_completed: usize },
    Failed { epochs_completed: usize, message: String },
}

impl TrainingOutcome {
    /// Number of epochs that finished before the run ended.
    pub fn epochs_completed(&self) -> usize {
        match self {
            TrainingOutcome::Completed { epochs } => *epochs,
            TrainingOutcome::Interrupted { epochs_completed }
            | TrainingOutcome::Failed {
                epochs_completed, ..
            } => *epochs_completed,
        }
    }
}

/// Result of one [`TrainingSession::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum EpochStep {
    /// An epoch finished and the diagram was refreshed
    Trained { epoch: usize, metrics: EpochMetrics },
    /// The run ended during this step
    Finished(TrainingOutcome),
    /// No run in progress
    Idle,
}

/// Called after every epoch, so the host can flush the frame.
pub trait FrameYield {
    fn yield_frame(&mut self, epoch: usize, metrics: &EpochMetrics);
}

impl<F: FnMut(usize, &EpochMetrics)> FrameYield for F {
    fn yield_frame(&mut self, epoch: usize, metrics: &EpochMetrics) {
        self(epoch, metrics)
    }
}

/// A [`FrameYield`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

impl FrameYield for NoYield {
    fn yield_frame(&mut self, _epoch: usize, _metrics: &EpochMetrics) {}
}

/// The scrolling text log shown next to the controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogPanel {
    lines: Vec<String>,
}

impl LogPanel {
    /// Empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and mirror it to the `info` log.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.lines.push(line);
    }

    /// All lines, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Most recent line.
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

fn epoch_line(epoch: usize, metrics: &EpochMetrics) -> String {
    let accuracy = match metrics.accuracy_percent() {
        Some(a) => format!("{:.2}%", a),
        None => "N/A".to_string(),
    };
    format!("Epoch {}: loss = {:.4}, accuracy = {}", epoch, metrics.loss, accuracy)
}

struct ActiveRun {
    trainer: Box<dyn Trainer>,
    dataset: Dataset,
}

/// One playground's training loop state.
pub struct TrainingSession {
    config: PlaygroundConfig,
    state: SessionState,
    token: CancellationToken,
    log: LogPanel,
    widths: Option<LayerWidths>,
    run: Option<ActiveRun>,
    epochs_completed: usize,
    history: Vec<(usize, EpochMetrics)>,
    last_outcome: Option<TrainingOutcome>,
}

impl TrainingSession {
    /// Idle session with `config`; nothing is validated until [`start`](Self::start).
    pub fn new(config: PlaygroundConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            token: CancellationToken::new(),
            log: LogPanel::new(),
            widths: None,
            run: None,
            epochs_completed: 0,
            history: Vec::new(),
            last_outcome: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    /// Replace the configuration. Allowed while idle or stopping; a pending
    /// stop is settled first.
    pub fn set_config(&mut self, config: PlaygroundConfig) -> Result<()> {
        self.settle_pending_stop();
        if self.state != SessionState::Idle {
            return Err(VizError::SessionBusy(
                "cannot change configuration while training".to_string(),
            ));
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Current position in the run lifecycle.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while epochs are still being scheduled. A stopping session is not training.
    pub fn is_training(&self) -> bool {
        self.state == SessionState::Training
    }

    /// Handle that stops the current run from anywhere.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Log panel of the current or last run.
    pub fn log(&self) -> &LogPanel {
        &self.log
    }

    /// Metrics of every epoch of the current or last run.
    pub fn history(&self) -> &[(usize, EpochMetrics)] {
        &self.history
    }

    /// How the last run ended, if one has ended.
    pub fn last_outcome(&self) -> Option<&TrainingOutcome> {
        self.last_outcome.as_ref()
    }

    /// Request a stop before the next epoch and move to `Stopping`.
    ///
    /// Returns `false` unless a run is training, so repeated requests are ignored.
    pub fn request_stop(&mut self) -> bool {
        if self.state != SessionState::Training {
            return false;
        }
        self.token.cancel();
        self.state = SessionState::Stopping;
        self.log.push("Training stopped.");
        true
    }

    /// Begin a run: validate, initialize the diagram and reset log and charts.
    ///
    /// Errors here are boundary errors (bad configuration, drawing surface) and
    /// leave the session idle. The trainer is built by the first [`step`]. A
    /// run that is still stopping is ended as interrupted first.
    ///
    /// [`step`]: TrainingSession::step
    pub fn start<S, C>(&mut self, viz: &mut Visualizer<S>, charts: &mut C) -> Result<()>
    where
        S: Surface,
        C: ChartSink + ?Sized,
    {
        self.settle_pending_stop();
        if self.state != SessionState::Idle {
            return Err(VizError::SessionBusy("training already in progress".to_string()));
        }
        self.config.validate()?;

        let hp = &self.config.hyperparameters;
        viz.initialize(self.config.family, hp, self.config.canvas)?;
        self.widths = viz.layer_widths().cloned();

        self.token.reset();
        self.log.clear();
        self.history.clear();
        self.epochs_completed = 0;
        self.last_outcome = None;
        charts.reset();

        self.state = SessionState::Training;
        self.log.push("Model initialized.");
        self.log.push(format!(
            "Training {} model...",
            self.config.family.short_label()
        ));
        Ok(())
    }

    /// Advance the run by one epoch.
    pub fn step<S, F, C>(&mut self, viz: &mut Visualizer<S>, factory: &mut F, charts: &mut C) -> EpochStep
    where
        S: Surface,
        F: TrainerFactory + ?Sized,
        C: ChartSink + ?Sized,
    {
        if self.state == SessionState::Idle {
            return EpochStep::Idle;
        }

        if self.epochs_completed >= self.config.hyperparameters.epochs {
            let epochs = self.epochs_completed;
            return self.finish(TrainingOutcome::Completed { epochs });
        }

        if self.state == SessionState::Stopping || self.token.is_cancelled() {
            return self.interrupt();
        }

        if self.run.is_none() {
            if let Err(e) = self.build_run(factory) {
                error!("trainer build failed: {}", e);
                self.log.push("Error creating model.");
                return self.fail(e);
            }
        }

        match self.train_epoch(viz, charts) {
            Ok((epoch, metrics)) => EpochStep::Trained { epoch, metrics },
            Err(e) => {
                error!("training failed at epoch {}: {}", self.epochs_completed + 1, e);
                self.log.push("Error during training.");
                self.fail(e)
            }
        }
    }

    /// Run to completion, calling `frame` after every epoch.
    ///
    /// Returns `Err` only for boundary errors raised by [`start`]; trainer
    /// failures end the run with [`TrainingOutcome::Failed`].
    ///
    /// [`start`]: TrainingSession::start
    pub fn run<S, F, C, Y>(
        &mut self,
        viz: &mut Visualizer<S>,
        factory: &mut F,
        charts: &mut C,
        frame: &mut Y,
    ) -> Result<TrainingOutcome>
    where
        S: Surface,
        F: TrainerFactory + ?Sized,
        C: ChartSink + ?Sized,
        Y: FrameYield + ?Sized,
    {
        self.start(viz, charts)?;
        loop {
            match self.step(viz, factory, charts) {
                EpochStep::Trained { epoch, metrics } => frame.yield_frame(epoch, &metrics),
                EpochStep::Finished(outcome) => return Ok(outcome),
                EpochStep::Idle => {
                    return Ok(self
                        .last_outcome
                        .clone()
                        .unwrap_or(TrainingOutcome::Interrupted {
                            epochs_completed: self.epochs_completed,
                        }))
                }
            }
        }
    }

    fn build_run<F: TrainerFactory + ?Sized>(&mut self, factory: &mut F) -> Result<()> {
        let trainer = factory.build(self.config.family, &self.config.hyperparameters)?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dataset = match Dataset::generate(self.config.family, self.config.sample_count, &mut rng) {
            Ok(dataset) => dataset,
            Err(e) => {
                let mut trainer = trainer;
                trainer.dispose();
                return Err(e);
            }
        };
        debug!(
            "run prepared: {} samples of {:?}",
            dataset.len(),
            dataset.sample_shape()
        );
        self.run = Some(ActiveRun { trainer, dataset });
        Ok(())
    }

    fn train_epoch<S, C>(&mut self, viz: &mut Visualizer<S>, charts: &mut C) -> Result<(usize, EpochMetrics)>
    where
        S: Surface,
        C: ChartSink + ?Sized,
    {
        let run = self
            .run
            .as_mut()
            .ok_or_else(|| VizError::TrainerStep("no active trainer".to_string()))?;
        let widths = self.widths.as_ref().ok_or(VizError::NotInitialized)?;

        let metrics = run
            .trainer
            .fit(&run.dataset, self.config.hyperparameters.batch_size)?;
        let weights = run.trainer.observed_weights(widths)?;
        if !weights.is_empty() {
            viz.update(weights)?;
        }

        // only a fully refreshed epoch is reported
        let epoch = self.epochs_completed + 1;
        self.log.push(epoch_line(epoch, &metrics));
        charts.push(epoch, metrics.loss, metrics.accuracy);
        self.epochs_completed = epoch;
        self.history.push((epoch, metrics));
        Ok((epoch, metrics))
    }

    fn settle_pending_stop(&mut self) {
        if self.state == SessionState::Stopping {
            self.interrupt();
        }
    }

    fn interrupt(&mut self) -> EpochStep {
        warn!("cancellation observed after {} epochs", self.epochs_completed);
        self.state = SessionState::Stopping;
        self.log.push("Training interrupted.");
        let epochs_completed = self.epochs_completed;
        self.finish(TrainingOutcome::Interrupted { epochs_completed })
    }

    fn fail(&mut self, e: VizError) -> EpochStep {
        let epochs_completed = self.epochs_completed;
        self.finish(TrainingOutcome::Failed {
            epochs_completed,
            message: e.to_string(),
        })
    }

    fn finish(&mut self, outcome: TrainingOutcome) -> EpochStep {
        self.state = SessionState::Stopping;
        if let Some(mut run) = self.run.take() {
            run.trainer.dispose();
            debug!("trainer disposed");
        }
        if let TrainingOutcome::Completed { .. } = outcome {
            self.log.push("Training complete.");
        }
        self.token.reset();
        self.state = SessionState::Idle;
        self.last_outcome = Some(outcome.clone());
        EpochStep::Finished(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!other.is_cancelled());
    }

    #[test]
    fn test_epoch_line_format() {
        let m = EpochMetrics {
            loss: 0.693147,
            accuracy: Some(0.5123),
        };
        assert_eq!(epoch_line(3, &m), "Epoch 3: loss = 0.6931, accuracy = 51.23%");
        let m = EpochMetrics {
            loss: 1.0,
            accuracy: None,
        };
        assert_eq!(epoch_line(1, &m), "Epoch 1: loss = 1.0000, accuracy = N/A");
    }

    #[test]
    fn test_button_labels() {
        assert_eq!(SessionState::Idle.button_label(), "Start Training");
        assert_eq!(SessionState::Training.button_label(), "Stop Training");
        assert_eq!(SessionState::Stopping.button_label(), "Start Training");
    }

    #[test]
    fn test_request_stop_when_idle() {
        let mut session = TrainingSession::new(PlaygroundConfig::default());
        assert!(!session.request_stop());
        assert!(session.log().is_empty());
    }

    #[test]
    fn test_outcome_json() {
        let outcome = TrainingOutcome::Interrupted { epochs_completed: 2 };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"status":"interrupted","epochs_completed":2}"#);
    }
}
