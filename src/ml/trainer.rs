// ============================================================
// Layer 5 — Trainer
// ============================================================
// Drives training epoch by epoch as a small state machine:
//
//   Initialized ─► Epoch(k) ─► Evaluated(k) ─┬─► Checkpointed(k) ─┐
//                     ▲                      └─► Skipped(k) ──────┤
//                     └───────────── next epoch ◄─────────────────┤
//                                                                 ▼
//                                               Finished (budget or patience)
//
// Epoch(k):       shuffled mini-batches (seed + k), forward, loss,
//                 backward, optimiser step, exactly one pass.
// Evaluated(k):   inference-mode pass over the validation split,
//                 no shuffling and no updates.
// Checkpointed:   strict improvement of the configured metric; the
//                 model is snapshotted in memory and saved if asked.
//
// An epoch trains a copy of the model and only commits it once
// every batch produced a finite loss. On a NaN/inf loss training
// aborts, the live model goes back to the best snapshot and
// nothing is written.
//
// A failed save does not stop training: it is reported in the
// epoch report, retried at the next epoch and once more at the end.
//
// Key Burn insight:
//   - Training uses the Autodiff backend for gradients
//   - model.valid() returns the model on the inner backend,
//     which is what evaluation runs on
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Context;
use burn::{
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    module::AutodiffModule,
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{fmt, path::Path};

use crate::data::batcher::ClassificationBatcher;
use crate::data::dataset::{ClassificationDataset, ClassificationSample};
use crate::data::preprocessor::Preprocessor;
use crate::data::vectors::FastTextVectors;
use crate::domain::config::ModelConfig;
use crate::domain::document::{LabeledDocument, TokenizedDocument};
use crate::domain::error::{TrainError, TrainResult};
use crate::domain::labels::LabelSet;
use crate::domain::metric::MetricSet;
use crate::domain::traits::VectorSource;
use crate::domain::vocabulary::{PretrainedVectors, Vocabulary};
use crate::infra::checkpoint::{BestCheckpoint, CheckpointManager, ModelManifest};
use crate::infra::metrics::{EpochMetrics, MetricsLogger, METRICS_FILE};
use crate::infra::tokenizer_store::{TextTokenizer, TokenizerStore};
use crate::ml::context::ComputeContext;
use crate::ml::decoder::DecodeMode;
use crate::ml::embedding::EmbeddingTable;
use crate::ml::loss::LabelLoss;
use crate::ml::model::{model_for_config, MultiLabelModel};
use crate::ml::optimizer::{build_optimizer, ParameterUpdate};
use crate::ml::tracker::MetricTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Initialized,
    Epoch(usize),
    Evaluated(usize),
    Checkpointed(usize),
    Skipped(usize),
    Finished,
}

impl fmt::Display for TrainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainerState::Initialized     => write!(f, "initialized"),
            TrainerState::Epoch(k)        => write!(f, "epoch {k}"),
            TrainerState::Evaluated(k)    => write!(f, "evaluated {k}"),
            TrainerState::Checkpointed(k) => write!(f, "checkpointed {k}"),
            TrainerState::Skipped(k)      => write!(f, "skipped {k}"),
            TrainerState::Finished        => write!(f, "finished"),
        }
    }
}

/// Outcome of one call to [`Trainer::run_epoch`].
#[derive(Debug)]
pub struct EpochReport {
    pub epoch:             usize,
    pub train_loss:        f64,
    pub validation:        MetricSet,
    /// Checkpointed(epoch) or Skipped(epoch)
    pub state:             TrainerState,
    pub improved:          bool,
    /// The trainer reached Finished at the end of this epoch
    pub finished:          bool,
    /// Last save failure seen during this epoch, if any
    pub persistence_error: Option<TrainError>,
}

pub struct Trainer<B: AutodiffBackend> {
    config:          ModelConfig,
    labels:          LabelSet,
    tokenizer:       TextTokenizer,
    preprocessor:    Preprocessor,
    model:           MultiLabelModel<B>,
    best_model:      Option<MultiLabelModel<B>>,
    optimizer:       Box<dyn ParameterUpdate<B>>,
    loss:            LabelLoss<B>,
    tracker:         MetricTracker,
    state:           TrainerState,
    context:         Option<ComputeContext<B>>,
    checkpoints:     CheckpointManager,
    metrics_log:     Option<MetricsLogger>,
    train_data:      ClassificationDataset,
    validation_data: ClassificationDataset,
    pending_save:    bool,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Load `vectors.vec` from `data_dir` and build a trainer on the
    /// default device.
    pub fn construct(
        data_dir: impl AsRef<Path>,
        labels:   LabelSet,
        config:   ModelConfig,
    ) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        let (vocabulary, vectors) = FastTextVectors::new(data_dir)
            .fetch_vocabulary_and_vectors(config.voc_size)
            .context("Cannot load pretrained vectors")?;
        Ok(Self::new(data_dir, labels, config, &vocabulary, &vectors, B::Device::default())?)
    }

    pub fn new(
        data_dir:   impl AsRef<Path>,
        labels:     LabelSet,
        config:     ModelConfig,
        vocabulary: &Vocabulary,
        vectors:    &PretrainedVectors,
        device:     B::Device,
    ) -> TrainResult<Self> {
        config.validate(&labels)?;
        vectors.check_against(vocabulary, config.embedding_dim)?;

        let context = ComputeContext::<B>::new(device, config.seed);
        let table = EmbeddingTable::from_pretrained(
            vectors,
            config.embedding_dim,
            !config.fixed_emb,
            context.device(),
        )?;
        let model = model_for_config(&config, labels.len(), table, context.device());
        let tokenizer = TextTokenizer::from_vocabulary(vocabulary)
            .map_err(|e| TrainError::Configuration(format!("{e:#}")))?;
        let optimizer = build_optimizer::<B>(config.optimizer);
        let loss = LabelLoss::new(config.loss(), config.label_weights.as_deref(), context.device());
        let tracker = MetricTracker::new(config.metric, config.patience);
        let checkpoints = CheckpointManager::for_model(data_dir, &config.model_name());

        tracing::info!(
            "Model '{}': {} labels, {} layers of {}, {} optimiser, lr={}, tracking {}",
            config.model_name(),
            labels.len(),
            config.num_layers,
            config.hidden_size,
            config.optimizer,
            config.learning_rate(),
            config.metric,
        );

        Ok(Self {
            config,
            labels,
            tokenizer,
            preprocessor: Preprocessor::new(),
            model,
            best_model: None,
            optimizer,
            loss,
            tracker,
            state: TrainerState::Initialized,
            context: Some(context),
            checkpoints,
            metrics_log: None,
            train_data: ClassificationDataset::default(),
            validation_data: ClassificationDataset::default(),
            pending_save: false,
        })
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == TrainerState::Finished
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn tokenizer(&self) -> &TextTokenizer {
        &self.tokenizer
    }

    /// The live model.
    pub fn model(&self) -> &MultiLabelModel<B> {
        &self.model
    }

    /// The snapshot of the best epoch so far.
    pub fn best_model(&self) -> Option<&MultiLabelModel<B>> {
        self.best_model.as_ref()
    }

    pub fn tracker(&self) -> &MetricTracker {
        &self.tracker
    }

    pub fn checkpoint_dir(&self) -> &Path {
        self.checkpoints.dir()
    }

    // ── Documents ────────────────────────────────────────────────────────────

    /// Token ids and target vectors of raw documents, cleaned the
    /// same way the predictor cleans its input.
    pub fn tokenize(&self, documents: &[LabeledDocument]) -> TrainResult<Vec<TokenizedDocument>> {
        documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let tokens = self
                    .tokenizer
                    .encode(&self.preprocessor.clean(&doc.text))
                    .map_err(|e| TrainError::DataShape(format!("cannot tokenize document {i}: {e:#}")))?;
                let targets = self.labels.encode(&doc.labels)?;
                Ok(TokenizedDocument::new(tokens, targets))
            })
            .collect()
    }

    /// Check every document against the model shape and keep both
    /// splits for the following epochs.
    pub fn prepare(&mut self, train: &[TokenizedDocument], validation: &[TokenizedDocument]) -> TrainResult<()> {
        if self.is_finished() {
            return Err(TrainError::Finished);
        }
        if train.is_empty() {
            return Err(TrainError::DataShape("training split is empty".into()));
        }
        if validation.is_empty() {
            return Err(TrainError::DataShape("validation split is empty".into()));
        }
        self.check_documents("training", train)?;
        self.check_documents("validation", validation)?;

        self.train_data = ClassificationDataset::new(train.iter().map(ClassificationSample::from).collect());
        self.validation_data =
            ClassificationDataset::new(validation.iter().map(ClassificationSample::from).collect());
        tracing::info!("Prepared {} training and {} validation documents", train.len(), validation.len());
        Ok(())
    }

    fn check_documents(&self, split: &str, documents: &[TokenizedDocument]) -> TrainResult<()> {
        let rows = self.model.embeddings().rows();
        for (i, doc) in documents.iter().enumerate() {
            if doc.targets.len() != self.labels.len() {
                return Err(TrainError::DataShape(format!(
                    "{split} document {i} has {} targets, expected {}",
                    doc.targets.len(),
                    self.labels.len()
                )));
            }
            if let Some(&token) = doc.tokens.iter().find(|&&t| t as usize >= rows) {
                return Err(TrainError::DataShape(format!(
                    "{split} document {i} uses token index {token}, the table has {rows} rows"
                )));
            }
        }
        Ok(())
    }

    // ── Training ─────────────────────────────────────────────────────────────

    /// Tokenise, train until finished, return the best metric value.
    pub fn train(&mut self, train: &[LabeledDocument], validation: &[LabeledDocument]) -> TrainResult<f64> {
        let train = self.tokenize(train)?;
        let validation = self.tokenize(validation)?;
        self.fit(&train, &validation)
    }

    /// Train on already tokenised splits until finished.
    pub fn fit(&mut self, train: &[TokenizedDocument], validation: &[TokenizedDocument]) -> TrainResult<f64> {
        self.prepare(train, validation)?;
        while !self.is_finished() {
            let report = self.run_epoch()?;
            if let Some(err) = &report.persistence_error {
                tracing::warn!("Epoch {}: {}", report.epoch, err);
            }
        }
        Ok(self.tracker.best())
    }

    /// Run one epoch: train, evaluate, keep or skip the result.
    pub fn run_epoch(&mut self) -> TrainResult<EpochReport> {
        if self.is_finished() {
            return Err(TrainError::Finished);
        }
        if self.train_data.sample_count() == 0 || self.validation_data.sample_count() == 0 {
            return Err(TrainError::DataShape("no documents prepared for training".into()));
        }
        let epoch = self.tracker.history().len() + 1;
        let mut persistence_error = self.retry_pending_save();

        self.state = TrainerState::Epoch(epoch);
        let train_loss = match self.train_epoch(epoch) {
            Ok(loss) => loss,
            Err(err) => {
                self.abort(&err);
                return Err(err);
            }
        };

        self.state = TrainerState::Evaluated(epoch);
        let validation = match self.evaluate() {
            Ok(metrics) => metrics,
            Err(err) => {
                self.abort(&err);
                return Err(err);
            }
        };

        let improved = self.tracker.observe(epoch, validation.get(self.config.metric));
        if improved {
            self.best_model = Some(self.model.clone());
            self.state = TrainerState::Checkpointed(epoch);
            if self.config.save {
                if let Err(err) = self.persist_best() {
                    tracing::warn!("Epoch {epoch}: {err}");
                    self.pending_save = true;
                    persistence_error = Some(err);
                } else {
                    self.pending_save = false;
                }
            }
        } else {
            self.state = TrainerState::Skipped(epoch);
        }
        let state = self.state;

        if let Some(err) = self.log_epoch(&EpochMetrics::new(epoch, train_loss, validation, improved)) {
            persistence_error = Some(err);
        }

        if self.config.verbose {
            let marker = if improved { " *" } else { "" };
            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | {}{}",
                epoch, self.config.epochs, train_loss, validation, marker,
            );
        }
        tracing::debug!("Epoch {epoch}: {state}, train_loss={train_loss:.4}, {validation}");

        let finished = epoch >= self.config.epochs || self.tracker.exhausted();
        if finished {
            if self.tracker.exhausted() && epoch < self.config.epochs {
                tracing::info!(
                    "Early stopping at epoch {} ({} epochs without improvement)",
                    epoch,
                    self.tracker.stale_epochs()
                );
            }
            if let Some(err) = self.finish() {
                persistence_error = Some(err);
            }
        }

        Ok(EpochReport {
            epoch,
            train_loss,
            validation,
            state,
            improved,
            finished,
            persistence_error,
        })
    }

    fn train_epoch(&mut self, epoch: usize) -> TrainResult<f64> {
        let context = self.context.as_ref().ok_or(TrainError::Finished)?;
        let batcher = ClassificationBatcher::<B>::new(context.device().clone(), self.config.max_words);
        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(self.config.batch_size)
            .shuffle(context.epoch_seed(epoch))
            .num_workers(1)
            .build(self.train_data.clone());

        let lr = self.config.learning_rate();
        let mut model = self.model.clone();
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for (index, batch) in loader.iter().enumerate() {
            let (loss, _) = model.forward_loss(&batch, &self.loss);

            let value: f64 = loss.clone().into_scalar().elem::<f64>();
            if !value.is_finite() {
                return Err(TrainError::NumericDivergence { epoch, batch: index, loss: value });
            }
            loss_sum += value;
            batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = self.optimizer.update(lr, model, grads);
        }

        self.model = model;
        Ok(if batches > 0 { loss_sum / batches as f64 } else { f64::NAN })
    }

    /// Metrics of the live model on the validation split.
    ///
    /// Inference mode, fixed order, no parameter updates: calling it
    /// twice without training in between gives the same result.
    pub fn evaluate(&self) -> TrainResult<MetricSet> {
        if self.validation_data.sample_count() == 0 {
            return Err(TrainError::DataShape("validation split is empty".into()));
        }
        let model = self.model.valid();
        evaluate_model(&model, self.validation_data.samples(), &self.config)
    }

    fn abort(&mut self, err: &TrainError) {
        tracing::error!("Training aborted: {err}");
        if let Some(best) = &self.best_model {
            self.model = best.clone();
        }
        self.pending_save = false;
        self.state = TrainerState::Finished;
        self.context = None;
    }

    fn finish(&mut self) -> Option<TrainError> {
        let err = self.retry_pending_save();
        self.state = TrainerState::Finished;
        self.context = None;
        match self.tracker.best_epoch() {
            Some(epoch) => tracing::info!(
                "Training complete: best {}={:.4} at epoch {}",
                self.config.metric,
                self.tracker.best(),
                epoch
            ),
            None => tracing::info!("Training complete without a finite {}", self.config.metric),
        }
        err
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    fn retry_pending_save(&mut self) -> Option<TrainError> {
        if !self.pending_save {
            return None;
        }
        match self.persist_best() {
            Ok(()) => {
                tracing::info!("Saved best checkpoint after an earlier failure");
                self.pending_save = false;
                None
            }
            Err(err) => {
                tracing::warn!("Retrying checkpoint save failed: {err}");
                Some(err)
            }
        }
    }

    fn persist_best(&self) -> TrainResult<()> {
        let (Some(model), Some(epoch)) = (&self.best_model, self.tracker.best_epoch()) else {
            return Ok(());
        };
        let best = BestCheckpoint { epoch, metric: self.config.metric, value: self.tracker.best() };
        let manifest = ModelManifest {
            config:         self.config.clone(),
            labels:         self.labels.clone(),
            embedding_rows: model.embeddings().rows(),
            embedding_dim:  model.embeddings().dim(),
        };

        self.checkpoints
            .save_manifest(&manifest)
            .and_then(|()| TokenizerStore::new(self.checkpoints.dir()).save(&self.tokenizer))
            .and_then(|()| self.checkpoints.save_best(model, &best))
            .map_err(|e| TrainError::Persistence {
                path:    self.checkpoints.dir().to_path_buf(),
                message: format!("{e:#}"),
            })?;
        tracing::info!("Saved best checkpoint to '{}'", self.checkpoints.dir().display());
        Ok(())
    }

    fn log_epoch(&mut self, row: &EpochMetrics) -> Option<TrainError> {
        if !self.config.save {
            return None;
        }
        let to_error = |e: anyhow::Error, dir: &Path| TrainError::Persistence {
            path:    dir.join(METRICS_FILE),
            message: format!("{e:#}"),
        };
        if self.metrics_log.is_none() {
            match MetricsLogger::create(self.checkpoints.dir()) {
                Ok(logger) => self.metrics_log = Some(logger),
                Err(e) => return Some(to_error(e, self.checkpoints.dir())),
            }
        }
        let logger = self.metrics_log.as_ref()?;
        logger.log(row).err().map(|e| to_error(e, self.checkpoints.dir()))
    }
}

/// Loss and label metrics of `model` over `samples`, in order.
pub fn evaluate_model<B: Backend>(
    model:   &MultiLabelModel<B>,
    samples: &[ClassificationSample],
    config:  &ModelConfig,
) -> TrainResult<MetricSet> {
    let device     = model.embeddings().device();
    let batcher    = ClassificationBatcher::<B>::new(device.clone(), config.max_words);
    let loss       = LabelLoss::<B>::new(config.loss(), config.label_weights.as_deref(), &device);
    let num_labels = model.num_labels();

    let mut loss_sum    = 0.0f64;
    let mut predictions = Vec::with_capacity(samples.len());
    let mut targets     = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(config.batch_size.max(1)) {
        let batch  = batcher.batch(chunk.to_vec());
        let scores = model.scores(batch.tokens, batch.mask, DecodeMode::Inference);

        let batch_loss: f64 = loss
            .forward(scores.clone(), batch.targets)
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss * chunk.len() as f64;

        let flat = scores
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| TrainError::Backend(format!("{e:?}")))?;
        predictions.extend(
            flat.chunks(num_labels)
                .map(|row| row.iter().map(|&s| s > 0.0).collect::<Vec<bool>>()),
        );
        targets.extend(chunk.iter().map(ClassificationSample::target_flags));
    }

    let mean_loss = if samples.is_empty() { f64::NAN } else { loss_sum / samples.len() as f64 };
    Ok(MetricSet::compute(mean_loss, &predictions, &targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::OptimizerKind;
    use crate::domain::metric::ValidationMetric;
    use burn::backend::{Autodiff, NdArray};

    type TB = Autodiff<NdArray>;

    const WORDS: [&str; 6] = ["wheat", "corn", "oil", "crude", "bank", "rate"];
    const DIM: usize = 8;

    fn vocabulary() -> Vocabulary {
        Vocabulary::from_tokens(WORDS, 100)
    }

    fn vectors() -> PretrainedVectors {
        let rows = WORDS.len() + 1;
        let mut values = vec![0.0f32; DIM];
        for r in 1..rows {
            values.extend((0..DIM).map(|c| (((r * 7 + c * 3) % 11) as f32 - 5.0) / 5.0));
        }
        PretrainedVectors::new(rows, DIM, values).unwrap()
    }

    fn labels() -> LabelSet {
        LabelSet::new(vec!["grain".into(), "energy".into()]).unwrap()
    }

    fn config() -> ModelConfig {
        ModelConfig {
            embedding_dim: DIM,
            hidden_size:   16,
            num_layers:    1,
            max_words:     10,
            epochs:        4,
            patience:      None,
            batch_size:    4,
            learning_rate: Some(0.01),
            verbose:       false,
            ..Default::default()
        }
    }

    fn trainer(dir: &Path, config: ModelConfig) -> Trainer<TB> {
        Trainer::new(dir, labels(), config, &vocabulary(), &vectors(), Default::default()).unwrap()
    }

    /// grain ⇔ wheat/corn present, energy ⇔ oil/crude present
    fn documents() -> Vec<TokenizedDocument> {
        let texts: [&[u32]; 8] = [
            &[1, 5], &[2, 6], &[3, 5], &[4, 6],
            &[1, 3], &[2, 4, 5], &[5, 6], &[6],
        ];
        texts
            .iter()
            .map(|t| {
                let grain  = t.iter().any(|&x| x == 1 || x == 2);
                let energy = t.iter().any(|&x| x == 3 || x == 4);
                TokenizedDocument::new(t.to_vec(), vec![grain, energy])
            })
            .collect()
    }

    #[test]
    fn test_two_label_run_outputs_probabilities() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), config());
        let docs = documents();
        let best = t.fit(&docs, &docs).unwrap();

        assert!(t.is_finished());
        assert!((0.0..=1.0).contains(&best));
        assert_eq!(t.tracker().history().len(), 4);

        let model = t.model().valid();
        let batcher = ClassificationBatcher::<NdArray>::new(Default::default(), 10);
        let (tokens, mask) = batcher.tokens(&[&[1, 5], &[3], &[]]);
        let probs = model.forward_infer(tokens, mask).into_data().to_vec::<f32>().unwrap();
        assert_eq!(probs.len(), 6);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    // ── Two labels, 2000-token vocabulary, one epoch ─────────────────────────

    const SCENARIO_VOC: usize = 2000;

    fn scenario_trainer(dir: &Path, config: ModelConfig) -> Trainer<TB> {
        let words: Vec<String> = (1..SCENARIO_VOC).map(|i| format!("w{i}")).collect();
        let vocabulary = Vocabulary::from_tokens(words, SCENARIO_VOC);
        let mut values = vec![0.0f32; DIM];
        for r in 1..SCENARIO_VOC {
            values.extend((0..DIM).map(|c| (((r * 13 + c * 7) % 19) as f32 - 9.0) / 9.0));
        }
        let vectors = PretrainedVectors::new(SCENARIO_VOC, DIM, values).unwrap();
        let config = ModelConfig {
            voc_size:  SCENARIO_VOC,
            max_words: 300,
            epochs:    1,
            ..config
        };
        Trainer::new(dir, labels(), config, &vocabulary, &vectors, Default::default()).unwrap()
    }

    /// Ten documents with exactly one true label each; the longer ones
    /// run past max_words.
    fn scenario_documents() -> Vec<TokenizedDocument> {
        (0..10)
            .map(|i| {
                let tokens = (0..20 + i * 40)
                    .map(|k| ((i * 131 + k * 17) % (SCENARIO_VOC - 1) + 1) as u32)
                    .collect();
                TokenizedDocument::new(tokens, vec![i % 2 == 0, i % 2 == 1])
            })
            .collect()
    }

    fn scenario_outputs(t: &Trainer<TB>, docs: &[TokenizedDocument]) -> (MultiLabelModel<NdArray>, Vec<f32>) {
        let model = t.model().valid();
        let rows: Vec<&[u32]> = docs.iter().map(|d| d.tokens.as_slice()).collect();
        let (tokens, mask) = ClassificationBatcher::<NdArray>::new(Default::default(), 300).tokens(&rows);
        let outputs = model.forward_infer(tokens, mask).into_data().to_vec::<f32>().unwrap();
        (model, outputs)
    }

    #[test]
    fn test_single_epoch_independent_probabilities() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = scenario_trainer(dir.path(), config());
        let docs = scenario_documents();
        t.fit(&docs, &docs).unwrap();
        assert_eq!(t.tracker().history().len(), 1);

        let (_, probs) = scenario_outputs(&t, &docs);
        assert_eq!(probs.len(), 20);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_single_epoch_chain_hinge_margins() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ModelConfig { chain: true, hinge: true, learning_rate: Some(0.05), ..config() };
        let mut t = scenario_trainer(dir.path(), cfg);
        let docs = scenario_documents();
        t.fit(&docs, &docs).unwrap();

        let (model, margins) = scenario_outputs(&t, &docs);
        assert_eq!(margins.len(), 20);
        assert!(margins.iter().any(|m| !(0.0..=1.0).contains(m)));

        // Label 1 is conditioned on the thresholded label 0 decision
        let decisions: Vec<f32> = margins.iter().map(|&m| if m > 0.0 { 1.0 } else { 0.0 }).collect();
        let forced = Tensor::<NdArray, 1>::from_floats(decisions.as_slice(), &Default::default())
            .reshape([docs.len(), 2]);
        let rows: Vec<&[u32]> = docs.iter().map(|d| d.tokens.as_slice()).collect();
        let (tokens, mask) = ClassificationBatcher::<NdArray>::new(Default::default(), 300).tokens(&rows);
        let replayed = model
            .scores(tokens, mask, DecodeMode::Training { targets: forced })
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        for (a, b) in margins.iter().zip(&replayed) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_tokenize_cleans_text_like_the_predictor() {
        let dir = tempfile::tempdir().unwrap();
        let t = trainer(dir.path(), config());
        let docs = vec![LabeledDocument::new("crude&amp;oil", ["energy"])];
        let tokenized = t.tokenize(&docs).unwrap();
        // "&" is out of vocabulary and maps to the unknown index
        assert_eq!(tokenized[0].tokens, vec![4, 0, 3]);
        assert_eq!(tokenized[0].tokens, t.tokenizer().encode("crude&oil").unwrap());
    }

    #[test]
    fn test_best_metric_never_decreases() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), ModelConfig { epochs: 5, ..config() });
        let docs = documents();
        t.prepare(&docs, &docs).unwrap();

        let mut best = f64::NEG_INFINITY;
        while !t.is_finished() {
            let report = t.run_epoch().unwrap();
            assert!(matches!(report.state, TrainerState::Checkpointed(_) | TrainerState::Skipped(_)));
            assert_eq!(report.improved, matches!(report.state, TrainerState::Checkpointed(_)));
            assert!(t.tracker().best() >= best);
            best = t.tracker().best();
        }
        assert_eq!(t.state(), TrainerState::Finished);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), ModelConfig { chain: true, ..config() });
        let docs = documents();
        t.prepare(&docs, &docs).unwrap();
        t.run_epoch().unwrap();
        assert_eq!(t.evaluate().unwrap(), t.evaluate().unwrap());
    }

    #[test]
    fn test_frozen_table_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), ModelConfig { fixed_emb: true, ..config() });
        let before = t.model().embeddings().values().unwrap();
        let docs = documents();
        t.fit(&docs, &docs).unwrap();
        let after = t.model().embeddings().values().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_trainable_table_moves() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), ModelConfig { optimizer: OptimizerKind::Momentum, ..config() });
        let before = t.model().embeddings().values().unwrap();
        let docs = documents();
        t.prepare(&docs, &docs).unwrap();
        t.run_epoch().unwrap();
        assert_ne!(before, t.model().embeddings().values().unwrap());
    }

    #[test]
    fn test_patience_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        // the learning rate is tiny, so accuracy plateaus right away
        let cfg = ModelConfig {
            epochs:        50,
            patience:      Some(1),
            learning_rate: Some(1e-9),
            metric:        ValidationMetric::Accuracy,
            ..config()
        };
        let mut t = trainer(dir.path(), cfg);
        let docs = documents();
        t.fit(&docs, &docs).unwrap();
        assert!(t.tracker().history().len() < 50);
    }

    #[test]
    fn test_non_finite_loss_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut values = vectors().values;
        values[DIM] = f32::NAN; // first coordinate of "wheat"
        let poisoned = PretrainedVectors::new(WORDS.len() + 1, DIM, values).unwrap();
        let mut t = Trainer::<TB>::new(
            dir.path(),
            labels(),
            ModelConfig { save: true, batch_size: 8, ..config() },
            &vocabulary(),
            &poisoned,
            Default::default(),
        )
        .unwrap();

        let docs = documents();
        let err = t.fit(&docs, &docs).unwrap_err();
        assert!(matches!(err, TrainError::NumericDivergence { epoch: 1, batch: 0, .. }));
        assert!(t.is_finished());
        assert!(t.best_model().is_none());
        assert!(!t.checkpoint_dir().exists());
        assert!(matches!(t.run_epoch(), Err(TrainError::Finished)));
    }

    #[test]
    fn test_saves_best_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), ModelConfig { save: true, epochs: 2, ..config() });
        let docs = documents();
        t.fit(&docs, &docs).unwrap();

        let ckpt = t.checkpoint_dir().to_path_buf();
        assert_eq!(ckpt, dir.path().join("models").join(t.config().model_name()));
        for file in ["model.mpk.gz", "best.json", "manifest.json", "tokenizer.json", "metrics.csv"] {
            assert!(ckpt.join(file).exists(), "missing {file}");
        }
        let best = CheckpointManager::new(&ckpt).load_best().unwrap();
        assert_eq!(Some(best.epoch), t.tracker().best_epoch());
    }

    #[test]
    fn test_persistence_failure_does_not_stop_training() {
        // a regular file where the data directory should be
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut t = trainer(file.path(), ModelConfig { save: true, epochs: 2, ..config() });
        let docs = documents();
        t.prepare(&docs, &docs).unwrap();

        let first = t.run_epoch().unwrap();
        assert!(first.improved);
        assert!(matches!(first.persistence_error, Some(TrainError::Persistence { .. })));
        assert!(t.best_model().is_some());

        let second = t.run_epoch().unwrap();
        assert!(second.finished);
        assert!(matches!(second.persistence_error, Some(TrainError::Persistence { .. })));
        assert!(t.is_finished());
    }

    #[test]
    fn test_rejects_bad_documents_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), config());
        let docs = documents();

        let out_of_range = vec![TokenizedDocument::new(vec![1, 99], vec![true, false])];
        assert!(matches!(t.prepare(&out_of_range, &docs), Err(TrainError::DataShape(_))));

        let short = vec![TokenizedDocument::new(vec![1], vec![true])];
        assert!(matches!(t.prepare(&docs, &short), Err(TrainError::DataShape(_))));

        assert!(matches!(t.prepare(&[], &docs), Err(TrainError::DataShape(_))));
        assert!(matches!(t.prepare(&docs, &[]), Err(TrainError::DataShape(_))));
        assert!(matches!(t.run_epoch(), Err(TrainError::DataShape(_))));
        assert_eq!(t.state(), TrainerState::Initialized);
    }

    #[test]
    fn test_rejects_mismatched_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let result = Trainer::<TB>::new(
            dir.path(),
            labels(),
            ModelConfig { embedding_dim: DIM + 1, ..config() },
            &vocabulary(),
            &vectors(),
            Default::default(),
        );
        assert!(matches!(result, Err(TrainError::Configuration(_))));
    }

    #[test]
    fn test_train_tokenizes_raw_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(dir.path(), ModelConfig { epochs: 1, hinge: true, chain: true, ..config() });
        let docs = vec![
            LabeledDocument::new("Wheat and corn", ["grain"]),
            LabeledDocument::new("crude oil", ["energy"]),
            LabeledDocument::new("bank rate", Vec::<String>::new()),
        ];
        let best = t.train(&docs, &docs).unwrap();
        assert!(best.is_finite());

        let unknown = vec![LabeledDocument::new("wheat", ["metals"])];
        let mut fresh = trainer(dir.path(), config());
        assert!(matches!(fresh.train(&unknown, &docs), Err(TrainError::DataShape(_))));
    }
}
