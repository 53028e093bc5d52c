//! Trainer interface and the built-in dense reference trainer.
//!
//! The session only talks to [`Trainer`] and [`TrainerFactory`]; any backend that
//! can run one epoch and report its kernels can drive the diagram.
//!
//! [`DenseTrainer`] is a small fully-connected network trained with Adam. It uses
//! one dense layer per edge set of the diagram: the hidden widths match the
//! diagram exactly, while the input layer takes the whole flattened sample
//! (10 features, a 28x28 image, or a 20x10 sequence). Convolutional and
//! recurrent families are therefore approximated by dense stacks over the
//! flattened input, which is enough to produce live losses and weights.

use crate::dataset::{Dataset, SampleShape};
use crate::weights::WeightMap;
use crate::{topology, Hyperparameters, LayerWidths, ModelFamily, Result, VizError};
use log::debug;
use ndarray::{Array, Array1, Array2, ArrayView2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-7;
const PROB_CLAMP: f64 = 1e-7;

/// Loss and accuracy of one completed epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub loss: f64,
    /// Fraction of correct predictions in `[0, 1]`, when the trainer reports it
    pub accuracy: Option<f64>,
}

impl EpochMetrics {
    /// Accuracy in percent, if reported.
    pub fn accuracy_percent(&self) -> Option<f64> {
        self.accuracy.map(|a| a * 100.0)
    }
}

/// One trainable model instance.
pub trait Trainer {
    /// Run one full pass over `dataset` in shuffled mini-batches.
    fn fit(&mut self, dataset: &Dataset, batch_size: usize) -> Result<EpochMetrics>;

    /// Current kernels translated into diagram edge weights.
    fn observed_weights(&self, widths: &LayerWidths) -> Result<WeightMap>;

    /// Release model resources. Further `fit` calls fail.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// Builds a trainer for a family and hyperparameters.
pub trait TrainerFactory {
    fn build(&mut self, family: ModelFamily, hyperparameters: &Hyperparameters)
        -> Result<Box<dyn Trainer>>;
}

impl<F> TrainerFactory for F
where
    F: FnMut(ModelFamily, &Hyperparameters) -> Result<Box<dyn Trainer>>,
{
    fn build(
        &mut self,
        family: ModelFamily,
        hyperparameters: &Hyperparameters,
    ) -> Result<Box<dyn Trainer>> {
        self(family, hyperparameters)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Relu,
    Sigmoid,
    Softmax,
}

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
struct Moments<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Moments<D> {
    fn zeros_like(param: &Array<f64, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }

    fn step(&mut self, param: &mut Array<f64, D>, grad: &Array<f64, D>, lr: f64, t: i32) {
        let correct1 = 1.0 - ADAM_BETA1.powi(t);
        let correct2 = 1.0 - ADAM_BETA2.powi(t);
        Zip::from(param)
            .and(&mut self.m)
            .and(&mut self.v)
            .and(grad)
            .for_each(|p, m, v, &g| {
                *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
                *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
                let m_hat = *m / correct1;
                let v_hat = *v / correct2;
                *p -= lr * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
            });
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    /// Kernel `[inputs, outputs]`
    w: Array2<f64>,
    b: Array1<f64>,
    activation: Activation,
    w_moments: Moments<ndarray::Ix2>,
    b_moments: Moments<ndarray::Ix1>,
}

impl DenseLayer {
    fn new(inputs: usize, outputs: usize, activation: Activation, rng: &mut StdRng) -> Result<Self> {
        let std = (2.0 / inputs as f64).sqrt();
        let normal = Normal::new(0.0, std).map_err(|e| VizError::TrainerBuild(e.to_string()))?;
        let w = Array2::from_shape_fn((inputs, outputs), |_| normal.sample(&mut *rng));
        let b = Array1::zeros(outputs);
        Ok(Self {
            w_moments: Moments::zeros_like(&w),
            b_moments: Moments::zeros_like(&b),
            w,
            b,
            activation,
        })
    }

    /// Returns `(pre_activation, activation)`.
    fn forward(&self, x: ArrayView2<f64>) -> (Array2<f64>, Array2<f64>) {
        let z = x.dot(&self.w) + &self.b;
        let a = match self.activation {
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Softmax => softmax_rows(&z),
        };
        (z, a)
    }
}

fn softmax_rows(z: &Array2<f64>) -> Array2<f64> {
    let mut out = z.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Summed loss and correct-prediction count for one batch.
fn batch_scores(probs: &Array2<f64>, labels: ArrayView2<f64>) -> (f64, usize) {
    let mut loss = 0.0;
    let mut correct = 0;
    if probs.ncols() == 1 {
        for (&p, &y) in probs.iter().zip(labels.iter()) {
            let p = p.clamp(PROB_CLAMP, 1.0 - PROB_CLAMP);
            loss -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
            if (p >= 0.5) == (y >= 0.5) {
                correct += 1;
            }
        }
    } else {
        for (p_row, y_row) in probs.axis_iter(Axis(0)).zip(labels.axis_iter(Axis(0))) {
            for (&p, &y) in p_row.iter().zip(y_row.iter()) {
                if y > 0.0 {
                    loss -= y * p.clamp(PROB_CLAMP, 1.0).ln();
                }
            }
            if argmax(p_row.iter()) == argmax(y_row.iter()) {
                correct += 1;
            }
        }
    }
    (loss, correct)
}

fn argmax<'a>(values: impl Iterator<Item = &'a f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &v) in values.enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best.0
}

/// Dense network trained with Adam; the built-in [`Trainer`].
#[derive(Debug, Clone)]
pub struct DenseTrainer {
    family: ModelFamily,
    layers: Vec<DenseLayer>,
    learning_rate: f64,
    step: i32,
    epochs_run: usize,
    rng: StdRng,
    disposed: bool,
}

impl DenseTrainer {
    /// Build a network for `family`, seeding initialization and shuffling from `seed`.
    pub fn new(
        family: ModelFamily,
        hyperparameters: &Hyperparameters,
        seed: Option<u64>,
    ) -> Result<Self> {
        hyperparameters
            .validate()
            .map_err(|e| VizError::TrainerBuild(e.to_string()))?;
        let widths =
            topology::derive(family, hyperparameters).map_err(|e| VizError::TrainerBuild(e.to_string()))?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut dims = vec![SampleShape::for_family(family).len()];
        dims.extend_from_slice(&widths[1..]);

        let last = dims.len() - 2;
        let layers = dims
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let activation = match (i == last, family.num_classes()) {
                    (false, _) => Activation::Relu,
                    (true, 1) => Activation::Sigmoid,
                    (true, _) => Activation::Softmax,
                };
                DenseLayer::new(pair[0], pair[1], activation, &mut rng)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("dense trainer built for {}: dims {:?}", family.short_label(), dims);

        Ok(Self {
            family,
            layers,
            learning_rate: hyperparameters.learning_rate,
            step: 0,
            epochs_run: 0,
            rng,
            disposed: false,
        })
    }

    /// Family the network was built for.
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Layer sizes, input first.
    pub fn dims(&self) -> Vec<usize> {
        let mut dims: Vec<usize> = self.layers.iter().take(1).map(|l| l.w.nrows()).collect();
        dims.extend(self.layers.iter().map(|l| l.w.ncols()));
        dims
    }

    /// Completed calls to `fit`.
    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// Loss and accuracy on `dataset` without updating parameters.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<EpochMetrics> {
        self.check_input(dataset)?;
        let probs = self.predict(dataset.features());
        let (loss, correct) = batch_scores(&probs, dataset.labels());
        let n = dataset.len() as f64;
        Ok(EpochMetrics {
            loss: loss / n,
            accuracy: Some(correct as f64 / n),
        })
    }

    /// Output probabilities for `features`.
    pub fn predict(&self, features: ArrayView2<f64>) -> Array2<f64> {
        let mut a = features.to_owned();
        for layer in &self.layers {
            a = layer.forward(a.view()).1;
        }
        a
    }

    fn check_input(&self, dataset: &Dataset) -> Result<()> {
        let expected = self.layers.first().map_or(0, |l| l.w.nrows());
        if dataset.features().ncols() != expected {
            return Err(VizError::ShapeMismatch {
                expected,
                actual: dataset.features().ncols(),
            });
        }
        Ok(())
    }

    /// Forward, backward and one Adam update. Returns summed loss and correct count.
    fn train_batch(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> (f64, usize) {
        let mut activations = vec![x.clone()];
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let (z, a) = layer.forward(activations[activations.len() - 1].view());
            pre_activations.push(z);
            activations.push(a);
        }

        let probs = &activations[activations.len() - 1];
        let scores = batch_scores(probs, y.view());

        // sigmoid + BCE and softmax + CCE share the same output delta
        let batch = x.nrows() as f64;
        let mut delta = (probs - y) / batch;

        self.step += 1;
        let (lr, t) = (self.learning_rate, self.step);
        for l in (0..self.layers.len()).rev() {
            let grad_w = activations[l].t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));

            let layer = &mut self.layers[l];
            if l > 0 {
                let mut upstream = delta.dot(&layer.w.t());
                upstream.zip_mut_with(&pre_activations[l - 1], |d, &z| {
                    if z <= 0.0 {
                        *d = 0.0;
                    }
                });
                delta = upstream;
            }

            layer.w_moments.step(&mut layer.w, &grad_w, lr, t);
            layer.b_moments.step(&mut layer.b, &grad_b, lr, t);
        }

        scores
    }
}

impl Trainer for DenseTrainer {
    fn fit(&mut self, dataset: &Dataset, batch_size: usize) -> Result<EpochMetrics> {
        if self.disposed {
            return Err(VizError::TrainerStep("trainer has been disposed".to_string()));
        }
        self.check_input(dataset)?;

        let batches = dataset.shuffled_batches(batch_size, &mut self.rng);
        let (mut loss, mut correct) = (0.0, 0);
        for (x, y) in &batches {
            let (batch_loss, batch_correct) = self.train_batch(x, y);
            loss += batch_loss;
            correct += batch_correct;
        }

        self.epochs_run += 1;
        let n = dataset.len() as f64;
        Ok(EpochMetrics {
            loss: loss / n,
            accuracy: Some(correct as f64 / n),
        })
    }

    fn observed_weights(&self, widths: &LayerWidths) -> Result<WeightMap> {
        let mut weights = WeightMap::new();
        if self.disposed {
            return Ok(weights);
        }
        for (i, layer) in self.layers.iter().enumerate() {
            weights.extend(WeightMap::from_dense_kernel(i, layer.w.view(), widths)?);
        }
        Ok(weights)
    }

    fn dispose(&mut self) {
        self.layers.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Factory for [`DenseTrainer`]s. With a seed, each build gets `seed + n`.
#[derive(Debug, Clone, Default)]
pub struct DenseTrainerFactory {
    seed: Option<u64>,
    builds: u64,
}

impl DenseTrainerFactory {
    /// Factory drawing seeds from entropy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make builds reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl TrainerFactory for DenseTrainerFactory {
    fn build(
        &mut self,
        family: ModelFamily,
        hyperparameters: &Hyperparameters,
    ) -> Result<Box<dyn Trainer>> {
        let seed = self.seed.map(|s| s.wrapping_add(self.builds));
        self.builds += 1;
        Ok(Box::new(DenseTrainer::new(family, hyperparameters, seed)?))
    }
}
