//! Synthetic dataset source.
//!
//! Features are standard-normal noise and labels are random, so there is
//! nothing real to learn beyond memorizing the samples. The point is to drive
//! the training loop and the diagram, not to reach a meaningful accuracy.

use crate::{ModelFamily, Result, VizError};
use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Logical shape of one sample before flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleShape {
    /// Flat feature vector
    Vector { features: usize },
    /// Grayscale image, channels last
    Image {
        height: usize,
        width: usize,
        channels: usize,
    },
    /// Sequence of feature vectors
    Sequence { steps: usize, features: usize },
}

impl SampleShape {
    /// Shape used for a family's synthetic data.
    pub fn for_family(family: ModelFamily) -> Self {
        match family {
            ModelFamily::FullyConnected => SampleShape::Vector { features: 10 },
            ModelFamily::Convolutional => SampleShape::Image {
                height: 28,
                width: 28,
                channels: 1,
            },
            ModelFamily::Recurrent => SampleShape::Sequence {
                steps: 20,
                features: 10,
            },
        }
    }

    /// Flattened length.
    pub fn len(&self) -> usize {
        match *self {
            SampleShape::Vector { features } => features,
            SampleShape::Image {
                height,
                width,
                channels,
            } => height * width * channels,
            SampleShape::Sequence { steps, features } => steps * features,
        }
    }

    /// True for a zero-sized sample.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Features `[n, sample_len]` and labels `[n, classes]`, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    family: ModelFamily,
    shape: SampleShape,
    features: Array2<f64>,
    labels: Array2<f64>,
}

impl Dataset {
    /// Generate `sample_count` random samples for `family`.
    pub fn generate<R: Rng + ?Sized>(
        family: ModelFamily,
        sample_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if sample_count == 0 {
            return Err(VizError::ShapeMismatch {
                expected: crate::config::DEFAULT_SAMPLE_COUNT,
                actual: 0,
            });
        }

        let shape = SampleShape::for_family(family);
        let features: Array2<f64> =
            Array2::from_shape_fn((sample_count, shape.len()), |_| rng.sample(StandardNormal));

        let classes = family.num_classes();
        let mut labels = Array2::zeros((sample_count, classes));
        for mut row in labels.axis_iter_mut(Axis(0)) {
            if classes == 1 {
                row[0] = rng.gen::<f64>().round();
            } else {
                row[rng.gen_range(0..classes)] = 1.0;
            }
        }

        Self::from_arrays(family, shape, features, labels)
    }

    /// Wrap existing arrays, checking that they agree with `shape` and `family`.
    pub fn from_arrays(
        family: ModelFamily,
        shape: SampleShape,
        features: Array2<f64>,
        labels: Array2<f64>,
    ) -> Result<Self> {
        if features.ncols() != shape.len() {
            return Err(VizError::ShapeMismatch {
                expected: shape.len(),
                actual: features.ncols(),
            });
        }
        if labels.ncols() != family.num_classes() {
            return Err(VizError::ShapeMismatch {
                expected: family.num_classes(),
                actual: labels.ncols(),
            });
        }
        if labels.nrows() != features.nrows() {
            return Err(VizError::ShapeMismatch {
                expected: features.nrows(),
                actual: labels.nrows(),
            });
        }
        Ok(Self {
            family,
            shape,
            features,
            labels,
        })
    }

    /// Family the samples were generated for.
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Shape of one sample before flattening.
    pub fn sample_shape(&self) -> SampleShape {
        self.shape
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// True when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened features, one row per sample.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Labels: one column for binary families, one-hot rows otherwise.
    pub fn labels(&self) -> ArrayView2<'_, f64> {
        self.labels.view()
    }

    /// Shuffle and split into `(features, labels)` mini-batches.
    ///
    /// The last batch holds the remainder and may be smaller.
    pub fn shuffled_batches<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Vec<(Array2<f64>, Array2<f64>)> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        order
            .chunks(batch_size.max(1))
            .map(|idx| {
                (
                    self.features.select(Axis(0), idx),
                    self.labels.select(Axis(0), idx),
                )
            })
            .collect()
    }
}
