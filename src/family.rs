//! Model families offered by the playground.
//!
//! A [`ModelFamily`] is a closed set: once a selection has been parsed there is no
//! "unknown family" case left to handle. Strings only appear at the input
//! boundary ([`FromStr`], serde), which reports unknown names as
//! [`VizError::InvalidTopology`].

use crate::{Result, VizError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three supported model archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ModelFamily {
    /// Multi-layer perceptron over flat feature vectors
    FullyConnected,
    /// Convolutional network over 28x28 grayscale images
    Convolutional,
    /// Simple recurrent network over 20-step sequences
    Recurrent,
}

impl ModelFamily {
    /// All families in selector order.
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::FullyConnected,
        ModelFamily::Convolutional,
        ModelFamily::Recurrent,
    ];

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            ModelFamily::FullyConnected => "fully_connected",
            ModelFamily::Convolutional => "convolutional",
            ModelFamily::Recurrent => "recurrent",
        }
    }

    /// Short label used in log lines ("Training MLP model...").
    pub fn short_label(self) -> &'static str {
        match self {
            ModelFamily::FullyConnected => "MLP",
            ModelFamily::Convolutional => "CNN",
            ModelFamily::Recurrent => "RNN",
        }
    }

    /// Number of output classes of the family's synthetic task.
    ///
    /// Binary tasks use a single sigmoid output.
    pub fn num_classes(self) -> usize {
        match self {
            ModelFamily::Convolutional => 10,
            ModelFamily::FullyConnected | ModelFamily::Recurrent => 1,
        }
    }

    /// Descriptive copy shown next to the selector.
    pub fn info(self) -> &'static ModelInfo {
        match self {
            ModelFamily::FullyConnected => &MLP_INFO,
            ModelFamily::Convolutional => &CNN_INFO,
            ModelFamily::Recurrent => &RNN_INFO,
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelFamily {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fully_connected" | "mlp" => Ok(ModelFamily::FullyConnected),
            "convolutional" | "cnn" => Ok(ModelFamily::Convolutional),
            "recurrent" | "rnn" => Ok(ModelFamily::Recurrent),
            other => Err(VizError::InvalidTopology(format!(
                "unknown model family '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ModelFamily {
    type Error = VizError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModelFamily> for &'static str {
    fn from(family: ModelFamily) -> Self {
        family.name()
    }
}

/// Static description of a model family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub details: &'static [&'static str],
    /// Architecture choices that the sliders do not change
    pub preset_parameters: &'static [&'static str],
    /// Parameters exposed as sliders
    pub variable_parameters: &'static [&'static str],
}

static MLP_INFO: ModelInfo = ModelInfo {
    title: "Multi-Layer Perceptron (MLP)",
    description: "A fully connected neural network suited to tabular and structured data. \
                  Every neuron in one layer feeds every neuron in the next.",
    details: &[
        "Fully connected layers: each neuron connects to every neuron in the next layer.",
        "ReLU activation: introduces non-linearity in the hidden layers.",
        "Best for: structured/tabular data and simple classification tasks.",
        "Downside: no notion of spatial or temporal structure.",
    ],
    preset_parameters: &[
        "Input shape: vector of length 10",
        "Output activation: sigmoid (binary classification)",
    ],
    variable_parameters: &[
        "Hidden units: width of the first hidden layer",
        "Learning rate: optimizer step size",
        "Batch size: samples per gradient step",
        "Epochs: passes over the training set",
    ],
};

static CNN_INFO: ModelInfo = ModelInfo {
    title: "Convolutional Neural Network (CNN)",
    description: "A network specialised for images. It learns spatial feature detectors \
                  and combines them into class scores.",
    details: &[
        "Feature detectors: learn local patterns such as edges and textures.",
        "Downsampling: reduces dimensionality while keeping salient features.",
        "Best for: image recognition and feature extraction.",
        "Downside: more computationally intensive than an MLP.",
    ],
    preset_parameters: &[
        "Input shape: 28x28x1 grayscale image",
        "Output activation: softmax over 10 classes",
    ],
    variable_parameters: &[
        "Filters: number of feature detectors (the diagram shows filters x 4 units)",
        "Learning rate: optimizer step size",
        "Batch size: samples per gradient step",
        "Epochs: passes over the training set",
    ],
};

static RNN_INFO: ModelInfo = ModelInfo {
    title: "Recurrent Neural Network (RNN)",
    description: "A sequence model that carries a hidden state from one time step \
                  to the next.",
    details: &[
        "Sequential processing: past inputs influence later outputs through the hidden state.",
        "Useful for: time series, speech and text.",
        "Downside: struggles with long-term dependencies (vanishing gradients).",
    ],
    preset_parameters: &[
        "Input shape: 20 time steps x 10 features",
        "Output activation: sigmoid (binary classification)",
    ],
    variable_parameters: &[
        "Hidden units: size of the recurrent state",
        "Learning rate: optimizer step size",
        "Batch size: sequences per gradient step",
        "Epochs: passes over the training set",
    ],
};
