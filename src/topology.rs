//! Topology derivation: model family + hyperparameters to diagram layer widths.
//!
//! The derived widths describe the *illustrative* diagram, not the trainer's
//! tensors. The convolutional input layer, for example, is always drawn as the
//! flattened 28x28 image regardless of what the trainer consumes.

use crate::{Hyperparameters, ModelFamily, Result, VizError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Flattened input image size drawn for the convolutional family.
pub const INPUT_FEATURE_COUNT: usize = 28 * 28;

/// Input width drawn for the fully-connected family.
pub const FULLY_CONNECTED_INPUTS: usize = 10;

/// Input width (time steps) drawn for the recurrent family.
pub const RECURRENT_INPUTS: usize = 20;

/// Floor for the second hidden layer of the fully-connected and recurrent families.
pub const MIN_SECOND_HIDDEN: usize = 4;

/// Width of the dense layer following the convolutional block.
pub const CONVOLUTIONAL_DENSE_UNITS: usize = 64;

/// Ordered neuron counts, input layer first and output layer last.
///
/// Invariant: at least two layers, every layer at least one neuron.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct LayerWidths(Vec<usize>);

impl LayerWidths {
    /// Validate and wrap a width sequence.
    pub fn new(widths: Vec<usize>) -> Result<Self> {
        if widths.len() < 2 {
            return Err(VizError::InvalidTopology(format!(
                "expected at least 2 layers, found {}",
                widths.len()
            )));
        }
        if let Some(layer) = widths.iter().position(|&w| w == 0) {
            return Err(VizError::InvalidTopology(format!(
                "layer {} has zero neurons",
                layer
            )));
        }
        Ok(Self(widths))
    }

    /// Number of layers, including input and output.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.0.len()
    }

    /// Total neuron count across all layers.
    pub fn total_neurons(&self) -> usize {
        self.0.iter().sum()
    }

    /// Number of edges of the densely connected diagram.
    pub fn total_edges(&self) -> usize {
        self.0.windows(2).map(|pair| pair[0] * pair[1]).sum()
    }

    /// Widths, input layer first.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Deref for LayerWidths {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl TryFrom<Vec<usize>> for LayerWidths {
    type Error = VizError;

    fn try_from(widths: Vec<usize>) -> Result<Self> {
        Self::new(widths)
    }
}

impl From<LayerWidths> for Vec<usize> {
    fn from(widths: LayerWidths) -> Self {
        widths.0
    }
}

impl fmt::Display for LayerWidths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", w)?;
        }
        write!(f, "]")
    }
}

/// Derive the diagram layer widths for a family.
///
/// ```
/// use neuroscope::{topology, Hyperparameters, ModelFamily};
///
/// let hp = Hyperparameters::default().with_hidden_units(32);
/// let widths = topology::derive(ModelFamily::FullyConnected, &hp).unwrap();
/// assert_eq!(widths.as_slice(), &[10, 32, 16, 1]);
/// ```
pub fn derive(family: ModelFamily, hyperparameters: &Hyperparameters) -> Result<LayerWidths> {
    let widths = match family {
        ModelFamily::FullyConnected => {
            let h = hyperparameters.hidden_units;
            vec![FULLY_CONNECTED_INPUTS, h, second_hidden(h), 1]
        }
        ModelFamily::Convolutional => {
            let f = hyperparameters.filters;
            vec![INPUT_FEATURE_COUNT, f * 4, CONVOLUTIONAL_DENSE_UNITS, 10]
        }
        ModelFamily::Recurrent => {
            let h = hyperparameters.hidden_units;
            vec![RECURRENT_INPUTS, h, second_hidden(h), 1]
        }
    };
    LayerWidths::new(widths)
}

#[inline]
fn second_hidden(hidden_units: usize) -> usize {
    (hidden_units / 2).max(MIN_SECOND_HIDDEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_connected() {
        let hp = Hyperparameters::default().with_hidden_units(32);
        let widths = derive(ModelFamily::FullyConnected, &hp).unwrap();
        assert_eq!(widths.as_slice(), &[10, 32, 16, 1]);
        assert_eq!(widths.total_neurons(), 59);
    }

    #[test]
    fn test_second_hidden_floor() {
        let hp = Hyperparameters::default().with_hidden_units(5);
        let widths = derive(ModelFamily::Recurrent, &hp).unwrap();
        assert_eq!(widths.as_slice(), &[20, 5, 4, 1]);

        let hp = Hyperparameters::default().with_hidden_units(9);
        let widths = derive(ModelFamily::Recurrent, &hp).unwrap();
        assert_eq!(widths.as_slice(), &[20, 9, 4, 1]);
    }

    #[test]
    fn test_convolutional() {
        let hp = Hyperparameters::default().with_filters(8);
        let widths = derive(ModelFamily::Convolutional, &hp).unwrap();
        assert_eq!(widths.as_slice(), &[784, 32, 64, 10]);
        assert_eq!(widths.total_neurons(), 890);
        assert_eq!(widths.total_edges(), 784 * 32 + 32 * 64 + 64 * 10);
    }

    #[test]
    fn test_zero_width_rejected() {
        let hp = Hyperparameters::default().with_hidden_units(0);
        let err = derive(ModelFamily::FullyConnected, &hp).unwrap_err();
        assert!(matches!(err, VizError::InvalidTopology(_)));

        assert!(LayerWidths::new(vec![3]).is_err());
        assert!(LayerWidths::new(vec![3, 0, 1]).is_err());
    }

    #[test]
    fn test_display_and_serde() {
        let widths = LayerWidths::new(vec![2, 3, 1]).unwrap();
        assert_eq!(widths.to_string(), "[2, 3, 1]");
        assert_eq!(serde_json::to_string(&widths).unwrap(), "[2,3,1]");
        assert!(serde_json::from_str::<LayerWidths>("[2,0]").is_err());
    }
}
