//! Integration tests for topology derivation.
//!
//! Covers the three families, the second-hidden-layer floor and the
//! string boundary for family names.

use neuroscope::{topology, Hyperparameters, LayerWidths, ModelFamily, Result, VizError};
use proptest::prelude::*;

#[test]
fn test_reference_topologies() -> Result<()> {
    let hp = Hyperparameters::default().with_hidden_units(32).with_filters(8);

    let mlp = topology::derive(ModelFamily::FullyConnected, &hp)?;
    assert_eq!(mlp.as_slice(), &[10, 32, 16, 1]);

    let cnn = topology::derive(ModelFamily::Convolutional, &hp)?;
    assert_eq!(cnn.as_slice(), &[784, 32, 64, 10]);

    let rnn = topology::derive(ModelFamily::Recurrent, &hp)?;
    assert_eq!(rnn.as_slice(), &[20, 32, 16, 1]);

    Ok(())
}

#[test]
fn test_hidden_unit_sweep() -> Result<()> {
    let expected_second = [(1, 4), (2, 4), (4, 4), (8, 4), (32, 16), (128, 64)];
    for (h, second) in expected_second {
        let hp = Hyperparameters::default().with_hidden_units(h);
        for family in [ModelFamily::FullyConnected, ModelFamily::Recurrent] {
            let widths = topology::derive(family, &hp)?;
            assert_eq!(widths[1], h);
            assert_eq!(widths[2], second, "family {} H={}", family, h);
        }
    }
    Ok(())
}

#[test]
fn test_family_names_at_the_boundary() {
    assert_eq!("mlp".parse::<ModelFamily>().unwrap(), ModelFamily::FullyConnected);
    assert_eq!("CNN".parse::<ModelFamily>().unwrap(), ModelFamily::Convolutional);
    assert_eq!("recurrent".parse::<ModelFamily>().unwrap(), ModelFamily::Recurrent);

    let err = "transformer".parse::<ModelFamily>().unwrap_err();
    assert!(matches!(err, VizError::InvalidTopology(_)));
}

#[test]
fn test_widths_json_round_trip() -> Result<()> {
    let widths = topology::derive(ModelFamily::Convolutional, &Hyperparameters::default())?;
    let json = serde_json::to_string(&widths)?;
    let restored: LayerWidths = serde_json::from_str(&json)?;
    assert_eq!(widths, restored);
    Ok(())
}

proptest! {
    #[test]
    fn prop_derivation_is_deterministic_and_valid(
        h in 1usize..=512,
        f in 1usize..=64,
        family_idx in 0usize..3,
    ) {
        let family = ModelFamily::ALL[family_idx];
        let hp = Hyperparameters::default().with_hidden_units(h).with_filters(f);
        let a = topology::derive(family, &hp).unwrap();
        let b = topology::derive(family, &hp).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.num_layers(), 4);
        prop_assert!(a.iter().all(|&w| w >= 1));
        prop_assert_eq!(a[a.num_layers() - 1], family.num_classes());
    }

    #[test]
    fn prop_second_hidden_floor(h in 1usize..=512) {
        let hp = Hyperparameters::default().with_hidden_units(h);
        let widths = topology::derive(ModelFamily::FullyConnected, &hp).unwrap();
        prop_assert_eq!(widths[2], std::cmp::max(4, h / 2));
    }
}
