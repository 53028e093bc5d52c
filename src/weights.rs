//! Edge weights observed from the trainer and the resolver that fills the gaps.
//!
//! Every drawn edge is addressed by a three-part [`WeightKey`]
//! `(source_layer, source_neuron, dest_neuron)`. Trainers report flattened
//! weight tensors; [`WeightMap::from_flat`] is the one place where a flat index
//! is translated into that key scheme.
//!
//! # Placeholder weights
//!
//! Edges without an observed weight are drawn with a pseudo-random placeholder
//! in `[-1.0, 1.0]`. Placeholders are purely cosmetic: they say nothing about
//! the trained parameters. Under [`FallbackPolicy::Resample`] a fresh value is
//! drawn on every render pass, so unresolved edges visibly flicker between
//! epochs; [`FallbackPolicy::Pinned`] keeps each placeholder stable until the
//! next topology change.

use crate::{LayerWidths, Result, VizError};
use ndarray::ArrayView2;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identity of one directed edge between adjacent layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeightKey {
    pub source_layer: usize,
    pub source_neuron: usize,
    pub dest_neuron: usize,
}

impl WeightKey {
    /// Key of the edge `source_layer:source_neuron -> source_layer+1:dest_neuron`.
    pub const fn new(source_layer: usize, source_neuron: usize, dest_neuron: usize) -> Self {
        Self {
            source_layer,
            source_neuron,
            dest_neuron,
        }
    }
}

impl fmt::Display for WeightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.source_layer, self.source_neuron, self.dest_neuron
        )
    }
}

impl FromStr for WeightKey {
    type Err = VizError;

    /// Parse the textual `"layer-source-dest"` form.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || VizError::InvalidTopology(format!("malformed weight key '{}'", s));

        let mut parts = s.split('-').map(|p| p.trim().parse::<usize>());
        let key = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(l)), Some(Ok(src)), Some(Ok(dst)), None) => WeightKey::new(l, src, dst),
            _ => return Err(invalid()),
        };
        Ok(key)
    }
}

impl Serialize for WeightKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeightKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Round to the two decimals shown in the diagram.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Partial mapping from edge to observed weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap(HashMap<WeightKey, f64>);

impl WeightMap {
    /// Empty map; every edge falls back to a placeholder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observed weight, returning the previous one.
    pub fn insert(&mut self, key: WeightKey, value: f64) -> Option<f64> {
        self.0.insert(key, value)
    }

    #[inline]
    pub fn get(&self, key: &WeightKey) -> Option<f64> {
        self.0.get(key).copied()
    }

    #[inline]
    pub fn contains(&self, key: &WeightKey) -> bool {
        self.0.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over observed `(key, weight)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&WeightKey, &f64)> {
        self.0.iter()
    }

    /// Merge another map into this one; `other` wins on conflicts.
    pub fn extend(&mut self, other: WeightMap) {
        self.0.extend(other.0);
    }

    /// Translate a flattened row-major `[inputs, outputs]` weight tensor.
    ///
    /// Flat index `j` maps to `(source_neuron, dest_neuron) = (j / outputs, j % outputs)`.
    /// Values are rounded to two decimals. Entries outside the drawn diagram
    /// (the trainer may have more inputs than the diagram shows) are dropped.
    pub fn from_flat<I>(
        source_layer: usize,
        values: I,
        inputs: usize,
        outputs: usize,
        widths: &LayerWidths,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut map = WeightMap::new();
        if outputs == 0 || source_layer + 1 >= widths.num_layers() {
            return Ok(map);
        }

        let drawn_sources = widths[source_layer];
        let drawn_dests = widths[source_layer + 1];

        let mut count = 0;
        for (j, value) in values.into_iter().enumerate() {
            count += 1;
            let (src, dst) = (j / outputs, j % outputs);
            if src < drawn_sources && dst < drawn_dests && value.is_finite() {
                map.insert(WeightKey::new(source_layer, src, dst), round2(value));
            }
        }

        if count != inputs * outputs {
            return Err(VizError::ShapeMismatch {
                expected: inputs * outputs,
                actual: count,
            });
        }
        Ok(map)
    }

    /// Translate a dense-layer kernel of shape `[inputs, outputs]`.
    pub fn from_dense_kernel(
        source_layer: usize,
        kernel: ArrayView2<f64>,
        widths: &LayerWidths,
    ) -> Result<Self> {
        let (inputs, outputs) = kernel.dim();
        Self::from_flat(source_layer, kernel.iter().copied(), inputs, outputs, widths)
    }
}

impl FromIterator<(WeightKey, f64)> for WeightMap {
    fn from_iter<T: IntoIterator<Item = (WeightKey, f64)>>(iter: T) -> Self {
        WeightMap(iter.into_iter().collect())
    }
}

/// How edges without an observed weight are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Fresh placeholder on every render pass (edges flicker)
    #[default]
    Resample,
    /// Placeholder remembered until the next topology change
    Pinned,
}

/// Draw a placeholder weight: uniform in `[-1.0, 1.0]`, rounded to 2 decimals.
#[inline]
pub fn placeholder_weight<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    round2(rng.gen_range(-1.0..=1.0))
}

/// Observed weight for `key`, or a fresh placeholder.
///
/// Never fails. A present key always yields its stored value.
pub fn resolve<R: Rng + ?Sized>(weights: &WeightMap, key: WeightKey, rng: &mut R) -> f64 {
    match weights.get(&key) {
        Some(value) => value,
        None => placeholder_weight(rng),
    }
}

/// Memoized placeholders for [`FallbackPolicy::Pinned`].
#[derive(Debug, Clone, Default)]
pub struct PlaceholderCache {
    values: HashMap<WeightKey, f64>,
}

impl PlaceholderCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed weight for `key`, or the pinned placeholder (drawn on first use).
    pub fn resolve<R: Rng + ?Sized>(&mut self, weights: &WeightMap, key: WeightKey, rng: &mut R) -> f64 {
        match weights.get(&key) {
            Some(value) => value,
            None => *self
                .values
                .entry(key)
                .or_insert_with(|| placeholder_weight(rng)),
        }
    }

    /// Forget every pinned placeholder.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of pinned placeholders.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been pinned yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_key_text_form() {
        let key = WeightKey::new(0, 3, 7);
        assert_eq!(key.to_string(), "0-3-7");
        assert_eq!("0-3-7".parse::<WeightKey>().unwrap(), key);
        assert!("0-3".parse::<WeightKey>().is_err());
        assert!("0-3-7-1".parse::<WeightKey>().is_err());
        assert!("a-b-c".parse::<WeightKey>().is_err());
    }

    #[test]
    fn test_weight_map_json() {
        let map: WeightMap = serde_json::from_str(r#"{"0-0-0": 0.85, "1-2-0": -0.1}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&WeightKey::new(0, 0, 0)), Some(0.85));
        assert_eq!(map.get(&WeightKey::new(1, 2, 0)), Some(-0.1));

        let json = serde_json::to_string(&map).unwrap();
        let restored: WeightMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, restored);
    }

    #[test]
    fn test_resolve_present_is_exact() {
        let mut map = WeightMap::new();
        map.insert(WeightKey::new(1, 1, 1), 0.42);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            assert_eq!(resolve(&map, WeightKey::new(1, 1, 1), &mut rng), 0.42);
        }
    }

    #[test]
    fn test_resolve_absent_in_range_and_rounded() {
        let map = WeightMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let w = resolve(&map, WeightKey::new(0, 0, 0), &mut rng);
            assert!((-1.0..=1.0).contains(&w));
            assert_eq!(w, round2(w));
        }
    }

    #[test]
    fn test_pinned_placeholders_are_stable() {
        let map = WeightMap::new();
        let mut cache = PlaceholderCache::new();
        let mut rng = StdRng::seed_from_u64(2);
        let key = WeightKey::new(0, 1, 2);
        let first = cache.resolve(&map, key, &mut rng);
        for _ in 0..20 {
            assert_eq!(cache.resolve(&map, key, &mut rng), first);
        }
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_from_flat_translates_indices() {
        let widths = LayerWidths::new(vec![2, 3, 1]).unwrap();
        // 2 inputs x 3 outputs, row-major
        let flat = vec![0.111, 0.2, 0.3, 0.4, 0.5, 0.666];
        let map = WeightMap::from_flat(0, flat, 2, 3, &widths).unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map.get(&WeightKey::new(0, 0, 0)), Some(0.11));
        assert_eq!(map.get(&WeightKey::new(0, 0, 2)), Some(0.3));
        assert_eq!(map.get(&WeightKey::new(0, 1, 0)), Some(0.4));
        assert_eq!(map.get(&WeightKey::new(0, 1, 2)), Some(0.67));
    }

    #[test]
    fn test_from_dense_kernel_drops_undrawn_entries() {
        let widths = LayerWidths::new(vec![2, 2]).unwrap();
        let kernel = array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]];
        let map = WeightMap::from_dense_kernel(0, kernel.view(), &widths).unwrap();
        assert_eq!(map.len(), 4);
        assert!(!map.contains(&WeightKey::new(0, 2, 0)));

        // No layer after the output layer
        let map = WeightMap::from_dense_kernel(1, kernel.view(), &widths).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_from_flat_shape_mismatch() {
        let widths = LayerWidths::new(vec![2, 2]).unwrap();
        let err = WeightMap::from_flat(0, vec![0.1, 0.2, 0.3], 2, 2, &widths).unwrap_err();
        assert!(matches!(err, VizError::ShapeMismatch { expected: 4, actual: 3 }));
    }
}
