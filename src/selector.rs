//! Word selection: a two-stage uniform draw, first over layers that still
//! have unseen words, then over that layer's unseen words. Layers with few
//! remaining words are therefore over-represented per word relative to a
//! flat draw; this matches the shipped game's behavior and is covered by
//! tests, so keep the two stages separate.

use crate::words::{Layer, WordSet};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// A word drawn for display, paired with the layer it was drawn from (the
/// correct answer).
#[derive(Clone, Debug, PartialEq)]
pub struct Drawn {
    pub word: String,
    pub layer: String,
}

/// Layers with at least one word not in `seen`, in catalog order.
pub fn available_layers<'a>(set: &'a WordSet, seen: &HashSet<String>) -> Vec<&'a Layer> {
    set.layers
        .iter()
        .filter(|layer| layer.words.iter().any(|w| !seen.contains(w)))
        .collect()
}

/// Uniform draw over the layer's unseen words.
pub fn pick_word<'a, R: Rng>(
    layer: &'a Layer,
    seen: &HashSet<String>,
    rng: &mut R,
) -> Option<&'a str> {
    let unseen: Vec<&String> = layer.words.iter().filter(|w| !seen.contains(*w)).collect();
    unseen.choose(rng).map(|w| w.as_str())
}

/// Draws the next word, or `None` when every word has been seen (pool
/// exhaustion). The selector never mutates `seen`; the caller records the
/// drawn word.
pub fn next_word<R: Rng>(set: &WordSet, seen: &HashSet<String>, rng: &mut R) -> Option<Drawn> {
    let layers = available_layers(set, seen);
    let layer = layers.choose(rng)?;
    let word = pick_word(layer, seen, rng)?;
    Some(Drawn {
        word: word.to_string(),
        layer: layer.name.clone(),
    })
}
