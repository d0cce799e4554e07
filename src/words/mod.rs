use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;
use std::fmt;

static WORDS_DIR: Dir = include_dir!("src/words");

/// One linguistic layer and the words belonging to it.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub words: Vec<String>,
}

/// The full word catalog for a game, grouped by layer. Layer order is the
/// order in the dataset file and stays fixed for the session.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WordSet {
    pub layers: Vec<Layer>,
}

#[derive(Debug)]
pub struct UnknownDataset(pub String);

impl fmt::Display for UnknownDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown word dataset: {}", self.0)
    }
}

impl Error for UnknownDataset {}

impl WordSet {
    /// Loads an embedded dataset by name (e.g. "hebrew" -> hebrew.json).
    pub fn load(name: &str) -> Result<Self, Box<dyn Error>> {
        let file = WORDS_DIR
            .get_file(format!("{}.json", name))
            .ok_or_else(|| UnknownDataset(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| UnknownDataset(name.to_string()))?;
        Ok(from_str(contents)?)
    }

    /// Builds a catalog from literal (layer, words) pairs. Used by tests and
    /// headless runs.
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        Self {
            layers: pairs
                .iter()
                .map(|(name, words)| Layer {
                    name: name.to_string(),
                    words: words.iter().map(|w| w.to_string()).collect(),
                })
                .collect(),
        }
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Count of distinct words across all layers. A word listed under two
    /// layers counts once; the seen set tracks words, not (word, layer) pairs.
    pub fn unique_word_count(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|l| l.words.iter())
            .unique()
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.words.is_empty())
    }
}
