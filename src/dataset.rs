use std::collections::{BTreeMap, BTreeSet};

use crate::{config::CROSS_FRACTION, Freqs, NetErr, Network, Result};

/// Labeled samples split into a training subset and a cross-validation subset.
///
/// The split is per label: the last `floor(n * cross_fraction)` samples of a label
/// are held out, the rest are trained on. A label always keeps at least one
/// training sample. The dataset never changes after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    training: BTreeMap<String, Vec<Freqs>>,
    cross: BTreeMap<String, Vec<Freqs>>,
    tokens: Vec<String>,
    labels: Vec<String>,
}

impl Dataset {
    /// Creates a new `Dataset` holding out the default share of every label.
    ///
    /// # Arguments
    /// * `corpus` - The samples of every label.
    ///
    /// # Returns
    /// The dataset, or `NetErr::EmptyCorpus` if there is no sample at all.
    pub fn new(corpus: BTreeMap<String, Vec<Freqs>>) -> Result<Self> {
        Self::with_cross_fraction(corpus, CROSS_FRACTION)
    }

    /// Creates a new `Dataset` holding out `cross_fraction` of every label.
    ///
    /// # Arguments
    /// * `corpus` - The samples of every label. Labels without samples are dropped.
    /// * `cross_fraction` - The share of every label kept for cross-validation, in `[0, 1)`.
    ///
    /// # Returns
    /// The dataset, or an error if the fraction is out of range or there is no sample.
    pub fn with_cross_fraction(
        corpus: BTreeMap<String, Vec<Freqs>>,
        cross_fraction: f64,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&cross_fraction) {
            return Err(NetErr::InvalidConfig(format!(
                "cross_fraction must be in [0, 1), got {cross_fraction}"
            )));
        }

        let mut training = BTreeMap::new();
        let mut cross = BTreeMap::new();
        let mut tokens = BTreeSet::new();

        for (label, mut samples) in corpus {
            if samples.is_empty() {
                continue;
            }

            for sample in &samples {
                tokens.extend(sample.tokens().map(str::to_owned));
            }

            let n = samples.len();
            let held_out = ((n as f64 * cross_fraction).floor() as usize).min(n - 1);
            let held = samples.split_off(n - held_out);

            cross.insert(label.clone(), held);
            training.insert(label, samples);
        }

        if training.is_empty() {
            return Err(NetErr::EmptyCorpus);
        }

        Ok(Self {
            labels: training.keys().cloned().collect(),
            tokens: tokens.into_iter().collect(),
            training,
            cross,
        })
    }

    /// Every token present in any sample, sorted.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Every label with at least one sample, sorted.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn training_samples(&self, label: &str) -> &[Freqs] {
        self.training.get(label).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn cross_samples(&self, label: &str) -> &[Freqs] {
        self.cross.get(label).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn training_len(&self) -> usize {
        self.training.values().map(Vec::len).sum()
    }

    pub fn cross_len(&self) -> usize {
        self.cross.values().map(Vec::len).sum()
    }

    /// Share of the cross-validation samples `net` classifies correctly.
    pub fn cross_score(&self, net: &Network) -> f64 {
        accuracy(net, &self.cross)
    }

    /// Share of the training samples `net` classifies correctly.
    pub fn training_score(&self, net: &Network) -> f64 {
        accuracy(net, &self.training)
    }
}

/// An empty subset scores `0.0`.
fn accuracy(net: &Network, subset: &BTreeMap<String, Vec<Freqs>>) -> f64 {
    let mut total = 0;
    let mut correct = 0;

    for (label, samples) in subset {
        total += samples.len();
        correct += samples
            .iter()
            .filter(|s| net.classify(s) == Some(label.as_str()))
            .count();
    }

    if total == 0 {
        return 0.0;
    }

    correct as f64 / total as f64
}
