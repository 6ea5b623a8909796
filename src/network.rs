use std::{fs, path::Path};

use ndarray::{linalg, s, Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{activation::sigmoid, Freqs, NetErr, Result};

/// A two-layer feed-forward classifier.
///
/// Both weight matrices carry their bias in the last column:
/// * `hidden_weights` has shape `(hidden_count, tokens.len() + 1)`,
/// * `output_weights` has shape `(labels.len(), hidden_count + 1)`.
///
/// Cloning a `Network` deep-copies both matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    tokens: Vec<String>,
    labels: Vec<String>,
    hidden_weights: Array2<f64>,
    output_weights: Array2<f64>,
}

impl Network {
    /// Creates a new `Network` from its parts.
    ///
    /// # Arguments
    /// * `tokens` - The input vocabulary, in column order.
    /// * `labels` - The output labels, in row order.
    /// * `hidden_weights` - The hidden layer weights, bias in the last column.
    /// * `output_weights` - The output layer weights, bias in the last column.
    ///
    /// # Returns
    /// The network, or `NetErr::ShapeMismatch` if the matrices do not agree with the
    /// vocabulary, the labels or each other.
    pub fn new(
        tokens: Vec<String>,
        labels: Vec<String>,
        hidden_weights: Array2<f64>,
        output_weights: Array2<f64>,
    ) -> Result<Self> {
        let net = Self {
            tokens,
            labels,
            hidden_weights,
            output_weights,
        };
        net.validate()?;
        Ok(net)
    }

    /// Creates a new `Network` with every weight drawn uniformly from `[-1, 1]`.
    ///
    /// # Arguments
    /// * `tokens` - The input vocabulary, in column order.
    /// * `labels` - The output labels, in row order.
    /// * `hidden_count` - The amount of hidden units.
    /// * `rng` - The source of the initial weights.
    pub fn random<R: Rng + ?Sized>(
        tokens: Vec<String>,
        labels: Vec<String>,
        hidden_count: usize,
        rng: &mut R,
    ) -> Self {
        let hidden_dim = (hidden_count, tokens.len() + 1);
        let output_dim = (labels.len(), hidden_count + 1);

        let hidden_weights =
            Array2::from_shape_simple_fn(hidden_dim, || rng.random_range(-1.0..=1.0));
        let output_weights =
            Array2::from_shape_simple_fn(output_dim, || rng.random_range(-1.0..=1.0));

        Self {
            tokens,
            labels,
            hidden_weights,
            output_weights,
        }
    }

    /// Reads a network saved with `Network::save`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let net: Self = serde_json::from_str(raw)?;
        net.validate()?;
        Ok(net)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden_weights.nrows()
    }

    pub fn hidden_weights(&self) -> &Array2<f64> {
        &self.hidden_weights
    }

    pub fn output_weights(&self) -> &Array2<f64> {
        &self.output_weights
    }

    pub fn hidden_weights_mut(&mut self) -> &mut Array2<f64> {
        &mut self.hidden_weights
    }

    pub fn output_weights_mut(&mut self) -> &mut Array2<f64> {
        &mut self.output_weights
    }

    /// Returns `true` if any weight is NaN or infinite.
    pub fn contains_nan(&self) -> bool {
        self.hidden_weights
            .iter()
            .chain(&self.output_weights)
            .any(|w| !w.is_finite())
    }

    /// Computes the output layer's activations for `sample`, one per label.
    pub fn outputs(&self, sample: &Freqs) -> Array1<f64> {
        let mut acts = Activations::new(self);
        self.forward(sample, &mut acts);
        acts.output
    }

    /// Returns the label whose output unit is the most active for `sample`.
    ///
    /// Ties go to the label that comes first. Only a network without labels
    /// returns `None`.
    pub fn classify(&self, sample: &Freqs) -> Option<&str> {
        let outputs = self.outputs(sample);
        let mut best: Option<(usize, f64)> = None;

        for (i, &o) in outputs.iter().enumerate() {
            if best.is_none_or(|(_, b)| o > b) {
                best = Some((i, o));
            }
        }

        best.map(|(i, _)| self.labels[i].as_str())
    }

    /// Runs the forward pass, leaving every intermediate value in `acts`.
    pub(crate) fn forward(&self, sample: &Freqs, acts: &mut Activations) {
        let n_tokens = self.tokens.len();
        let n_hidden = self.hidden_count();

        for (x, token) in acts.input.iter_mut().zip(&self.tokens) {
            *x = sample.get(token);
        }
        acts.input[n_tokens] = 1.;

        linalg::general_mat_vec_mul(
            1.,
            &self.hidden_weights,
            &acts.input,
            0.,
            &mut acts.hidden_z,
        );
        acts.hidden
            .slice_mut(s![..n_hidden])
            .zip_mut_with(&acts.hidden_z, |a, &z| *a = sigmoid(z));
        acts.hidden[n_hidden] = 1.;

        linalg::general_mat_vec_mul(
            1.,
            &self.output_weights,
            &acts.hidden,
            0.,
            &mut acts.output_z,
        );
        acts.output
            .zip_mut_with(&acts.output_z, |a, &z| *a = sigmoid(z));
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            (
                "hidden weight columns",
                self.hidden_weights.ncols(),
                self.tokens.len() + 1,
            ),
            (
                "output weight rows",
                self.output_weights.nrows(),
                self.labels.len(),
            ),
            (
                "output weight columns",
                self.output_weights.ncols(),
                self.hidden_weights.nrows() + 1,
            ),
        ];

        for (what, got, expected) in checks {
            if got != expected {
                return Err(NetErr::ShapeMismatch {
                    what,
                    got,
                    expected,
                });
            }
        }

        Ok(())
    }
}

/// Forward pass buffers. The input and hidden vectors carry a trailing `1.0`
/// feeding the bias column.
#[derive(Debug, Clone)]
pub(crate) struct Activations {
    pub input: Array1<f64>,
    pub hidden_z: Array1<f64>,
    pub hidden: Array1<f64>,
    pub output_z: Array1<f64>,
    pub output: Array1<f64>,
}

impl Activations {
    pub fn new(net: &Network) -> Self {
        let n_hidden = net.hidden_count();
        let n_labels = net.labels.len();

        Self {
            input: Array1::zeros(net.tokens.len() + 1),
            hidden_z: Array1::zeros(n_hidden),
            hidden: Array1::zeros(n_hidden + 1),
            output_z: Array1::zeros(n_labels),
            output: Array1::zeros(n_labels),
        }
    }
}
