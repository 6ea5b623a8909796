use ndarray::{linalg, s, Array1, Array2, Axis};

use crate::{
    activation::sigmoid_prime,
    network::{Activations, Network},
    Freqs,
};

/// Computes per-sample partial derivatives of the squared error
/// `0.5 * sum((o - t)^2)` against a one-hot target, by backpropagation.
///
/// The partial matrices mirror the shapes of the network it was created for and
/// are overwritten by every `compute` call. Using it with a network of any other
/// shape is a programming error and panics.
#[derive(Debug, Clone)]
pub struct GradientCalc {
    pub hidden_partials: Array2<f64>,
    pub output_partials: Array2<f64>,

    // Forward metadata
    acts: Activations,

    // Backward metadata
    output_delta: Array1<f64>,
    hidden_delta: Array1<f64>,
}

impl GradientCalc {
    /// Creates a new `GradientCalc` shaped after `net`.
    pub fn new(net: &Network) -> Self {
        Self {
            hidden_partials: Array2::zeros(net.hidden_weights().dim()),
            output_partials: Array2::zeros(net.output_weights().dim()),
            acts: Activations::new(net),
            output_delta: Array1::zeros(net.labels().len()),
            hidden_delta: Array1::zeros(net.hidden_count()),
        }
    }

    /// Computes the gradient for one sample.
    ///
    /// # Arguments
    /// * `net` - The network being trained.
    /// * `sample` - The input frequencies.
    /// * `label_index` - The index of the sample's true label in `net.labels()`.
    ///
    /// # Panics
    /// If `net` does not have the shape this calculator was created for, or if
    /// `label_index` is out of bounds.
    pub fn compute(&mut self, net: &Network, sample: &Freqs, label_index: usize) {
        assert_eq!(
            self.hidden_partials.dim(),
            net.hidden_weights().dim(),
            "hidden partials do not match the network"
        );
        assert_eq!(
            self.output_partials.dim(),
            net.output_weights().dim(),
            "output partials do not match the network"
        );
        assert!(
            label_index < self.output_delta.len(),
            "label index {label_index} out of bounds"
        );

        net.forward(sample, &mut self.acts);
        let acts = &self.acts;

        for (c, (d, (&o, &z))) in self
            .output_delta
            .iter_mut()
            .zip(acts.output.iter().zip(&acts.output_z))
            .enumerate()
        {
            let target = if c == label_index { 1. } else { 0. };
            *d = (o - target) * sigmoid_prime(z);
        }

        linalg::general_mat_mul(
            1.,
            &self.output_delta.view().insert_axis(Axis(1)),
            &acts.hidden.view().insert_axis(Axis(0)),
            0.,
            &mut self.output_partials,
        );

        // The bias column of the output layer does not feed back into the hidden layer.
        let n_hidden = self.hidden_delta.len();
        linalg::general_mat_vec_mul(
            1.,
            &net.output_weights().slice(s![.., ..n_hidden]).t(),
            &self.output_delta,
            0.,
            &mut self.hidden_delta,
        );
        self.hidden_delta
            .zip_mut_with(&acts.hidden_z, |d, &z| *d *= sigmoid_prime(z));

        linalg::general_mat_mul(
            1.,
            &self.hidden_delta.view().insert_axis(Axis(1)),
            &acts.input.view().insert_axis(Axis(0)),
            0.,
            &mut self.hidden_partials,
        );
    }

    /// Scales both partial matrices so that, taken as one vector, they have unit
    /// Euclidean norm. An all-zero gradient is left untouched.
    ///
    /// Partials are divided by their largest magnitude before squaring, so
    /// saturated units with partials near `1e-170` still get a unit step.
    pub fn normalize(&mut self) {
        let max = self
            .hidden_partials
            .iter()
            .chain(&self.output_partials)
            .fold(0., |m: f64, p| m.max(p.abs()));

        if max == 0. {
            return;
        }

        let sum: f64 = self
            .hidden_partials
            .iter()
            .chain(&self.output_partials)
            .map(|p| (p / max).powi(2))
            .sum();

        let norm = sum.sqrt();
        self.hidden_partials.mapv_inplace(|p| p / max / norm);
        self.output_partials.mapv_inplace(|p| p / max / norm);
    }
}
