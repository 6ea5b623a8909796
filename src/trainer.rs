use log::debug;
use rand::Rng;

use crate::{
    config::{HIDDEN_LAYER_SCALE, INITIAL_EPOCHS},
    Dataset, GradientCalc, Network, TrainingConfig,
};

/// Why `Trainer::train` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The epoch ceiling was reached.
    Ceiling,
    /// A weight became non-finite. The network is left diverged.
    Diverged,
    /// The cross-validation score dropped; the last snapshot was restored.
    Regressed,
    /// Neither score moved; the last snapshot was restored.
    Plateau,
}

/// Summary of a `Trainer::train` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainReport {
    /// Epochs run during the call, including any rolled back.
    pub epochs: usize,
    pub stop: StopReason,
    /// Cross-validation score after the initial block, if it was measured.
    pub initial_cross_score: Option<f64>,
}

/// Online gradient descent for one network and one step size.
///
/// The trainer owns its network until `into_network` hands it over.
pub struct Trainer<'d> {
    net: Network,
    dataset: &'d Dataset,
    grad: GradientCalc,
    step_size: f64,

    initial_epochs: usize,
    epochs: usize,
}

impl<'d> Trainer<'d> {
    /// Creates a new `Trainer` with a freshly randomized network.
    ///
    /// # Arguments
    /// * `dataset` - The samples to train and score with.
    /// * `step_size` - The length of every gradient step.
    /// * `rng` - The source of the initial weights.
    pub fn new<R: Rng + ?Sized>(dataset: &'d Dataset, step_size: f64, rng: &mut R) -> Self {
        Self::build(dataset, step_size, INITIAL_EPOCHS, HIDDEN_LAYER_SCALE, rng)
    }

    /// Creates a new `Trainer` taking the initial block length and the hidden layer
    /// scale from `config`.
    pub fn with_config<R: Rng + ?Sized>(
        dataset: &'d Dataset,
        step_size: f64,
        config: &TrainingConfig,
        rng: &mut R,
    ) -> Self {
        Self::build(
            dataset,
            step_size,
            config.initial_epochs,
            config.hidden_layer_scale,
            rng,
        )
    }

    fn build<R: Rng + ?Sized>(
        dataset: &'d Dataset,
        step_size: f64,
        initial_epochs: usize,
        hidden_layer_scale: f64,
        rng: &mut R,
    ) -> Self {
        assert!(
            step_size.is_finite() && step_size > 0.,
            "step size must be finite and > 0, got {step_size}"
        );

        let n_labels = dataset.labels().len();
        let hidden_count = (hidden_layer_scale * n_labels as f64).round() as usize;
        let net = Network::random(
            dataset.tokens().to_vec(),
            dataset.labels().to_vec(),
            hidden_count,
            rng,
        );

        Self {
            grad: GradientCalc::new(&net),
            net,
            dataset,
            step_size,
            initial_epochs,
            epochs: 0,
        }
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn into_network(self) -> Network {
        self.net
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Total epochs run by this trainer so far.
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Trains until cross-validation stops improving or `max_epochs` epochs ran.
    ///
    /// Epochs run in blocks that double the total each time, with both scores
    /// checked after every block. A block that lowers the cross-validation score,
    /// or leaves both scores unchanged, is rolled back.
    ///
    /// Divergence is detected through `Network::contains_nan`. Every step has the
    /// same length, so a runaway step size keeps pushing pre-activations outward
    /// until one falls below about `-709`. There `sigmoid_prime`, written as
    /// `e^{-z} / (1 + e^{-z})^2`, evaluates to `inf / inf`, and the NaN reaches
    /// the weights. Rewriting it as `s * (1 - s)` gives `0` there, and such runs
    /// would silently stall instead of being reported as `StopReason::Diverged`.
    pub fn train(&mut self, max_epochs: usize) -> TrainReport {
        let start = self.epochs;
        let report = |trainer: &Self, stop, initial_cross_score| TrainReport {
            epochs: trainer.epochs - start,
            stop,
            initial_cross_score,
        };

        let mut iters = self.initial_epochs.min(max_epochs);
        self.run_epochs(iters);
        if iters == max_epochs {
            return report(self, StopReason::Ceiling, None);
        }

        if self.net.contains_nan() {
            debug!(step_size = self.step_size, epochs = iters; "diverged");
            return report(self, StopReason::Diverged, None);
        }

        let initial_cross = self.dataset.cross_score(&self.net);
        let mut cross_score = initial_cross;
        let mut training_score = self.dataset.training_score(&self.net);
        let mut last_net = self.net.clone();

        loop {
            let block = iters.min(max_epochs - iters);
            self.run_epochs(block);
            iters += block;

            if self.net.contains_nan() {
                debug!(step_size = self.step_size, epochs = iters; "diverged");
                return report(self, StopReason::Diverged, Some(initial_cross));
            }

            let new_cross = self.dataset.cross_score(&self.net);
            let new_training = self.dataset.training_score(&self.net);
            debug!(
                step_size = self.step_size,
                epochs = iters,
                cross = new_cross,
                training = new_training;
                "block finished"
            );

            let stop = if new_cross < cross_score {
                Some(StopReason::Regressed)
            } else if new_cross == cross_score && new_training == training_score {
                Some(StopReason::Plateau)
            } else {
                None
            };

            if let Some(stop) = stop {
                self.net = last_net;
                debug!(step_size = self.step_size, epochs = iters; "rolled back: {stop:?}");
                return report(self, stop, Some(initial_cross));
            }

            cross_score = new_cross;
            training_score = new_training;

            if iters == max_epochs {
                return report(self, StopReason::Ceiling, Some(initial_cross));
            }
            last_net = self.net.clone();
        }
    }

    /// Runs one epoch: one gradient step per training sample, label by label in
    /// the network's label order, each label's samples in stored order.
    pub fn run_all_samples(&mut self) {
        let dataset = self.dataset;
        for label_index in 0..self.net.labels().len() {
            let label = &self.net.labels()[label_index];
            for sample in dataset.training_samples(label) {
                self.grad.compute(&self.net, sample, label_index);
                self.grad.normalize();

                let step = -self.step_size;
                self.net
                    .hidden_weights_mut()
                    .scaled_add(step, &self.grad.hidden_partials);
                self.net
                    .output_weights_mut()
                    .scaled_add(step, &self.grad.output_partials);
            }
        }

        self.epochs += 1;
    }

    fn run_epochs(&mut self, n: usize) {
        for _ in 0..n {
            self.run_all_samples();
        }
    }
}
