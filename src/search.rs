use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::{Dataset, Freqs, Network, Result, TrainReport, Trainer, TrainingConfig};

/// The outcome of training at one step size.
#[derive(Debug, Clone)]
pub struct Trial {
    pub step_size: f64,
    pub network: Network,
    pub cross_score: f64,
    pub training_score: f64,
    pub report: TrainReport,
}

/// Trains a network for `corpus` with the default configuration.
///
/// # Arguments
/// * `corpus` - The samples of every label.
/// * `rng` - The source of every trial's initial weights.
///
/// # Returns
/// The best network found, `None` if every step size diverged, or an error if the
/// corpus is empty.
pub fn train<R: Rng + ?Sized>(
    corpus: BTreeMap<String, Vec<Freqs>>,
    rng: &mut R,
) -> Result<Option<Network>> {
    let best = train_with_config(corpus, &TrainingConfig::default(), rng)?;
    Ok(best.map(|trial| trial.network))
}

/// Trains a network for `corpus`, trying every step size `2^p` for `p` in
/// `config.step_powers()`.
///
/// # Returns
/// The best trial, `None` if every step size diverged, or an error if the config
/// is invalid or the corpus is empty.
pub fn train_with_config<R: Rng + ?Sized>(
    corpus: BTreeMap<String, Vec<Freqs>>,
    config: &TrainingConfig,
    rng: &mut R,
) -> Result<Option<Trial>> {
    config.validate()?;
    let dataset = Dataset::with_cross_fraction(corpus, config.cross_fraction)?;
    Ok(search(&dataset, config, rng))
}

/// Runs one trial per step size and keeps the best.
///
/// Trials run in parallel. Each one draws its weights from its own generator,
/// seeded from `rng` in step-size order, so a seeded `rng` gives the same result
/// regardless of scheduling.
pub fn search<R: Rng + ?Sized>(
    dataset: &Dataset,
    config: &TrainingConfig,
    rng: &mut R,
) -> Option<Trial> {
    info!(
        labels = dataset.labels().len(),
        tokens = dataset.tokens().len(),
        training = dataset.training_len(),
        cross = dataset.cross_len();
        "searching step sizes 2^{}..2^{}",
        config.min_step_power,
        config.max_step_power
    );

    let seeded: Vec<(i32, u64)> = config
        .step_powers()
        .map(|power| (power, rng.random()))
        .collect();

    let trials: Vec<Trial> = seeded
        .into_par_iter()
        .map(|(power, seed)| run_trial(dataset, config, 2f64.powi(power), seed))
        .collect();

    let best = select_best(trials);
    match &best {
        Some(trial) => info!(
            step_size = trial.step_size,
            cross = trial.cross_score,
            training = trial.training_score;
            "selected network"
        ),
        None => warn!("every step size diverged"),
    }

    best
}

fn run_trial(dataset: &Dataset, config: &TrainingConfig, step_size: f64, seed: u64) -> Trial {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut trainer = Trainer::with_config(dataset, step_size, config, &mut rng);
    let report = trainer.train(config.max_epochs);
    let network = trainer.into_network();

    let (cross_score, training_score) = if network.contains_nan() {
        (f64::NAN, f64::NAN)
    } else {
        (dataset.cross_score(&network), dataset.training_score(&network))
    };

    debug!(
        step_size = step_size,
        epochs = report.epochs,
        cross = cross_score,
        training = training_score;
        "trial finished: {:?}",
        report.stop
    );

    Trial {
        step_size,
        network,
        cross_score,
        training_score,
        report,
    }
}

/// Folds trials, in the given order, into the best one.
///
/// Diverged networks are skipped. A trial replaces the current best if its
/// cross-validation score is higher, or equal with a training score at least as
/// high, so full ties go to the later trial.
pub fn select_best<I>(trials: I) -> Option<Trial>
where
    I: IntoIterator<Item = Trial>,
{
    trials.into_iter().fold(None, |best, trial| {
        if trial.network.contains_nan() {
            debug!(step_size = trial.step_size; "discarding diverged trial");
            return best;
        }

        match best {
            Some(b)
                if trial.cross_score < b.cross_score
                    || (trial.cross_score == b.cross_score
                        && trial.training_score < b.training_score) =>
            {
                Some(b)
            }
            _ => Some(trial),
        }
    })
}
