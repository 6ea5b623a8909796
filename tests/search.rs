use std::collections::BTreeMap;

use lexnet::{search, Dataset, Freqs, StopReason, Trainer, TrainingConfig, Trial};
use rand::{rngs::StdRng, SeedableRng};

/// Two labels with disjoint vocabularies, frequencies normalized to unit sum.
fn separable_corpus(per_label: usize) -> BTreeMap<String, Vec<Freqs>> {
    let vocab = [("rust", ["fn", "let", "mut"]), ("lisp", ["(", ")", "defun"])];
    let mut corpus = BTreeMap::new();

    for (label, tokens) in vocab {
        let samples = (0..per_label)
            .map(|i| {
                let mut freqs: Freqs = tokens
                    .iter()
                    .enumerate()
                    .map(|(j, t)| (*t, 1. + ((i + 2 * j) % 4) as f64))
                    .collect();
                freqs.normalize();
                freqs
            })
            .collect();
        corpus.insert(label.to_owned(), samples);
    }

    corpus
}

/// Raw token counts over a shared vocabulary.
fn count_corpus() -> BTreeMap<String, Vec<Freqs>> {
    let mut corpus = BTreeMap::new();
    for (label, offset) in [("go", 0), ("c", 1), ("java", 2)] {
        let samples = (0..8)
            .map(|i| {
                ["{", "}", ";", "func", "int"]
                    .iter()
                    .enumerate()
                    .map(|(j, t)| (*t, (3 + (i + j * offset) % 7) as f64))
                    .collect::<Freqs>()
            })
            .collect();
        corpus.insert(label.to_owned(), samples);
    }

    corpus
}

fn trial(dataset: &Dataset, power: i32, seed: u64, config: &TrainingConfig) -> Trial {
    let step_size = 2f64.powi(power);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut trainer = Trainer::with_config(dataset, step_size, config, &mut rng);
    let report = trainer.train(config.max_epochs);
    let network = trainer.into_network();

    Trial {
        step_size,
        cross_score: dataset.cross_score(&network),
        training_score: dataset.training_score(&network),
        network,
        report,
    }
}

#[test]
fn separable_corpus_is_learned() {
    let mut rng = StdRng::seed_from_u64(2024);
    let net = search::train(separable_corpus(8), &mut rng)
        .unwrap()
        .expect("at least one step size converges");

    let dataset = Dataset::new(separable_corpus(8)).unwrap();
    assert!(!net.contains_nan());
    assert!(dataset.cross_score(&net) >= 0.9);

    let unseen: Freqs = [("defun", 0.5), ("(", 0.25), (")", 0.25)].into_iter().collect();
    assert_eq!(net.classify(&unseen), Some("lisp"));
}

#[test]
fn huge_step_size_diverges() {
    let dataset = Dataset::new(count_corpus()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let mut trainer = Trainer::new(&dataset, 2f64.powi(9), &mut rng);

    let report = trainer.train(lexnet::config::DEFAULT_MAX_EPOCHS);

    assert_eq!(report.stop, StopReason::Diverged);
    assert!(trainer.network().contains_nan());
}

#[test]
fn huge_step_size_diverges_on_normalized_samples() {
    let config = TrainingConfig::default();
    let dataset = Dataset::new(separable_corpus(8)).unwrap();
    let mut diverged = 0;

    for seed in 0..6 {
        let small = trial(&dataset, -10, seed, &config);
        let huge = trial(&dataset, 9, seed, &config);
        assert!(!small.network.contains_nan());
        assert_eq!(
            huge.report.stop == StopReason::Diverged,
            huge.network.contains_nan(),
            "seed {seed}: {:?}",
            huge.report
        );

        if huge.report.stop == StopReason::Diverged {
            diverged += 1;
            let best = search::select_best([small, huge]).unwrap();
            assert_eq!(best.step_size, 2f64.powi(-10), "seed {seed}");
        }
    }

    assert!(diverged > 0);
}

#[test]
fn diverged_step_sizes_are_not_selected() {
    let config = TrainingConfig {
        initial_epochs: 50,
        max_epochs: 200,
        min_step_power: -10,
        max_step_power: 10,
        ..Default::default()
    };
    let dataset = Dataset::new(count_corpus()).unwrap();

    let trials: Vec<Trial> = [-10, 9]
        .into_iter()
        .map(|power| trial(&dataset, power, 1, &config))
        .collect();

    assert!(!trials[0].network.contains_nan());
    assert!(trials[1].network.contains_nan());
    let best = search::select_best(trials).unwrap();
    assert_eq!(best.step_size, 2f64.powi(-10));

    let mut rng = StdRng::seed_from_u64(7);
    let best = search::train_with_config(count_corpus(), &config, &mut rng)
        .unwrap()
        .expect("small step sizes stay finite");
    assert!(!best.network.contains_nan());
    assert_ne!(best.report.stop, StopReason::Diverged);
}

#[test]
fn one_sample_per_label_still_trains() {
    let mut corpus = BTreeMap::new();
    for (label, text) in [
        ("rust", "fn main() { let x = 1; }"),
        ("python", "def main(): x = 1"),
        ("sql", "SELECT x FROM t;"),
    ] {
        let mut freqs = Freqs::from_text(text);
        freqs.normalize();
        corpus.insert(label.to_owned(), vec![freqs]);
    }

    let mut rng = StdRng::seed_from_u64(3);
    let net = search::train(corpus, &mut rng).unwrap();

    let net = net.expect("a network is produced");
    assert_eq!(net.labels(), ["python", "rust", "sql"]);
    assert!(!net.contains_nan());
}

#[test]
fn seeded_search_is_reproducible() {
    let config = TrainingConfig {
        initial_epochs: 20,
        max_epochs: 100,
        min_step_power: -6,
        max_step_power: 2,
        ..Default::default()
    };
    let run = || {
        let mut rng = StdRng::seed_from_u64(99);
        search::train_with_config(separable_corpus(6), &config, &mut rng)
            .unwrap()
            .unwrap()
    };

    let (a, b) = (run(), run());
    assert_eq!(a.step_size, b.step_size);
    assert_eq!(a.network, b.network);
}

#[test]
fn empty_corpus_is_an_error() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(search::train(BTreeMap::new(), &mut rng).is_err());
}

#[test]
fn invalid_config_is_an_error() {
    let config = TrainingConfig {
        min_step_power: 4,
        max_step_power: 1,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(0);
    assert!(search::train_with_config(separable_corpus(4), &config, &mut rng).is_err());
}
