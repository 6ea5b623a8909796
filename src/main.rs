use std::{env, process};

use anyhow::{bail, Context};
use lexnet::{corpus, search, Network, TrainingConfig};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

const USAGE: &str = "Usage:
  lexnet train <samples_dir> <model.json> [config.json]
  lexnet classify [--raw] <model.json> <file>...";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(args: &[String]) -> anyhow::Result<()> {
    match args {
        [mode, samples, model, rest @ ..] if mode == "train" && rest.len() <= 1 => {
            train(samples, model, rest.first())
        }
        [mode, rest @ ..] if mode == "classify" => {
            let (normalize, rest) = match rest {
                [flag, rest @ ..] if flag == "--raw" => (false, rest),
                _ => (true, rest),
            };
            match rest {
                [model, files @ ..] if !files.is_empty() => classify(model, files, normalize),
                _ => bail!("{USAGE}"),
            }
        }
        _ => bail!("{USAGE}"),
    }
}

fn train(samples: &str, model: &str, config: Option<&String>) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => TrainingConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {path}"))?,
        None => TrainingConfig::default(),
    };

    let corpus = corpus::load_dir(samples, config.normalize)
        .with_context(|| format!("failed to load samples from {samples}"))?;

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed = seed; "training");
    let mut rng = StdRng::seed_from_u64(seed);

    let Some(best) = search::train_with_config(corpus, &config, &mut rng)? else {
        bail!("every step size diverged, no model was produced");
    };

    best.network
        .save(model)
        .with_context(|| format!("failed to write model to {model}"))?;

    println!(
        "step size {}: cross-validation {:.2}%, training {:.2}%",
        best.step_size,
        best.cross_score * 100.,
        best.training_score * 100.
    );
    Ok(())
}

fn classify(model: &str, files: &[String], normalize: bool) -> anyhow::Result<()> {
    let net = Network::load(model).with_context(|| format!("failed to load model {model}"))?;

    for file in files {
        let sample = corpus::load_sample(file, normalize)
            .with_context(|| format!("failed to read {file}"))?;
        println!("{file}: {}", net.classify(&sample).unwrap_or("?"));
    }

    Ok(())
}
