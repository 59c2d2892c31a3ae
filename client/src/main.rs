use std::env;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format;

use neural::Network;

use self::args::Args;
use self::dataset::Dataset;

mod args;
mod dataset;

fn main() {
    set_default_logging();

    let event_format = format().with_target(false).without_time();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .event_format(event_format)
        .init();

    let args = Args::parse();

    let dataset = match Dataset::load(&args.data) {
        Ok(dataset) => dataset,
        Err(err) => {
            error!(error = ?err, "Could not load the dataset.");
            return;
        }
    };

    let network = match args.seed {
        Some(seed) => Network::with_rng(&args.layers, &mut StdRng::seed_from_u64(seed)),
        None => Network::new(&args.layers),
    };
    let mut network = match network {
        Ok(network) => network,
        Err(err) => {
            error!(error = ?err, "Could not build the network.");
            return;
        }
    };

    network.set_learning_rate(args.learning_rate);
    network.set_activation(args.activation.0);
    network.set_softmax_enabled(args.softmax);

    let samples = dataset.len();
    network.split_with_ratio(dataset.inputs, dataset.targets, args.split_ratio);

    info!(
        samples,
        layers = ?args.layers,
        activation = ?args.activation.0,
        learning_rate = args.learning_rate,
        "Training..."
    );

    if let Err(err) = network.train_with_progress(|percentage| info!("{percentage}%")) {
        error!(error = ?err, "Training failed.");
        return;
    }

    match network.test() {
        Ok(accuracy) => info!("Accuracy: {:.2}%", accuracy * 100.0),
        Err(err) => error!(error = ?err, "Testing failed."),
    }
}

fn set_default_logging() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
}
