use std::str::FromStr;

use clap::Parser;

use neural::Activation;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// A dataset file in JSON format:
    ///   {"inputs": [[number, ...], ...], "targets": [[number, ...], ...]}
    /// The inputs and targets are parallel; the input size must match the
    /// first layer size, the target size the last layer size.
    #[arg(short, long, verbatim_doc_comment)]
    pub data: String,

    /// Comma-separated layer sizes, the input size first. (e.g. 4,8,3)
    #[arg(short, long, value_delimiter = ',', num_args = 2..)]
    pub layers: Vec<usize>,

    /// The activation function. (sigmoid or relu)
    #[arg(short, long, default_value = "sigmoid")]
    pub activation: ActivationChoice,

    /// The step size applied to every weight update.
    #[arg(long, default_value_t = neural::DEFAULT_LEARNING_RATE)]
    pub learning_rate: f64,

    /// The fraction of samples used for training; the rest are used for
    /// testing.
    #[arg(long, default_value_t = neural::DEFAULT_SPLIT_RATIO)]
    pub split_ratio: f64,

    /// Scale the network's outputs by their sum before reporting them.
    #[arg(long)]
    pub softmax: bool,

    /// A seed for the weight initialization. Random when unset.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
pub struct ActivationChoice(pub Activation);

impl FromStr for ActivationChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sigmoid" => Ok(Self(Activation::Sigmoid)),
            "relu" => Ok(Self(Activation::Relu)),
            unknown => Err(format!("unknown activation function: {unknown}")),
        }
    }
}
