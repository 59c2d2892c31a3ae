use rand::Rng;
use tracing::debug;

use crate::activation::Activation;
use crate::layer::Layer;

pub const DEFAULT_LEARNING_RATE: f64 = 0.05;
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;

#[derive(Clone, Debug, Default)]
struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

/// An ordered chain of fully connected layers trained by per-sample gradient
/// descent. `train` performs exactly one pass over the training data; callers
/// that want more passes call it again.
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<Layer>,
    learning_rate: f64,
    activation: Activation,
    softmax_enabled: bool,
    training: Option<Dataset>,
    testing: Option<Dataset>,
}

impl Network {
    pub fn new(layer_sizes: &[usize]) -> Result<Self, NetworkError> {
        Self::with_rng(layer_sizes, &mut rand::thread_rng())
    }

    /// Builds `layer_sizes.len() - 1` layers, where layer i reads
    /// `layer_sizes[i]` values and holds `layer_sizes[i + 1]` neurons. The
    /// passed rng is the only source of randomness the network ever consumes.
    pub fn with_rng(layer_sizes: &[usize], rng: &mut impl Rng) -> Result<Self, NetworkError> {
        if layer_sizes.len() < 2 {
            return Err(NetworkError::InvalidLayout(
                "A network needs an input size and at least one layer size.",
            ));
        }
        if layer_sizes.iter().any(|&size| size < 1) {
            return Err(NetworkError::InvalidLayout(
                "Every layer needs at least one neuron.",
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::random(pair[0], pair[1], rng))
            .collect();

        Ok(Self {
            layers,
            learning_rate: DEFAULT_LEARNING_RATE,
            activation: Activation::default(),
            softmax_enabled: false,
            training: None,
            testing: None,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    pub fn softmax_enabled(&self) -> bool {
        self.softmax_enabled
    }

    pub fn set_softmax_enabled(&mut self, softmax_enabled: bool) {
        self.softmax_enabled = softmax_enabled;
    }

    pub fn set_training_data(&mut self, inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) {
        self.training = Some(Dataset { inputs, targets });
    }

    pub fn set_testing_data(&mut self, inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) {
        self.testing = Some(Dataset { inputs, targets });
    }

    pub fn training_data(&self) -> Option<(&[Vec<f64>], &[Vec<f64>])> {
        self.training
            .as_ref()
            .map(|data| (data.inputs.as_slice(), data.targets.as_slice()))
    }

    pub fn testing_data(&self) -> Option<(&[Vec<f64>], &[Vec<f64>])> {
        self.testing
            .as_ref()
            .map(|data| (data.inputs.as_slice(), data.targets.as_slice()))
    }

    /// Partitions the samples with the default 0.8 ratio.
    pub fn split(&mut self, inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) {
        self.split_with_ratio(inputs, targets, DEFAULT_SPLIT_RATIO)
    }

    /// Deterministic index partition: the first `floor(ratio * len)` samples
    /// become training data in their original order, the rest testing data.
    /// No shuffling.
    pub fn split_with_ratio(
        &mut self,
        mut inputs: Vec<Vec<f64>>,
        mut targets: Vec<Vec<f64>>,
        ratio: f64,
    ) {
        let training_len = (ratio * inputs.len() as f64) as usize;

        let testing_inputs = inputs.split_off(training_len.min(inputs.len()));
        let testing_targets = targets.split_off(training_len.min(targets.len()));

        self.training = Some(Dataset { inputs, targets });
        self.testing = Some(Dataset {
            inputs: testing_inputs,
            targets: testing_targets,
        });
    }

    /// Feeds `input` through every layer in order. When softmax is enabled,
    /// the raw outputs are scaled by their plain sum; the layers themselves
    /// keep the unscaled outputs.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let mut output = input.to_vec();

        for layer in &mut self.layers {
            layer.set_input(&output)?;
            layer.calc(self.activation)?;
            output = layer.output().to_vec();
        }

        if self.softmax_enabled {
            output = softmax(output);
        }

        Ok(output)
    }

    pub fn train(&mut self) -> Result<(), NetworkError> {
        self.train_with_progress(|_| {})
    }

    /// One pass of online gradient descent over the training data, in the
    /// original sample order. The sink receives the integer percentage of
    /// processed samples whenever it changes.
    pub fn train_with_progress(
        &mut self,
        mut progress: impl FnMut(usize),
    ) -> Result<(), NetworkError> {
        let training = self.training.take().ok_or(NetworkError::TrainingDataNotSet)?;

        let result = self.train_pass(&training, &mut progress);
        self.training = Some(training);

        result
    }

    fn train_pass(
        &mut self,
        training: &Dataset,
        progress: &mut impl FnMut(usize),
    ) -> Result<(), NetworkError> {
        if training.inputs.len() != training.targets.len() {
            return Err(NetworkError::SizeMismatch(
                "The amount of inputs does not match the amount of targets.",
            ));
        }

        let sample_count = training.inputs.len();
        let mut prev_percentage = 0;

        for (i, (input, target)) in training.inputs.iter().zip(&training.targets).enumerate() {
            let percentage = i * 100 / sample_count;
            if percentage != prev_percentage {
                progress(percentage);
            }
            prev_percentage = percentage;

            let output = self.predict(input)?;
            if target.len() != output.len() {
                return Err(NetworkError::SizeMismatch(
                    "The size of the target does not match the size of the output.",
                ));
            }

            let errors: Vec<f64> = target.iter().zip(&output).map(|(t, o)| t - o).collect();
            self.propagate_errors(&errors)?;

            for layer in &mut self.layers {
                layer.backprop(self.activation, self.learning_rate)?;
            }
        }

        debug!(samples = sample_count, "Training pass complete.");

        Ok(())
    }

    /// Assigns the output errors to the last layer, then walks back to front,
    /// deriving each layer's errors from the downstream layer's weights.
    /// Every weight is read before any weight is updated; the updates all
    /// happen afterwards in `train_pass`.
    fn propagate_errors(&mut self, output_errors: &[f64]) -> Result<(), NetworkError> {
        let last = self.layers.len() - 1;
        self.layers[last].set_errors(output_errors)?;

        for i in (0..last).rev() {
            let errors = self.layers[i + 1].propagated_errors();
            self.layers[i].set_errors(&errors)?;
        }

        Ok(())
    }

    /// Classification accuracy over the testing data: the fraction of samples
    /// whose predicted argmax matches the target's argmax.
    pub fn test(&mut self) -> Result<f64, NetworkError> {
        let testing = self.testing.take().ok_or(NetworkError::EmptyTestingSet)?;

        let result = self.test_pass(&testing);
        self.testing = Some(testing);

        result
    }

    fn test_pass(&mut self, testing: &Dataset) -> Result<f64, NetworkError> {
        if testing.inputs.is_empty() {
            return Err(NetworkError::EmptyTestingSet);
        }
        if testing.inputs.len() != testing.targets.len() {
            return Err(NetworkError::SizeMismatch(
                "The amount of inputs does not match the amount of targets.",
            ));
        }

        let mut matches = 0;
        for (input, target) in testing.inputs.iter().zip(&testing.targets) {
            let output = self.predict(input)?;
            if index_of_max(&output) == index_of_max(target) {
                matches += 1;
            }
        }

        debug!(
            matches,
            samples = testing.inputs.len(),
            "Testing pass complete."
        );

        Ok(matches as f64 / testing.inputs.len() as f64)
    }
}

/// Scales each value by the plain sum of all values. Not the exponential
/// softmax; the outputs are left on their original scale relative to each
/// other.
fn softmax(mut output: Vec<f64>) -> Vec<f64> {
    let sum: f64 = output.iter().sum();
    for value in &mut output {
        *value /= sum;
    }
    output
}

/// A value only wins if it strictly exceeds both the running maximum and the
/// initial 0.0, so an all-non-positive vector yields index 0.
fn index_of_max(values: &[f64]) -> usize {
    let mut max = 0.0;
    let mut index = 0;

    for (i, &value) in values.iter().enumerate() {
        if value > max {
            max = value;
            index = i;
        }
    }

    index
}

#[derive(Debug, Eq, PartialEq)]
pub enum NetworkError {
    InvalidLayout(&'static str),
    SizeMismatch(&'static str),
    TrainingDataNotSet,
    EmptyTestingSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(layer_sizes: &[usize], seed: u64) -> Network {
        Network::with_rng(layer_sizes, &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn construction_builds_chained_layers() {
        let network = seeded(&[4, 3, 2], 1);

        assert_eq!(network.layers().len(), 2);
        assert_eq!(network.layers()[0].input_size(), 4);
        assert_eq!(network.layers()[0].len(), 3);
        assert_eq!(network.layers()[1].input_size(), 3);
        assert_eq!(network.layers()[1].len(), 2);
    }

    #[test]
    fn construction_rejects_bad_layouts() {
        assert!(matches!(
            Network::new(&[3]),
            Err(NetworkError::InvalidLayout(_)),
        ));
        assert!(matches!(
            Network::new(&[]),
            Err(NetworkError::InvalidLayout(_)),
        ));
        assert!(matches!(
            Network::new(&[2, 0, 2]),
            Err(NetworkError::InvalidLayout(_)),
        ));
    }

    #[test]
    fn predict_output_length_and_determinism() {
        let mut network = seeded(&[2, 5, 3], 2);

        let first = network.predict(&[0.5, -0.5]).unwrap();
        let second = network.predict(&[0.5, -0.5]).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn same_seed_yields_same_network() {
        let mut a = seeded(&[3, 4, 2], 9);
        let mut b = seeded(&[3, 4, 2], 9);

        let input = [0.1, 0.2, 0.3];
        assert_eq!(a.predict(&input).unwrap(), b.predict(&input).unwrap());
    }

    #[test]
    fn predict_rejects_wrong_input_size() {
        let mut network = seeded(&[2, 3, 1], 2);

        assert!(matches!(
            network.predict(&[1.0, 2.0, 3.0]),
            Err(NetworkError::SizeMismatch(_)),
        ));
    }

    #[test]
    fn split_partitions_in_order() {
        let mut network = seeded(&[2, 2], 3);

        let inputs: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, i as f64]).collect();
        let targets: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 0.0]).collect();

        network.split_with_ratio(inputs.clone(), targets.clone(), 0.8);

        let (training_inputs, training_targets) = network.training_data().unwrap();
        let (testing_inputs, testing_targets) = network.testing_data().unwrap();

        assert_eq!(training_inputs, &inputs[..8]);
        assert_eq!(training_targets, &targets[..8]);
        assert_eq!(testing_inputs, &inputs[8..]);
        assert_eq!(testing_targets, &targets[8..]);
    }

    #[test]
    fn train_requires_training_data() {
        let mut network = seeded(&[2, 3, 1], 4);

        assert_eq!(network.train(), Err(NetworkError::TrainingDataNotSet));
    }

    #[test]
    fn train_rejects_mismatched_sample_counts() {
        let mut network = seeded(&[2, 3, 1], 4);

        network.set_training_data(vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![vec![1.0]]);

        assert!(matches!(
            network.train(),
            Err(NetworkError::SizeMismatch(_)),
        ));
    }

    #[test]
    fn train_rejects_mismatched_target_size() {
        let mut network = seeded(&[2, 3, 1], 4);

        network.set_training_data(vec![vec![0.0, 1.0]], vec![vec![1.0, 0.0]]);

        assert!(matches!(
            network.train(),
            Err(NetworkError::SizeMismatch(_)),
        ));
    }

    #[test]
    fn train_updates_output_layer_and_prediction() {
        let mut network = seeded(&[2, 3, 1], 5);

        let input = vec![1.0, 0.0];
        let before = network.predict(&input).unwrap();
        let weights_before: Vec<f64> = network.layers()[1].neurons()[0].weights().to_vec();

        network.set_training_data(vec![input.clone()], vec![vec![1.0]]);
        network.train().unwrap();

        let after = network.predict(&input).unwrap();
        let weights_after = network.layers()[1].neurons()[0].weights();

        assert_ne!(before, after);
        assert_ne!(weights_before.as_slice(), weights_after);
    }

    #[test]
    fn repeated_training_approaches_target() {
        let mut network = seeded(&[2, 3, 1], 6);
        network.set_learning_rate(0.5);

        let input = vec![1.0, 0.0];
        network.set_training_data(vec![input.clone()], vec![vec![1.0]]);

        let before = network.predict(&input).unwrap()[0];
        for _ in 0..25 {
            network.train().unwrap();
        }
        let after = network.predict(&input).unwrap()[0];

        assert!((1.0 - after).abs() < (1.0 - before).abs());
    }

    #[test]
    fn test_reports_full_and_zero_accuracy() {
        let mut network = seeded(&[2, 4, 3], 7);

        let inputs = vec![vec![0.9, 0.1], vec![0.2, 0.8], vec![0.5, 0.5]];

        let matching: Vec<Vec<f64>> = inputs
            .iter()
            .map(|input| {
                let output = network.predict(input).unwrap();
                let mut target = vec![0.0; output.len()];
                target[index_of_max(&output)] = 1.0;
                target
            })
            .collect();
        let missing: Vec<Vec<f64>> = matching
            .iter()
            .map(|target| {
                let mut rotated = vec![0.0; target.len()];
                rotated[(index_of_max(target) + 1) % target.len()] = 1.0;
                rotated
            })
            .collect();

        network.set_testing_data(inputs.clone(), matching);
        assert_eq!(network.test(), Ok(1.0));

        network.set_testing_data(inputs, missing);
        assert_eq!(network.test(), Ok(0.0));
    }

    #[test]
    fn test_requires_testing_samples() {
        let mut network = seeded(&[2, 3, 1], 8);

        assert_eq!(network.test(), Err(NetworkError::EmptyTestingSet));

        network.set_testing_data(Vec::new(), Vec::new());
        assert_eq!(network.test(), Err(NetworkError::EmptyTestingSet));
    }

    #[test]
    fn softmax_scales_by_plain_sum() {
        let mut network = seeded(&[2, 3, 2], 10);

        let raw = network.predict(&[0.3, 0.7]).unwrap();
        let sum: f64 = raw.iter().sum();

        network.set_softmax_enabled(true);
        let scaled = network.predict(&[0.3, 0.7]).unwrap();

        let expected: Vec<f64> = raw.iter().map(|value| value / sum).collect();
        assert_eq!(scaled, expected);
    }

    #[test]
    fn progress_reports_each_percentage_change() {
        let mut network = seeded(&[2, 3, 1], 11);

        network.set_training_data(vec![vec![0.5, 0.25]; 50], vec![vec![1.0]; 50]);

        let mut reported = Vec::new();
        network
            .train_with_progress(|percentage| reported.push(percentage))
            .unwrap();

        let expected: Vec<usize> = (1..50).map(|i| i * 2).collect();
        assert_eq!(reported, expected);
    }

    #[test]
    fn index_of_max_starts_at_zero_threshold() {
        assert_eq!(index_of_max(&[0.1, 0.5, 0.2]), 1);
        assert_eq!(index_of_max(&[0.5, 0.5, 0.2]), 0);
        assert_eq!(index_of_max(&[-1.0, -2.0, -3.0]), 0);
        assert_eq!(index_of_max(&[0.0, 0.0]), 0);
        assert_eq!(index_of_max(&[-1.0, 0.4]), 1);
    }
}
