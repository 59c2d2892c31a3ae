use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::activation::Activation;
use crate::network::NetworkError;

/// A single unit of a fully connected layer: one weight per upstream output,
/// plus a bias. The error field is assigned from outside during the backward
/// pass; the neuron only ever mutates its own weights.
#[derive(Clone, Debug)]
pub struct Neuron {
    weights: Vec<f64>,
    bias: f64,
    output: f64,
    error: f64,
}

impl Neuron {
    /// Draws every weight and the bias uniformly from [-1, 1).
    pub fn random(input_size: usize, rng: &mut impl Rng) -> Self {
        let uniform = Uniform::new(-1.0, 1.0);

        Self {
            weights: (0..input_size).map(|_| uniform.sample(rng)).collect(),
            bias: uniform.sample(rng),
            output: 0.0,
            error: 0.0,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn set_error(&mut self, error: f64) {
        self.error = error;
    }

    /// Activates the weighted sum of `input` and remembers the result for the
    /// backward pass.
    pub fn calc(&mut self, input: &[f64], activation: Activation) -> Result<f64, NetworkError> {
        if input.len() != self.weights.len() {
            return Err(NetworkError::SizeMismatch(
                "Input does not match the neuron's weight count.",
            ));
        }

        let sum: f64 = input.iter().zip(&self.weights).map(|(i, w)| i * w).sum();
        self.output = activation.calc(sum + self.bias);

        Ok(self.output)
    }

    /// Applies one gradient step from the currently assigned error. With
    /// `error = target - output`, adding the deltas reduces the squared error.
    pub fn backprop(
        &mut self,
        input: &[f64],
        activation: Activation,
        learning_rate: f64,
    ) -> Result<(), NetworkError> {
        if input.len() != self.weights.len() {
            return Err(NetworkError::SizeMismatch(
                "Input does not match the neuron's weight count.",
            ));
        }

        let gradient = activation.derivative(self.output) * self.error * learning_rate;

        for (weight, input) in self.weights.iter_mut().zip(input) {
            *weight += gradient * input;
        }
        self.bias += gradient;

        Ok(())
    }
}
