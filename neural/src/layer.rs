use rand::Rng;

use crate::activation::Activation;
use crate::network::NetworkError;
use crate::neuron::Neuron;

/// A fully connected layer: a fixed collection of neurons sharing one input
/// dimension. The input is snapshotted on `set_input`; neurons never borrow
/// the upstream layer's output buffer.
#[derive(Clone, Debug)]
pub struct Layer {
    neurons: Vec<Neuron>,
    input_size: usize,
    input: Vec<f64>,
    output: Vec<f64>,
}

impl Layer {
    pub fn random(input_size: usize, size: usize, rng: &mut impl Rng) -> Self {
        Self {
            neurons: (0..size).map(|_| Neuron::random(input_size, rng)).collect(),
            input_size,
            input: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// The outputs collected by the last `calc`, in neuron order.
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn set_input(&mut self, input: &[f64]) -> Result<(), NetworkError> {
        if input.len() != self.input_size {
            return Err(NetworkError::SizeMismatch(
                "Input does not match the size of the previous layer.",
            ));
        }

        self.input.clear();
        self.input.extend_from_slice(input);

        Ok(())
    }

    /// Runs every neuron against the stored input. Neurons within a layer are
    /// independent; only the output ordering matters.
    pub fn calc(&mut self, activation: Activation) -> Result<(), NetworkError> {
        self.output.clear();
        for neuron in &mut self.neurons {
            self.output.push(neuron.calc(&self.input, activation)?);
        }

        Ok(())
    }

    pub fn set_errors(&mut self, errors: &[f64]) -> Result<(), NetworkError> {
        if errors.len() != self.neurons.len() {
            return Err(NetworkError::SizeMismatch(
                "Not the same amount of errors as neurons.",
            ));
        }

        for (neuron, &error) in self.neurons.iter_mut().zip(errors) {
            neuron.set_error(error);
        }

        Ok(())
    }

    /// Fans this layer's errors back onto the upstream layer: for upstream
    /// index j, the sum over neurons d of `weights_d[j] * error_d`. Reads the
    /// current weights, so it must run before `backprop` updates them.
    pub fn propagated_errors(&self) -> Vec<f64> {
        let mut errors = vec![0.0; self.input_size];

        for neuron in &self.neurons {
            for (error, weight) in errors.iter_mut().zip(neuron.weights()) {
                *error += weight * neuron.error();
            }
        }

        errors
    }

    pub fn backprop(
        &mut self,
        activation: Activation,
        learning_rate: f64,
    ) -> Result<(), NetworkError> {
        for neuron in &mut self.neurons {
            neuron.backprop(&self.input, activation, learning_rate)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn calc_preserves_neuron_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Layer::random(2, 3, &mut rng);

        layer.set_input(&[0.5, -0.25]).unwrap();
        layer.calc(Activation::Sigmoid).unwrap();

        assert_eq!(layer.output().len(), 3);
        for (output, neuron) in layer.output().iter().zip(layer.neurons()) {
            assert_eq!(*output, neuron.output());
        }
    }

    #[test]
    fn set_input_rejects_wrong_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Layer::random(2, 3, &mut rng);

        assert!(matches!(
            layer.set_input(&[1.0, 2.0, 3.0]),
            Err(NetworkError::SizeMismatch(_)),
        ));
    }

    #[test]
    fn set_errors_rejects_wrong_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Layer::random(2, 3, &mut rng);

        assert!(matches!(
            layer.set_errors(&[1.0]),
            Err(NetworkError::SizeMismatch(_)),
        ));
        assert!(layer.set_errors(&[1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn propagated_errors_sum_weighted_errors() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Layer::random(2, 2, &mut rng);

        layer.set_errors(&[0.5, -1.5]).unwrap();

        let propagated = layer.propagated_errors();
        assert_eq!(propagated.len(), 2);

        for (j, propagated) in propagated.iter().enumerate() {
            let expected: f64 = layer
                .neurons()
                .iter()
                .map(|neuron| neuron.weights()[j] * neuron.error())
                .sum();
            assert_eq!(*propagated, expected);
        }
    }
}
