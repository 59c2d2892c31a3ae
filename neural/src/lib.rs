pub use self::activation::Activation;
pub use self::layer::Layer;
pub use self::network::{Network, NetworkError, DEFAULT_LEARNING_RATE, DEFAULT_SPLIT_RATIO};
pub use self::neuron::Neuron;

mod activation;
mod layer;
mod network;
mod neuron;
