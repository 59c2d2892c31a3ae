/// The nonlinearity applied to every neuron's weighted sum. One variant is
/// selected for the whole network.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Activation {
    #[default]
    Sigmoid,
    Relu,
}

impl Activation {
    pub fn calc(self, x: f64) -> f64 {
        match self {
            Self::Sigmoid => {
                let e_x = x.exp();
                e_x / (e_x + 1.0)
            }
            Self::Relu => x.max(0.0),
        }
    }

    /// The derivative, evaluated on the already-activated output of `calc`
    /// rather than on the raw weighted sum. Any new variant must be written
    /// against that convention.
    pub fn derivative(self, y: f64) -> f64 {
        match self {
            Self::Sigmoid => y * (1.0 - y),
            Self::Relu => match y > 0.0 {
                true => 1.0,
                false => 0.0,
            },
        }
    }
}
