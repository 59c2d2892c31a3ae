use std::fs::File;
use std::io;
use std::path::Path;

use serde::Deserialize;

/// Parallel input and target vectors, one pair per sample.
#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        let dataset: Dataset = serde_json::from_reader(file)?;

        if dataset.inputs.len() != dataset.targets.len() {
            return Err(DatasetError::Shape(
                "The amount of inputs does not match the amount of targets.",
            ));
        }
        if dataset.inputs.is_empty() {
            return Err(DatasetError::Shape("The dataset holds no samples."));
        }

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }
}

#[derive(Debug)]
pub enum DatasetError {
    Io(io::Error),
    Parse(serde_json::Error),
    Shape(&'static str),
}

impl From<io::Error> for DatasetError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error)
    }
}
