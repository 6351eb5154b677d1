//! Optimizer selection.

/// Optimizers a model can be compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Adam,
    AdaGrad,
    Sgd,
}

impl OptimizerKind {
    /// Candidate names, default first.
    pub const NAMES: [&'static str; 3] = ["adam", "adagrad", "sgd"];

    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Adam => "adam",
            OptimizerKind::AdaGrad => "adagrad",
            OptimizerKind::Sgd => "sgd",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "adam" => Some(OptimizerKind::Adam),
            "adagrad" => Some(OptimizerKind::AdaGrad),
            "sgd" => Some(OptimizerKind::Sgd),
            _ => None,
        }
    }
}
