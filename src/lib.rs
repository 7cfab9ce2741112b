pub mod sequential;

pub use sequential::tensor::Tensor;
pub use sequential::layer::{
    Layer,
    Dense,
    ReLU,
};
pub use sequential::loss::{
    Loss,
    MeanSquaredError,
};
pub use sequential::optimizer::{
    Optimizer,
    SGD,
    RmsProp,
};
pub use sequential::Sequential;

pub mod approximator;

pub use approximator::{ApproximatorError, QFunction};

pub mod agent;

pub use agent::{Agent, AgentConfig, Mode, TrainingConfig, TrainingReport, EpisodeStats, TrainingAborted};
pub use agent::memory::{ExperienceMemory, Memory};

pub mod game;

pub use game::{Board, FeatureVector, Point, Vector, Snake};

pub mod cycle;
pub mod player;

pub use cycle::{detect_cycle, Cycle};
pub use player::Autopilot;
