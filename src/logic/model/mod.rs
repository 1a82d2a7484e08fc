//! Model Module - Fault classifier and its training machinery
//!
//! Dense network, loss, Adam optimizer and the `FaultClassifier` lifecycle
//! on top of them. Snapshots carry the feature layout hash so a model is
//! never loaded against a different feature vector.

pub mod buffer;
pub mod classifier;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod prediction;
pub mod progress;
pub mod snapshot;


// Re-export common types
pub use buffer::{BufferStatus, BufferTracker};
pub use classifier::{ClassifierState, FaultClassifier, TrainingSummary, DEFAULT_SEQUENCE_THRESHOLD};
pub use loss::LossKind;
pub use network::{Activation, Network};
pub use prediction::{FaultPrediction, PredictionThreshold};
pub use progress::{
    CancellationToken, ChannelProgressSink, EarlyStopping, EpochProgress, LogProgressSink, ProgressSink,
};
pub use snapshot::ModelSnapshot;
