//! Errors raised while building a model or decoding against it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A state label outside the model's declared states
    #[error("unknown state: {0:?}")]
    UnknownState(String),

    /// An emission label outside the model's declared emission alphabet
    #[error("unknown emission: {0:?}")]
    UnknownEmission(String),

    #[error("the observation sequence is empty")]
    EmptyObservationSequence,

    /// A series was read at an index that has not been populated yet
    #[error("index {index} is out of range for a series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(
        "forward ({forward}) and backward ({backward}) tables must both have length {expected}"
    )]
    InconsistentTableLengths {
        expected: usize,
        forward: usize,
        backward: usize,
    },

    /// A distribution that must sum to 1 does not
    #[error("row {row:?} of the {table} table sums to {sum}, not 1")]
    InvalidProbabilityRow {
        table: &'static str,
        row: String,
        sum: f64,
    },

    #[error("row {row:?} of the {table} table holds {value}, which is not a probability")]
    NegativeProbability {
        table: &'static str,
        row: String,
        value: f64,
    },

    #[error("sampling weights sum to {sum}, which is outside (0.999, 1.0]")]
    InvalidSamplingWeights { sum: f64 },

    /// A table or distribution was declared over different labels than the model
    #[error("the {table} table is not declared over the model's labels")]
    LabelMismatch { table: &'static str },

    #[error("label {0:?} is declared more than once")]
    DuplicateLabel(String),

    #[error("a label set must not be empty")]
    EmptyLabelSet,

    #[error("emission sequence has length {emissions} but state sequence has length {states}")]
    SequenceLengthMismatch { emissions: usize, states: usize },

    /// Two state sequences being compared have different lengths
    #[error("cannot compare a truth sequence of length {truth} with a decoded one of length {decoded}")]
    ComparisonLengthMismatch { truth: usize, decoded: usize },

    #[error("the model has no ground-truth state sequence")]
    MissingStateSequence,

    /// No state can explain the observations up to this position
    #[error("the observations have probability zero at position {position}")]
    ImpossibleObservation { position: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
