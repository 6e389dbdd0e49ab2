//! Scoring a decoded state sequence against the known one.

use crate::error::{Error, Result};
use crate::model::HiddenMarkovModel;
use crate::table::LabelSet;
use itertools::Itertools;
use log::warn;
#[cfg(feature = "serde-1")]
use serde::{Deserialize, Serialize};

/// Counts for one state treated as the positive class.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde-1", derive(Serialize, Deserialize))]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionCounts {
    /// $TP / (TP + FN)$, or `None` if the state never occurs in the truth
    pub fn sensitivity(&self) -> Option<f64> {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    /// $TN / (TN + FP)$, or `None` if the state is the only one in the truth
    pub fn specificity(&self) -> Option<f64> {
        ratio(
            self.true_negatives,
            self.true_negatives + self.false_positives,
        )
    }
}

/// A position-by-position comparison of a ground-truth state sequence and a decoded one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Comparison<'a> {
    truth: &'a [String],
    decoded: &'a [String],
    states: Option<&'a LabelSet>,
}

impl<'a> Comparison<'a> {
    /// Fails with `ComparisonLengthMismatch` unless both sequences have the same length.
    pub fn new(truth: &'a [String], decoded: &'a [String]) -> Result<Self> {
        if truth.len() != decoded.len() {
            return Err(Error::ComparisonLengthMismatch {
                truth: truth.len(),
                decoded: decoded.len(),
            });
        }
        Ok(Self {
            truth,
            decoded,
            states: None,
        })
    }

    /// Compare against the model's stored state sequence. Confusion counts are then only available
    /// for the model's states.
    pub fn for_model(hmm: &'a HiddenMarkovModel, decoded: &'a [String]) -> Result<Self> {
        let truth = hmm.state_sequence().ok_or(Error::MissingStateSequence)?;
        Ok(Self {
            states: Some(hmm.states()),
            ..Self::new(truth, decoded)?
        })
    }

    pub fn len(&self) -> usize {
        self.truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truth.is_empty()
    }

    /// Number of positions where the decoded state equals the true one
    pub fn correct(&self) -> usize {
        self.truth
            .iter()
            .zip(self.decoded)
            .filter(|(t, d)| t == d)
            .count()
    }

    /// Fraction of positions decoded correctly, or `None` for empty sequences
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.correct(), self.len())
    }

    /// The number of state changes in the decoded sequence divided by the number in the truth.
    ///
    /// A Viterbi path usually switches less often than the truth, since every switch costs a
    /// transition probability. Returns `None` if the truth never changes state.
    pub fn transition_ratio(&self) -> Option<f64> {
        let truth = count_transitions(self.truth);
        if truth == 0 {
            warn!("the true state sequence has no transitions to compare against");
        }
        ratio(count_transitions(self.decoded), truth)
    }

    /// Confusion counts with `state` as the positive class.
    ///
    /// Fails with `UnknownState` if the comparison came from [`for_model`](Self::for_model) and
    /// `state` is not one of the model's states. Otherwise a label that appears in neither sequence
    /// yields only true negatives.
    pub fn confusion(&self, state: &str) -> Result<ConfusionCounts> {
        if let Some(states) = self.states {
            states.index_of(state)?;
        }
        let mut counts = ConfusionCounts::default();
        for (t, d) in self.truth.iter().zip(self.decoded) {
            match (t == state, d == state) {
                (true, true) => counts.true_positives += 1,
                (false, true) => counts.false_positives += 1,
                (false, false) => counts.true_negatives += 1,
                (true, false) => counts.false_negatives += 1,
            }
        }
        Ok(counts)
    }
}

/// Number of adjacent positions whose states differ
pub fn count_transitions(states: &[String]) -> usize {
    states
        .iter()
        .tuple_windows()
        .filter(|(a, b)| a != b)
        .count()
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}
