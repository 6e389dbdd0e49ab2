//! Drawing emission/state trajectories from a model.

use crate::error::{Error, Result};
use crate::model::HiddenMarkovModel;
use crate::SUM_SLACK;
use log::debug;
use ndarray::Array2;
use rand::prelude::*;

/// Sampling weights must sum to more than this.
pub const MIN_WEIGHT_SUM: f64 = 0.999;

/// Return the index selected by a roulette wheel, given the weights in order and a uniform draw
/// `r` in `[0, 1)`.
///
/// The weights are subtracted from `r` in order until the remainder is no longer positive. If
/// floating-point slack means that never happens, the last index is returned.
pub fn roulette_wheel(weights: &[f64], mut r: f64) -> usize {
    for (i, w) in weights.iter().enumerate() {
        r -= w;
        if r <= 0.0 {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

/// Sample from a [categorical distribution](https://en.wikipedia.org/wiki/Categorical_distribution)
/// by roulette-wheel selection.
#[derive(Clone, Debug, PartialEq)]
pub struct RouletteWheel {
    weights: Vec<f64>,
}

impl RouletteWheel {
    /// Fails with `InvalidSamplingWeights` unless the weights are non-negative and their sum
    /// lies in `(0.999, 1.0]`.
    pub fn new(weights: &[f64]) -> Result<Self> {
        let sum: f64 = weights.iter().sum();
        let valid = weights.iter().all(|&w| w >= 0.0)
            && sum > MIN_WEIGHT_SUM
            && sum <= 1.0 + SUM_SLACK;
        if !valid {
            return Err(Error::InvalidSamplingWeights { sum });
        }
        Ok(Self {
            weights: weights.to_vec(),
        })
    }
}

impl Distribution<usize> for RouletteWheel {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        roulette_wheel(&self.weights, rng.gen::<f64>())
    }
}

/// The item yielded by `SampleIter`, as state and emission indices
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sample {
    pub state: usize,
    pub emission: usize,
}

/// An iterator that returns random samples from an HMM
pub struct SampleIter<'a, R: Rng + ?Sized + 'a> {
    transition_wheels: Vec<RouletteWheel>,
    emission_wheels: Vec<RouletteWheel>,
    begin_wheel: RouletteWheel,
    rng: &'a mut R,
    current_state: Option<usize>,
}

impl<'a, R: Rng + ?Sized> Iterator for SampleIter<'a, R> {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        // The begin prior picks the state that precedes the first sample
        let previous = match self.current_state {
            Some(current_state) => current_state,
            None => self.begin_wheel.sample(self.rng),
        };
        let state = self.transition_wheels[previous].sample(self.rng);
        self.current_state = Some(state);
        Some(Sample {
            state,
            emission: self.emission_wheels[state].sample(self.rng),
        })
    }
}

impl HiddenMarkovModel {
    /// An endless stream of samples from this model, drawn with `rng`.
    pub fn sampler<'a, R: Rng + ?Sized>(&self, rng: &'a mut R) -> Result<SampleIter<'a, R>> {
        Ok(SampleIter {
            transition_wheels: row_wheels(self.a())?,
            emission_wheels: row_wheels(self.b())?,
            begin_wheel: RouletteWheel::new(&self.begin().to_vec())?,
            rng,
            current_state: None,
        })
    }
}

fn row_wheels(table: &Array2<f64>) -> Result<Vec<RouletteWheel>> {
    table
        .rows()
        .into_iter()
        .map(|row| RouletteWheel::new(&row.to_vec()))
        .collect()
}

/// A sampled emission sequence together with the states that produced it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Trajectory {
    pub emissions: Vec<String>,
    pub states: Vec<String>,
}

/// Generates trajectories from a model using a caller-supplied random source.
pub struct SequenceSampler<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
}

impl<'r, R: Rng + ?Sized> SequenceSampler<'r, R> {
    pub fn new(rng: &'r mut R) -> Self {
        Self { rng }
    }

    /// Draw a trajectory of `length` emissions and states.
    pub fn sample(&mut self, hmm: &HiddenMarkovModel, length: usize) -> Result<Trajectory> {
        let mut trajectory = Trajectory {
            emissions: Vec::with_capacity(length),
            states: Vec::with_capacity(length),
        };
        for sample in hmm.sampler(&mut *self.rng)?.take(length) {
            trajectory
                .emissions
                .push(hmm.emissions().name(sample.emission)?.to_owned());
            trajectory
                .states
                .push(hmm.states().name(sample.state)?.to_owned());
        }
        debug!(
            "sampled a trajectory of length {} over {} states",
            length,
            hmm.n()
        );
        Ok(trajectory)
    }

    /// Draw a trajectory of `length` and store it as the model's emission and state sequences,
    /// replacing whatever was there.
    pub fn populate(&mut self, hmm: &mut HiddenMarkovModel, length: usize) -> Result<()> {
        let Trajectory { emissions, states } = self.sample(hmm, length)?;
        hmm.set_trajectory(&emissions, &states)
    }
}
