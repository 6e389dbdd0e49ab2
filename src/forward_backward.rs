//! The scaled forward-backward algorithm.
//!
//! Let $α_i(t)$ be the forward value of state $i$ at position $t$ and $β_i(t)$ its backward value.
//! Before scaling,
//!
//! $$
//! α_i(0) = π_i b_i(y_0), \qquad α_i(t) = b_i(y_t) \sum_{j} α_j(t-1) a_{ji}
//! $$
//!
//! $$
//! β_i(T-1) = \sum_{j} a_{ij} b_j(y_{T-1}) ε_j, \qquad β_i(t) = \sum_{j} a_{ij} b_j(y_t) β_j(t+1)
//! $$
//!
//! so $β_i(t)$ is the probability of $y_t, \ldots, y_{T-1}$ and the end, given that the state
//! *before* position $t$ was $i$. The forward pass sums contributions into a state from its
//! predecessors; the backward pass sums contributions out of a state to its successors.
//!
//! After each forward row is computed it is divided by its sum $c_t$, the scaling coefficient for
//! position $t$. This keeps long sequences from underflowing.

use crate::error::{Error, Result};
use crate::model::HiddenMarkovModel;
use crate::ndarray_utils::*;
use crate::series::StateIndexedSeries;
use log::{debug, trace};
use ndarray::prelude::*;
#[cfg(feature = "serde-1")]
use serde::{Deserialize, Serialize};

/// How backward rows are scaled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde-1", derive(Serialize, Deserialize))]
pub enum Scaling {
    /// Each backward row is divided by the forward scaling coefficient for the same position, so
    /// both passes share one schedule. Backward rows do not generally sum to 1.
    Shared,
    /// Each backward row is divided by its own sum, so backward rows sum to 1 as forward rows do.
    PerRow,
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling::Shared
    }
}

/// The forward and backward tables for one observation sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardBackward {
    /// Scaled forward values; every position sums to 1 across states
    pub forward: StateIndexedSeries<f64>,
    /// Scaled backward values
    pub backward: StateIndexedSeries<f64>,
    /// The forward scaling coefficient $c_t$ of each position
    pub scales: Vec<f64>,
    /// What each backward row was divided by. Equal to `scales` under `Scaling::Shared`.
    pub backward_scales: Vec<f64>,
    termination: f64,
}

impl ForwardBackward {
    /// $T$, the length of the observation sequence
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// The natural log of $P(Y)$, the probability of the observations including the end priors.
    ///
    /// $$\ln P(Y) = \sum_t \ln c_t + \ln \sum_i \hat{α}_i(T-1) ε_i$$
    pub fn log_likelihood(&self) -> f64 {
        self.scales.iter().map(|c| c.ln()).sum::<f64>() + self.termination.ln()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ForwardBackwardEngine {
    scaling: Scaling,
}

impl ForwardBackwardEngine {
    pub fn new(scaling: Scaling) -> Self {
        Self { scaling }
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    /// Run over the model's own emission sequence.
    pub fn run(&self, hmm: &HiddenMarkovModel) -> Result<ForwardBackward> {
        self.run_encoded(hmm, &hmm.encoded_observations()?)
    }

    /// Run over `observations` instead of the model's emission sequence.
    pub fn run_observations<S: AsRef<str>>(
        &self,
        hmm: &HiddenMarkovModel,
        observations: &[S],
    ) -> Result<ForwardBackward> {
        if observations.is_empty() {
            return Err(Error::EmptyObservationSequence);
        }
        self.run_encoded(hmm, &hmm.emissions().encode(observations)?)
    }

    pub(crate) fn run_encoded(
        &self,
        hmm: &HiddenMarkovModel,
        ys: &[usize],
    ) -> Result<ForwardBackward> {
        if ys.is_empty() {
            return Err(Error::EmptyObservationSequence);
        }
        debug!(
            "forward-backward over {} observations and {} states ({:?} scaling)",
            ys.len(),
            hmm.n(),
            self.scaling
        );

        let (forward, scales, last) = Self::forward(hmm, ys)?;
        let termination = (&last * hmm.end()).sum();
        let (backward, backward_scales) = self.backward(hmm, ys, &scales)?;

        let fb = ForwardBackward {
            forward,
            backward,
            scales,
            backward_scales,
            termination,
        };
        debug!("log likelihood {}", fb.log_likelihood());
        Ok(fb)
    }

    /// Returns the scaled forward table, the scaling coefficients, and the last scaled row.
    fn forward(
        hmm: &HiddenMarkovModel,
        ys: &[usize],
    ) -> Result<(StateIndexedSeries<f64>, Vec<f64>, Array1<f64>)> {
        let mut forward = StateIndexedSeries::new(hmm.states());
        let mut scales = Vec::with_capacity(ys.len());
        let mut alpha = hmm.begin() * &hmm.b().column(ys[0]);

        for (t, &y) in ys.iter().enumerate() {
            if t > 0 {
                alpha = alpha.dot(hmm.a()) * hmm.b().column(y);
            }
            let c = alpha
                .nip()
                .ok_or(Error::ImpossibleObservation { position: t })?;
            trace!("forward scale at {}: {}", t, c);
            scales.push(c);
            forward.put_row(t, alpha.view())?;
        }
        Ok((forward, scales, alpha))
    }

    fn backward(
        &self,
        hmm: &HiddenMarkovModel,
        ys: &[usize],
        scales: &[f64],
    ) -> Result<(StateIndexedSeries<f64>, Vec<f64>)> {
        let t_max = ys.len() - 1;
        let mut backward = StateIndexedSeries::filled(hmm.states(), ys.len(), 0.0);
        let mut backward_scales = vec![0.0; ys.len()];
        let mut beta: Array1<f64> = hmm.end().to_owned();

        for t in (0..=t_max).rev() {
            // `beta` holds the successor values: the end priors at the last position, otherwise
            // the scaled row for t + 1
            let successors = &beta * &hmm.b().column(ys[t]);
            beta = hmm.a().dot(&successors);
            let c = match self.scaling {
                Scaling::Shared => {
                    beta /= scales[t];
                    scales[t]
                }
                Scaling::PerRow => beta
                    .nip()
                    .ok_or(Error::ImpossibleObservation { position: t })?,
            };
            trace!("backward scale at {}: {}", t, c);
            backward_scales[t] = c;
            backward.put_row(t, beta.view())?;
        }
        Ok((backward, backward_scales))
    }
}
