//! Most probable path decoding.

use crate::decoding::{Decoder, Decoding};
use crate::error::{Error, Result};
use crate::model::HiddenMarkovModel;
use crate::ndarray_utils::*;
use crate::series::StateIndexedSeries;
use log::{debug, warn};
use ndarray::prelude::*;

/// The tables and path produced by [`ViterbiDecoder`].
#[derive(Clone, Debug, PartialEq)]
pub struct ViterbiDecoding {
    /// `log_probabilities[(i, t)]` is the natural-log probability of the most likely path that
    /// explains observations $0..=t$ and ends in state $i$
    pub log_probabilities: StateIndexedSeries<f64>,
    /// `backpointers[(i, t)]` is the state at $t - 1$ on that path. At $t = 0$ it is $i$ itself.
    pub backpointers: StateIndexedSeries<usize>,
    path: Vec<usize>,
    states: Vec<String>,
    log_probability: f64,
}

impl ViterbiDecoding {
    /// The decoded path as state indices
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// The natural-log joint probability of the decoded path and the observations, including the
    /// begin and end priors. Negative infinity if no path can explain the observations.
    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }
}

impl Decoding for ViterbiDecoding {
    fn states(&self) -> &[String] {
        &self.states
    }
}

/// This is the Viterbi algorithm. Given a sequence of observations, return the most likely
/// sequence of states.
///
/// The recurrence runs in log space, so a probability of exactly zero becomes negative infinity and
/// simply loses every comparison. Ties are resolved in favour of the state that comes first in the
/// model's declared order, both when choosing a predecessor and when choosing the final state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ViterbiDecoder;

impl ViterbiDecoder {
    pub(crate) fn decode_encoded(
        &self,
        hmm: &HiddenMarkovModel,
        ys: &[usize],
    ) -> Result<ViterbiDecoding> {
        if ys.is_empty() {
            return Err(Error::EmptyObservationSequence);
        }
        let n = hmm.n();
        debug!("viterbi over {} observations and {} states", ys.len(), n);

        let log_a = hmm.a().mapv(f64::ln);
        let log_b = hmm.b().mapv(f64::ln);

        let mut log_probabilities = StateIndexedSeries::new(hmm.states());
        let mut backpointers = StateIndexedSeries::new(hmm.states());

        let mut delta = hmm.begin().mapv(f64::ln) + log_b.column(ys[0]);
        log_probabilities.put_row(0, delta.view())?;
        backpointers.put_row(0, Array1::from_iter(0..n).view())?;

        for (t, &y) in ys.iter().enumerate().skip(1) {
            let mut next = Array1::from_elem(n, f64::NEG_INFINITY);
            let mut prev_x = Array1::zeros(n);
            for j in 0..n {
                // The emission term is the same for every predecessor, so it is added afterwards
                let (i, best) = (&delta + &log_a.column(j))
                    .maxf()
                    .unwrap_or((0, f64::NEG_INFINITY));
                next[j] = best + log_b[(j, y)];
                prev_x[j] = i;
            }
            log_probabilities.put_row(t, next.view())?;
            backpointers.put_row(t, prev_x.view())?;
            delta = next;
        }

        let (mut i, log_probability) = (&delta + &hmm.end().mapv(f64::ln))
            .maxf()
            .unwrap_or((0, f64::NEG_INFINITY));
        if log_probability == f64::NEG_INFINITY {
            warn!("no path can explain the observations; returning the first candidate");
        }

        let mut path = vec![0; ys.len()];
        path[ys.len() - 1] = i;
        for t in (1..ys.len()).rev() {
            i = backpointers.at(i, t)?;
            path[t - 1] = i;
        }
        debug!("viterbi path log probability {}", log_probability);

        Ok(ViterbiDecoding {
            states: hmm.states().decode(&path)?,
            log_probabilities,
            backpointers,
            path,
            log_probability,
        })
    }
}

impl Decoder for ViterbiDecoder {
    type Output = ViterbiDecoding;

    fn decode_observations<S: AsRef<str>>(
        &self,
        hmm: &HiddenMarkovModel,
        observations: &[S],
    ) -> Result<ViterbiDecoding> {
        if observations.is_empty() {
            return Err(Error::EmptyObservationSequence);
        }
        self.decode_encoded(hmm, &hmm.emissions().encode(observations)?)
    }
}
