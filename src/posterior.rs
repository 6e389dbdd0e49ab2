//! Per-position marginal decoding.
//!
//! The posterior table has $T + 1$ positions. Position $t$ combines the forward value at $t - 1$
//! with the backward value at $t$, so it holds the probability of each state at observed position
//! $t - 1$:
//!
//! $$
//! γ_i(0) ∝ π_i β_i(0), \qquad γ_i(t) ∝ α_i(t-1) β_i(t), \qquad γ_i(T) ∝ α_i(T-1) ε_i
//! $$
//!
//! Each position is renormalised to sum to 1, so the scaling of the forward and backward tables
//! cancels out. Observed position $t$ is decoded from posterior position $t + 1$.
//!
//! Position 0 weights the begin prior with the first transition, so it can have no mass even when
//! the observations are possible. It is then left as all zeros; no observed position reads it.

use crate::decoding::{Decoder, Decoding};
use crate::error::{Error, Result};
use crate::forward_backward::{ForwardBackward, ForwardBackwardEngine};
use crate::model::HiddenMarkovModel;
use crate::ndarray_utils::*;
use crate::series::StateIndexedSeries;
use log::{debug, warn};
use ndarray::prelude::*;

/// The tables and path produced by [`PosteriorDecoder`].
#[derive(Clone, Debug, PartialEq)]
pub struct PosteriorDecoding {
    pub forward_backward: ForwardBackward,
    /// $T + 1$ positions, each summing to 1 across states. Position 0 may be all zeros.
    pub posterior: StateIndexedSeries<f64>,
    path: Vec<usize>,
    states: Vec<String>,
}

impl PosteriorDecoding {
    /// The decoded path as state indices
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// The probability of each state at observed position `t`, in declared state order.
    pub fn marginals(&self, t: usize) -> Result<Array1<f64>> {
        self.posterior.row(t + 1)
    }
}

impl Decoding for PosteriorDecoding {
    fn states(&self) -> &[String] {
        &self.states
    }
}

/// Combine forward and backward tables over `len` observations into the posterior table.
///
/// Fails with `InconsistentTableLengths` unless both tables have exactly `len` positions, and with
/// `ImpossibleObservation` if a posterior position other than 0 has no probability mass.
pub fn posterior_from_tables(
    hmm: &HiddenMarkovModel,
    fb: &ForwardBackward,
    len: usize,
) -> Result<StateIndexedSeries<f64>> {
    if len == 0 {
        return Err(Error::EmptyObservationSequence);
    }
    if fb.forward.len() != len || fb.backward.len() != len {
        return Err(Error::InconsistentTableLengths {
            expected: len,
            forward: fb.forward.len(),
            backward: fb.backward.len(),
        });
    }

    let mut posterior = StateIndexedSeries::new(hmm.states());
    for t in 0..=len {
        let mut gamma = if t == 0 {
            hmm.begin() * &fb.backward.row(0)?
        } else if t == len {
            fb.forward.row(len - 1)? * hmm.end()
        } else {
            fb.forward.row(t - 1)? * fb.backward.row(t)?
        };
        match gamma.nip() {
            Some(_) => {}
            None if t == 0 => warn!("posterior position 0 has no mass; leaving it as zeros"),
            None => return Err(Error::ImpossibleObservation { position: t }),
        }
        posterior.put_row(t, gamma.view())?;
    }
    Ok(posterior)
}

/// Decodes each position independently, choosing the state with the highest posterior
/// probability. Ties go to the state that comes first in the model's declared order.
///
/// Taking the most likely state at each point in time doesn't necessarily result in the most
/// likely sequence of states, or even a possible sequence of states. If you want that, use
/// [`ViterbiDecoder`](crate::ViterbiDecoder).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PosteriorDecoder {
    engine: ForwardBackwardEngine,
}

impl PosteriorDecoder {
    pub fn with_engine(engine: ForwardBackwardEngine) -> Self {
        Self { engine }
    }

    pub(crate) fn decode_encoded(
        &self,
        hmm: &HiddenMarkovModel,
        ys: &[usize],
    ) -> Result<PosteriorDecoding> {
        let forward_backward = self.engine.run_encoded(hmm, ys)?;
        let posterior = posterior_from_tables(hmm, &forward_backward, ys.len())?;

        let path = (1..=ys.len())
            .map(|t| Ok(posterior.row(t)?.maxf().map_or(0, |(i, _p)| i)))
            .collect::<Result<Vec<usize>>>()?;
        debug!("posterior decoding of {} observations", ys.len());

        Ok(PosteriorDecoding {
            states: hmm.states().decode(&path)?,
            forward_backward,
            posterior,
            path,
        })
    }
}

impl Decoder for PosteriorDecoder {
    type Output = PosteriorDecoding;

    fn decode_observations<S: AsRef<str>>(
        &self,
        hmm: &HiddenMarkovModel,
        observations: &[S],
    ) -> Result<PosteriorDecoding> {
        if observations.is_empty() {
            return Err(Error::EmptyObservationSequence);
        }
        self.decode_encoded(hmm, &hmm.emissions().encode(observations)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward_backward::Scaling;
    use crate::presets;
    use crate::tests::{all_paths, new_rng, random_hmm, random_observations};
    use crate::viterbi::ViterbiDecoder;
    use ndarray::array;
    use spectral::prelude::*;

    fn weather_with_sequence() -> HiddenMarkovModel {
        let mut hmm = presets::weather().unwrap();
        presets::add_weather_test_sequence(&mut hmm).unwrap();
        hmm
    }

    #[test]
    fn weather_posterior() {
        let decoding = PosteriorDecoder::default()
            .decode(&weather_with_sequence())
            .unwrap();
        assert_eq!(
            decoding.states(),
            &["Rain", "Rain", "No Rain", "Rain", "Rain"]
        );
        assert_eq!(6, decoding.posterior.len());
        let expected_rain = [
            0.6469355558301939,
            0.8673388895754847,
            0.8204190536236754,
            0.30748357600661774,
            0.8204190536236754,
            0.8673388895754848,
        ];
        for (t, &p) in expected_rain.iter().enumerate() {
            asserting("posterior Rain")
                .that(&decoding.posterior.get("Rain", t).unwrap())
                .is_close_to(p, 1e-12);
        }
        asserting("marginal No Rain at 2")
            .that(&decoding.marginals(2).unwrap()[1])
            .is_close_to(0.6925164239933822, 1e-12);
    }

    #[test]
    fn posterior_rows_sum_to_one() {
        let mut rng = new_rng();
        for n in 1..=4 {
            for t in 1..=25 {
                let hmm = random_hmm(n, 3, &mut rng);
                let ys = random_observations(&hmm, t, &mut rng);
                let decoding = PosteriorDecoder::default()
                    .decode_observations(&hmm, &ys)
                    .unwrap();
                assert_eq!(t + 1, decoding.posterior.len());
                assert_eq!(t, decoding.states().len());
                for i in 0..=t {
                    asserting("posterior row sum")
                        .that(&decoding.posterior.row(i).unwrap().sum())
                        .is_close_to(1.0, 1e-9);
                }
            }
        }
    }

    /// The marginal at each observed position must match brute force over every path
    #[test]
    fn marginals_match_enumeration() {
        let mut rng = new_rng();
        for n in 1..=3 {
            for t in 1..=5 {
                let hmm = random_hmm(n, 2, &mut rng);
                let ys = random_observations(&hmm, t, &mut rng);
                let encoded = hmm.emissions().encode(&ys).unwrap();
                let mut expected = Array2::<f64>::zeros((t, n));
                for xs in all_paths(n, t) {
                    let p = hmm.ll_given_states(&xs, &encoded).exp();
                    for (i, &x) in xs.iter().enumerate() {
                        expected[(i, x)] += p;
                    }
                }
                let decoding = PosteriorDecoder::default()
                    .decode_observations(&hmm, &ys)
                    .unwrap();
                for i in 0..t {
                    let row = expected.row(i);
                    let marginals = decoding.marginals(i).unwrap();
                    for x in 0..n {
                        asserting("marginal")
                            .that(&marginals[x])
                            .is_close_to(row[x] / row.sum(), 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn scaling_does_not_change_posterior() {
        let mut rng = new_rng();
        let hmm = random_hmm(3, 4, &mut rng);
        let ys = random_observations(&hmm, 40, &mut rng);
        let shared = PosteriorDecoder::with_engine(ForwardBackwardEngine::new(Scaling::Shared))
            .decode_observations(&hmm, &ys)
            .unwrap();
        let per_row = PosteriorDecoder::with_engine(ForwardBackwardEngine::new(Scaling::PerRow))
            .decode_observations(&hmm, &ys)
            .unwrap();
        assert_eq!(shared.path(), per_row.path());
        for t in 0..=40 {
            let a = shared.posterior.row(t).unwrap();
            let b = per_row.posterior.row(t).unwrap();
            for (x, y) in a.iter().zip(b.iter()) {
                asserting("posterior").that(x).is_close_to(*y, 1e-12);
            }
        }
    }

    #[test]
    fn inconsistent_lengths() {
        let hmm = weather_with_sequence();
        let fb = ForwardBackwardEngine::default().run(&hmm).unwrap();
        assert_eq!(
            Err(Error::InconsistentTableLengths {
                expected: 6,
                forward: 5,
                backward: 5
            }),
            posterior_from_tables(&hmm, &fb, 6)
        );
    }

    #[test]
    fn empty_observations() {
        let hmm = presets::weather().unwrap();
        assert_eq!(
            Err(Error::EmptyObservationSequence),
            PosteriorDecoder::default().decode(&hmm)
        );
    }

    #[test]
    fn ties_prefer_first_state() {
        let hmm = HiddenMarkovModel::from_arrays(
            &["a", "b"],
            &["x"],
            array![[0.5, 0.5], [0.5, 0.5]],
            array![[1.0], [1.0]],
            array![0.5, 0.5],
            array![1.0, 1.0],
        )
        .unwrap();
        let decoding = PosteriorDecoder::default()
            .decode_observations(&hmm, &["x", "x"])
            .unwrap();
        assert_eq!(decoding.states(), &["a", "a"]);
    }

    /// The first observation pins the first state, but the begin prior can't reach it in one step
    #[test]
    fn empty_position_zero_still_decodes() {
        let hmm = HiddenMarkovModel::from_arrays(
            &["a", "b"],
            &["x", "y"],
            array![[0.0, 1.0], [1.0, 0.0]],
            array![[1.0, 0.0], [0.0, 1.0]],
            array![1.0, 0.0],
            array![1.0, 1.0],
        )
        .unwrap();
        let decoding = PosteriorDecoder::default()
            .decode_observations(&hmm, &["x", "y"])
            .unwrap();
        assert_eq!(decoding.states(), &["a", "b"]);
        assert_eq!(Ok(array![0.0, 0.0]), decoding.posterior.row(0));
        assert_eq!(Ok(array![1.0, 0.0]), decoding.marginals(0));
        assert_eq!(Ok(array![0.0, 1.0]), decoding.marginals(1));
        assert_eq!(
            decoding.states(),
            ViterbiDecoder.decode_observations(&hmm, &["x", "y"]).unwrap().states()
        );
    }
}
