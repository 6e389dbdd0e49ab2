#![cfg_attr(feature = "benchmark", feature(test))]
//! This library decodes the hidden states behind a sequence of discrete observations, given a
//! time-invariant Hidden Markov model whose states and emissions are identified by string labels.
//! It includes most-probable-path decoding via the Viterbi algorithm, per-position decoding via the
//! forward-backward algorithm, and sampling of synthetic trajectories from a model.
//!
//! See [`HiddenMarkovModel`](struct.HiddenMarkovModel.html) for how to build a model, and
//! [`Decoder`](trait.Decoder.html) for the two decoding strategies.
//!
//! Below, the umbrella world decides whether it rained on each of five days:
//!
//! ```
//! use hmmdecode::{presets, Decoder, Decoding, PosteriorDecoder, ViterbiDecoder};
//!
//! fn main() -> Result<(), hmmdecode::Error> {
//!     let mut hmm = presets::weather()?;
//!     presets::add_weather_test_sequence(&mut hmm)?;
//!
//!     let viterbi = ViterbiDecoder.decode(&hmm)?;
//!     assert_eq!(viterbi.states(), &["Rain", "Rain", "No Rain", "Rain", "Rain"]);
//!
//!     let posterior = PosteriorDecoder::default().decode(&hmm)?;
//!     assert_eq!(posterior.states(), viterbi.states());
//!     Ok(())
//! }
//! ```
//!
//! Trajectories are drawn with a caller-supplied random source, so a seeded generator gives
//! reproducible data:
//!
//! ```
//! use hmmdecode::{presets, SequenceSampler};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let hmm = presets::casino().unwrap();
//! let mut rng = StdRng::seed_from_u64(1337);
//! let trajectory = SequenceSampler::new(&mut rng).sample(&hmm, 100).unwrap();
//! assert_eq!(100, trajectory.emissions.len());
//! ```
//!
//! ## Building
//!
//! There is a small amount of benchmarking functionality gated by the `benchmark` feature, which
//! requires nightly. The `serde-1` feature derives `Serialize` and `Deserialize` for the model and
//! its tables. Deserialized values are validated exactly like constructed ones.
//!
//! ## Notes
//!
//! Chapter 3 of *Biological Sequence Analysis* by Durbin, Eddy, Krogh and Mitchison, 1998 was
//! the reference for the begin and end priors, and for the casino example. Section 13.2 of
//! *Pattern Recognition and Machine Learning* by Christopher Bishop, 2006 covers the scaled
//! forward-backward recursions.
//!
//! The math notation is meant to be readable both as rendered HTML and from the source code.
#[cfg(feature = "benchmark")]
extern crate test;

mod decoding;
mod error;
mod forward_backward;
mod metrics;
mod model;
mod ndarray_utils;
mod posterior;
pub mod presets;
mod sample;
mod series;
mod table;
mod viterbi;

pub use self::decoding::{Decoder, Decoding};
pub use self::error::{Error, Result};
pub use self::forward_backward::{ForwardBackward, ForwardBackwardEngine, Scaling};
pub use self::metrics::{count_transitions, Comparison, ConfusionCounts};
pub use self::model::HiddenMarkovModel;
pub use self::posterior::{posterior_from_tables, PosteriorDecoder, PosteriorDecoding};
pub use self::sample::{
    roulette_wheel, RouletteWheel, Sample, SampleIter, SequenceSampler, Trajectory,
    MIN_WEIGHT_SUM,
};
pub use self::series::StateIndexedSeries;
pub use self::table::{LabelKind, LabelSet, ProbabilityTable};
pub use self::viterbi::{ViterbiDecoder, ViterbiDecoding};

/// How far below 1 a probability row may sum and still be accepted. Chosen completely arbitrarily.
pub const ROW_TOLERANCE: f64 = 1e-5;

/// How far above 1 a probability row or a set of sampling weights may sum. This absorbs summation
/// error, e.g. six weights of 1/6 can sum to slightly more than 1.
pub const SUM_SLACK: f64 = 1e-9;
