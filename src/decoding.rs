use crate::error::{Error, Result};
use crate::model::HiddenMarkovModel;

/// The result of decoding an observation sequence.
pub trait Decoding {
    /// The decoded hidden state of each observed position
    fn states(&self) -> &[String];
}

/// A strategy for explaining observations with hidden states.
pub trait Decoder {
    type Output: Decoding;

    /// Decode `observations` under `hmm`.
    ///
    /// Fails if `observations` is empty or contains a label that is not one of the model's
    /// emissions.
    fn decode_observations<S: AsRef<str>>(
        &self,
        hmm: &HiddenMarkovModel,
        observations: &[S],
    ) -> Result<Self::Output>;

    /// Decode the model's own emission sequence.
    fn decode(&self, hmm: &HiddenMarkovModel) -> Result<Self::Output> {
        let observations = hmm
            .emission_sequence()
            .ok_or(Error::EmptyObservationSequence)?;
        self.decode_observations(hmm, observations)
    }
}
