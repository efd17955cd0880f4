use crate::buffer::FeatureBuffer;
use crate::note::NoteSequence;
use crate::{Error, Result};

/// A bidirectional mapping between note sequences and feature buffers.
///
/// Implementations are immutable after construction, so one instance can
/// serve concurrent callers.
pub trait Codec: Send + Sync {
    /// Configured step count. `None` means each input sequence supplies its
    /// own `total_quantized_steps`.
    fn step_count(&self) -> Option<usize>;

    /// Feature columns per step.
    fn depth(&self) -> usize;

    /// Number of independently encoded feature groups; 0 for leaf codecs.
    fn segment_count(&self) -> usize {
        0
    }

    /// Encode into a `[steps, depth]` buffer.
    fn encode(&self, sequence: &NoteSequence) -> Result<FeatureBuffer>;

    fn decode(&self, features: &FeatureBuffer) -> Result<NoteSequence>;

    /// Decode and record the quantization resolution on the result.
    fn decode_quantized(
        &self,
        features: &FeatureBuffer,
        steps_per_quarter: u32,
    ) -> Result<NoteSequence> {
        let mut sequence = self.decode(features)?;
        sequence.steps_per_quarter = Some(steps_per_quarter);
        Ok(sequence)
    }
}

/// Step count for one encode call: the configured override, else the
/// sequence's own length.
pub(crate) fn resolve_steps(configured: Option<usize>, sequence: &NoteSequence) -> usize {
    configured.unwrap_or(sequence.total_quantized_steps as usize)
}

pub(crate) fn expect_width(features: &FeatureBuffer, width: usize) -> Result<()> {
    if features.width() != width {
        return Err(Error::ShapeMismatch {
            expected: format!("[steps, {}]", width),
            actual: format!("[{}, {}]", features.steps(), features.width()),
        });
    }
    Ok(())
}

/// Fail when a note starting at `step` falls outside a window of `steps`.
pub(crate) fn check_start(step: u32, steps: usize) -> Result<usize> {
    let index = step as usize;
    if index >= steps {
        return Err(Error::StepOutOfRange { step, steps });
    }
    Ok(index)
}
