use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::FeatureBuffer;
use crate::codec::{check_start, expect_width, resolve_steps, Codec};
use crate::note::{Note, NoteSequence};
use crate::{Error, Result};

/// Label for a step where nothing changes: the current note sustains, or
/// silence continues.
pub const CONTINUE: usize = 0;
/// Label that ends the sounding note.
pub const NOTE_OFF: usize = 1;
/// Label of the lowest pitch; pitch labels run upward from here.
pub const FIRST_PITCH: usize = 2;

/// Construction arguments for [`MelodyCodec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MelodyArgs {
    #[serde(default, alias = "numSteps")]
    pub step_count: Option<usize>,
    pub min_pitch: u8,
    pub max_pitch: u8,
    /// Skip overlapping notes instead of failing.
    #[serde(default)]
    pub ignore_polyphony: bool,
}

/// Monophonic melody as one categorical label per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MelodyCodec {
    step_count: Option<usize>,
    min_pitch: u8,
    max_pitch: u8,
    ignore_polyphony: bool,
}

impl MelodyCodec {
    pub fn new(args: MelodyArgs) -> Result<Self> {
        if args.min_pitch > args.max_pitch || args.max_pitch > 127 {
            return Err(Error::InvalidConfig(format!(
                "melody pitch range [{}, {}] is not a valid MIDI range",
                args.min_pitch, args.max_pitch
            )));
        }

        Ok(Self {
            step_count: args.step_count,
            min_pitch: args.min_pitch,
            max_pitch: args.max_pitch,
            ignore_polyphony: args.ignore_polyphony,
        })
    }

    pub fn min_pitch(&self) -> u8 {
        self.min_pitch
    }

    pub fn max_pitch(&self) -> u8 {
        self.max_pitch
    }

    /// Same pitch range and polyphony handling with a different step count.
    pub(crate) fn with_step_count(&self, step_count: Option<usize>) -> Self {
        Self {
            step_count,
            ..self.clone()
        }
    }

    /// Per-step labels for `sequence` over `steps` steps.
    pub fn labels(&self, sequence: &NoteSequence, steps: usize) -> Result<Vec<usize>> {
        let mut notes: Vec<&Note> = sequence.notes.iter().collect();
        notes.sort_by_key(|n| n.quantized_start_step);

        let mut labels = vec![CONTINUE; steps];
        let mut previous_end: Option<u32> = None;

        for note in notes {
            if let Some(end) = previous_end {
                if note.quantized_start_step < end {
                    if self.ignore_polyphony {
                        debug!(
                            pitch = note.pitch,
                            start = note.quantized_start_step,
                            "skipping overlapping melody note"
                        );
                        continue;
                    }
                    return Err(Error::NotMonophonic {
                        start: note.quantized_start_step,
                        previous_end: end,
                    });
                }
            }

            if note.pitch < self.min_pitch || note.pitch > self.max_pitch {
                return Err(Error::PitchOutOfRange {
                    pitch: note.pitch,
                    min: self.min_pitch,
                    max: self.max_pitch,
                });
            }

            let start = check_start(note.quantized_start_step, steps)?;
            let end = note.quantized_end_step as usize;
            if end > steps {
                return Err(Error::StepOutOfRange {
                    step: note.quantized_end_step,
                    steps,
                });
            }

            labels[start] = (note.pitch - self.min_pitch) as usize + FIRST_PITCH;
            // A note ending on the last step boundary needs no note-off.
            if end < steps {
                labels[end] = NOTE_OFF;
            }
            previous_end = Some(note.quantized_end_step);
        }

        Ok(labels)
    }

    /// Rebuild notes from per-step labels.
    ///
    /// A pitch label closes any open note before opening its own, so back to
    /// back notes need no note-off between them. A note still open at the
    /// end is closed at the final step boundary.
    pub fn notes_from_labels(&self, labels: &[usize]) -> NoteSequence {
        let mut sequence = NoteSequence::new(labels.len() as u32);
        let mut open: Option<Note> = None;

        for (step, &label) in labels.iter().enumerate() {
            let step = step as u32;
            match label {
                CONTINUE => {}
                NOTE_OFF => {
                    if let Some(mut note) = open.take() {
                        note.quantized_end_step = step;
                        sequence.push(note);
                    }
                }
                _ => {
                    if let Some(mut note) = open.take() {
                        note.quantized_end_step = step;
                        sequence.push(note);
                    }
                    let pitch = self.min_pitch as usize + label - FIRST_PITCH;
                    open = Some(Note::new(pitch as u8, step, step + 1));
                }
            }
        }

        if let Some(mut note) = open {
            note.quantized_end_step = labels.len() as u32;
            sequence.push(note);
        }

        sequence
    }
}

impl Codec for MelodyCodec {
    fn step_count(&self) -> Option<usize> {
        self.step_count
    }

    fn depth(&self) -> usize {
        (self.max_pitch - self.min_pitch) as usize + FIRST_PITCH + 1
    }

    fn encode(&self, sequence: &NoteSequence) -> Result<FeatureBuffer> {
        let steps = resolve_steps(self.step_count, sequence);
        let labels = self.labels(sequence, steps)?;

        debug!(steps, depth = self.depth(), notes = sequence.len(), "encoded melody");
        FeatureBuffer::one_hot(&labels, self.depth())
    }

    fn decode(&self, features: &FeatureBuffer) -> Result<NoteSequence> {
        expect_width(features, self.depth())?;
        let sequence = self.notes_from_labels(&features.arg_max_rows());

        debug!(steps = features.steps(), notes = sequence.len(), "decoded melody");
        Ok(sequence)
    }
}
