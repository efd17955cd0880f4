use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::FeatureBuffer;
use crate::codec::{check_start, expect_width, resolve_steps, Codec};
use crate::note::{Note, NoteSequence};
use crate::pitch_class::PitchClassTable;
use crate::{Error, Result};

/// Construction arguments shared by the drum codecs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrumsArgs {
    #[serde(default, alias = "numSteps")]
    pub step_count: Option<usize>,
    /// Defaults to the nine-class General MIDI drum table.
    #[serde(default)]
    pub pitch_classes: Option<PitchClassTable>,
}

/// How [`DrumsCodec`] reads the buffers it decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// One-hot rows whose active column is a drum-class bitmask
    /// (`2^classes` columns).
    Labeled,
    /// The multi-hot roll itself, with or without the silence column.
    Raw,
}

/// Drum pattern as a multi-hot roll: one column per drum class plus a
/// trailing silence column that is set on steps with no hits.
#[derive(Debug, Clone, PartialEq)]
pub struct DrumsCodec {
    step_count: Option<usize>,
    pitch_classes: PitchClassTable,
    mode: DecodeMode,
}

impl DrumsCodec {
    pub fn new(args: DrumsArgs, mode: DecodeMode) -> Self {
        Self {
            step_count: args.step_count,
            pitch_classes: args.pitch_classes.unwrap_or_default(),
            mode,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    pub fn pitch_classes(&self) -> &PitchClassTable {
        &self.pitch_classes
    }

    fn decode_raw(&self, features: &FeatureBuffer) -> Result<NoteSequence> {
        let classes = self.pitch_classes.class_count();
        if features.width() != classes && features.width() != classes + 1 {
            return Err(Error::ShapeMismatch {
                expected: format!("[steps, {}] or [steps, {}]", classes, classes + 1),
                actual: format!("[{}, {}]", features.steps(), features.width()),
            });
        }

        let mut sequence = NoteSequence::new(features.steps() as u32);
        for step in 0..features.steps() {
            for class in 0..classes {
                if features.get(step, class) > 0.5 {
                    push_hit(&mut sequence, &self.pitch_classes, class, step);
                }
            }
        }
        Ok(sequence)
    }
}

impl Codec for DrumsCodec {
    fn step_count(&self) -> Option<usize> {
        self.step_count
    }

    fn depth(&self) -> usize {
        self.pitch_classes.class_count() + 1
    }

    fn encode(&self, sequence: &NoteSequence) -> Result<FeatureBuffer> {
        let steps = resolve_steps(self.step_count, sequence);
        let masks = hit_masks(&self.pitch_classes, sequence, steps)?;
        let silence = self.pitch_classes.class_count();

        let mut roll = FeatureBuffer::zeros(steps, self.depth());
        for (step, &mask) in masks.iter().enumerate() {
            if mask == 0 {
                roll.set(step, silence, 1.0);
                continue;
            }
            for class in 0..silence {
                if (mask >> class) & 1 == 1 {
                    roll.set(step, class, 1.0);
                }
            }
        }

        debug!(steps, depth = self.depth(), notes = sequence.len(), "encoded drum roll");
        Ok(roll)
    }

    fn decode(&self, features: &FeatureBuffer) -> Result<NoteSequence> {
        let sequence = match self.mode {
            DecodeMode::Labeled => {
                expect_width(features, label_space(&self.pitch_classes))?;
                notes_from_labels(&self.pitch_classes, &features.arg_max_rows())
            }
            DecodeMode::Raw => self.decode_raw(features)?,
        };

        debug!(
            mode = ?self.mode,
            steps = features.steps(),
            notes = sequence.len(),
            "decoded drum roll"
        );
        Ok(sequence)
    }
}

/// Drum pattern as one categorical label per step. The label is the set of
/// drum classes hit on that step read as a binary number, so label 0 means
/// no drums.
#[derive(Debug, Clone, PartialEq)]
pub struct DrumsOneHotCodec {
    step_count: Option<usize>,
    pitch_classes: PitchClassTable,
}

impl DrumsOneHotCodec {
    pub fn new(args: DrumsArgs) -> Self {
        Self {
            step_count: args.step_count,
            pitch_classes: args.pitch_classes.unwrap_or_default(),
        }
    }

    pub fn pitch_classes(&self) -> &PitchClassTable {
        &self.pitch_classes
    }
}

impl Codec for DrumsOneHotCodec {
    fn step_count(&self) -> Option<usize> {
        self.step_count
    }

    fn depth(&self) -> usize {
        label_space(&self.pitch_classes)
    }

    fn encode(&self, sequence: &NoteSequence) -> Result<FeatureBuffer> {
        let steps = resolve_steps(self.step_count, sequence);
        let labels: Vec<usize> = hit_masks(&self.pitch_classes, sequence, steps)?
            .into_iter()
            .map(|mask| mask as usize)
            .collect();

        debug!(steps, depth = self.depth(), notes = sequence.len(), "encoded one-hot drums");
        FeatureBuffer::one_hot(&labels, self.depth())
    }

    fn decode(&self, features: &FeatureBuffer) -> Result<NoteSequence> {
        expect_width(features, self.depth())?;
        let sequence = notes_from_labels(&self.pitch_classes, &features.arg_max_rows());

        debug!(steps = features.steps(), notes = sequence.len(), "decoded one-hot drums");
        Ok(sequence)
    }
}

fn label_space(pitch_classes: &PitchClassTable) -> usize {
    1 << pitch_classes.class_count()
}

/// Per-step bitmask of drum classes with a note starting on that step.
fn hit_masks(
    pitch_classes: &PitchClassTable,
    sequence: &NoteSequence,
    steps: usize,
) -> Result<Vec<u32>> {
    let mut masks = vec![0u32; steps];
    for note in &sequence.notes {
        let class = pitch_classes.class_of(note.pitch)?;
        let step = check_start(note.quantized_start_step, steps)?;
        masks[step] |= 1 << class;
    }
    Ok(masks)
}

/// Expand each step's label bits, low to high, into one-step drum hits.
fn notes_from_labels(pitch_classes: &PitchClassTable, labels: &[usize]) -> NoteSequence {
    let mut sequence = NoteSequence::new(labels.len() as u32);
    for (step, &label) in labels.iter().enumerate() {
        for class in 0..pitch_classes.class_count() {
            if (label >> class) & 1 == 1 {
                push_hit(&mut sequence, pitch_classes, class, step);
            }
        }
    }
    sequence
}

fn push_hit(sequence: &mut NoteSequence, pitch_classes: &PitchClassTable, class: usize, step: usize) {
    if let Some(pitch) = pitch_classes.representative_pitch(class) {
        sequence.push(Note::drum(pitch, step as u32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_class_args(step_count: Option<usize>) -> DrumsArgs {
        DrumsArgs {
            step_count,
            pitch_classes: Some(PitchClassTable::new(vec![vec![36], vec![38]]).unwrap()),
        }
    }

    fn kick_on_first_step() -> NoteSequence {
        NoteSequence::with_notes(2, vec![Note::drum(36, 0)])
    }

    #[test]
    fn roll_sets_class_and_silence_columns() {
        let codec = DrumsCodec::new(two_class_args(None), DecodeMode::Labeled);
        assert_eq!(codec.depth(), 3);

        let roll = codec.encode(&kick_on_first_step()).unwrap();
        let expected = FeatureBuffer::from_rows(&[vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]]).unwrap();
        assert_eq!(roll, expected);
    }

    #[test]
    fn one_hot_label_is_class_bitmask() {
        let codec = DrumsOneHotCodec::new(two_class_args(None));
        assert_eq!(codec.depth(), 4);

        let encoded = codec.encode(&kick_on_first_step()).unwrap();
        assert_eq!(encoded.shape(), (2, 4));
        assert_eq!(encoded.arg_max_rows(), vec![1, 0]);
    }

    #[test]
    fn simultaneous_hits_combine_into_one_label() {
        let codec = DrumsOneHotCodec::new(two_class_args(Some(1)));
        let sequence = NoteSequence::with_notes(1, vec![Note::drum(38, 0), Note::drum(36, 0)]);
        assert_eq!(codec.encode(&sequence).unwrap().arg_max_rows(), vec![3]);
    }

    #[test]
    fn repeated_hit_on_same_class_does_not_change_label() {
        let codec = DrumsOneHotCodec::new(two_class_args(Some(1)));
        let sequence = NoteSequence::with_notes(1, vec![Note::drum(36, 0), Note::drum(36, 0)]);
        assert_eq!(codec.encode(&sequence).unwrap().arg_max_rows(), vec![1]);
    }

    #[test]
    fn labeled_decode_emits_notes_low_bit_first() {
        let codec = DrumsCodec::new(two_class_args(None), DecodeMode::Labeled);
        let labels = FeatureBuffer::one_hot(&[3, 0, 2], 4).unwrap();

        let decoded = codec.decode(&labels).unwrap();
        assert_eq!(
            decoded.notes,
            vec![Note::drum(36, 0), Note::drum(38, 0), Note::drum(38, 2)]
        );
        assert_eq!(decoded.total_quantized_steps, 3);
    }

    #[test]
    fn labeled_decode_rejects_roll_width() {
        let codec = DrumsCodec::new(two_class_args(None), DecodeMode::Labeled);
        let roll = codec.encode(&kick_on_first_step()).unwrap();
        assert!(matches!(codec.decode(&roll), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn raw_decode_reads_roll_directly() {
        let codec = DrumsCodec::new(two_class_args(None), DecodeMode::Raw);
        let sequence = NoteSequence::with_notes(
            4,
            vec![Note::drum(36, 0), Note::drum(38, 0), Note::drum(38, 3)],
        );

        let roll = codec.encode(&sequence).unwrap();
        let decoded = codec.decode(&roll).unwrap();
        assert_eq!(decoded.notes, sequence.notes);
    }

    #[test]
    fn raw_decode_accepts_roll_without_silence_column() {
        let codec = DrumsCodec::new(two_class_args(None), DecodeMode::Raw);
        let roll = FeatureBuffer::from_rows(&[vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        assert_eq!(codec.decode(&roll).unwrap().notes, vec![Note::drum(38, 0)]);

        let too_wide = FeatureBuffer::zeros(2, 4);
        assert!(matches!(codec.decode(&too_wide), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn one_hot_round_trip_uses_representative_pitches() {
        let codec = DrumsOneHotCodec::new(DrumsArgs {
            step_count: Some(4),
            pitch_classes: None,
        });
        // 35 shares the bass drum class with 36, 40 the snare class with 38
        let sequence = NoteSequence::with_notes(
            4,
            vec![Note::drum(35, 0), Note::drum(42, 0), Note::drum(40, 2), Note::drum(51, 3)],
        );

        let decoded = codec.decode(&codec.encode(&sequence).unwrap()).unwrap();
        assert_eq!(
            decoded.notes,
            vec![Note::drum(36, 0), Note::drum(42, 0), Note::drum(38, 2), Note::drum(51, 3)]
        );
        assert_eq!(codec.depth(), 512);
    }

    #[test]
    fn unmapped_pitch_fails_encode() {
        let codec = DrumsOneHotCodec::new(two_class_args(None));
        let sequence = NoteSequence::with_notes(2, vec![Note::drum(42, 0)]);
        assert_eq!(codec.encode(&sequence), Err(Error::UnmappedPitch(42)));
    }

    #[test]
    fn hit_past_last_step_fails_encode() {
        let codec = DrumsCodec::new(two_class_args(Some(2)), DecodeMode::Raw);
        let sequence = NoteSequence::with_notes(8, vec![Note::drum(36, 2)]);
        assert_eq!(
            codec.encode(&sequence),
            Err(Error::StepOutOfRange { step: 2, steps: 2 })
        );
    }

    #[test]
    fn configured_steps_override_sequence_length() {
        let codec = DrumsCodec::new(two_class_args(Some(5)), DecodeMode::Raw);
        let roll = codec.encode(&kick_on_first_step()).unwrap();
        assert_eq!(roll.shape(), (5, 3));
    }
}
