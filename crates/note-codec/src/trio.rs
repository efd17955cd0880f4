use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::FeatureBuffer;
use crate::codec::{expect_width, resolve_steps, Codec};
use crate::drums::{DrumsArgs, DrumsOneHotCodec};
use crate::melody::{MelodyArgs, MelodyCodec};
use crate::note::{Note, NoteSequence};
use crate::Result;

/// General MIDI programs routed to the melody track.
pub const MELODY_PROGRAMS: RangeInclusive<u8> = 0..=31;
/// General MIDI programs routed to the bass track (the bass family).
pub const BASS_PROGRAMS: RangeInclusive<u8> = 32..=39;

const MELODY_INSTRUMENT: u32 = 0;
const BASS_INSTRUMENT: u32 = 1;
const DRUMS_INSTRUMENT: u32 = 2;

/// Construction arguments for [`TrioCodec`]. The shared step count
/// replaces whatever the sub-arguments set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrioArgs {
    #[serde(default, alias = "numSteps")]
    pub step_count: Option<usize>,
    #[serde(alias = "melArgs")]
    pub melody: MelodyArgs,
    #[serde(alias = "bassArgs")]
    pub bass: MelodyArgs,
    #[serde(default, alias = "drumsArgs")]
    pub drums: DrumsArgs,
}

/// Melody, bass and drums encoded side by side.
///
/// Features are laid out `[melody | bass | drums]` along the feature axis.
/// Notes that are neither drums nor on a melody or bass program are left
/// out of the encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct TrioCodec {
    step_count: Option<usize>,
    melody: MelodyCodec,
    bass: MelodyCodec,
    drums: DrumsOneHotCodec,
}

impl TrioCodec {
    pub fn new(args: TrioArgs) -> Result<Self> {
        let step_count = args.step_count;
        Ok(Self {
            step_count,
            melody: MelodyCodec::new(args.melody)?.with_step_count(step_count),
            bass: MelodyCodec::new(args.bass)?.with_step_count(step_count),
            drums: DrumsOneHotCodec::new(DrumsArgs {
                step_count,
                ..args.drums
            }),
        })
    }

    pub fn melody(&self) -> &MelodyCodec {
        &self.melody
    }

    pub fn bass(&self) -> &MelodyCodec {
        &self.bass
    }

    pub fn drums(&self) -> &DrumsOneHotCodec {
        &self.drums
    }

    fn segment_depths(&self) -> [usize; 3] {
        [self.melody.depth(), self.bass.depth(), self.drums.depth()]
    }
}

fn is_melody(note: &Note) -> bool {
    !note.is_drum && MELODY_PROGRAMS.contains(&note.program)
}

fn is_bass(note: &Note) -> bool {
    !note.is_drum && BASS_PROGRAMS.contains(&note.program)
}

fn is_drums(note: &Note) -> bool {
    note.is_drum
}

impl Codec for TrioCodec {
    fn step_count(&self) -> Option<usize> {
        self.step_count
    }

    fn depth(&self) -> usize {
        self.segment_depths().iter().sum()
    }

    fn segment_count(&self) -> usize {
        3
    }

    fn encode(&self, sequence: &NoteSequence) -> Result<FeatureBuffer> {
        let melody = sequence.filtered(is_melody);
        let bass = sequence.filtered(is_bass);
        let drums = sequence.filtered(is_drums);

        let dropped = sequence.len() - melody.len() - bass.len() - drums.len();
        if dropped > 0 {
            debug!(dropped, "trio encode left out notes outside melody, bass and drum tracks");
        }

        let features = FeatureBuffer::concat_features(&[
            self.melody.encode(&melody)?,
            self.bass.encode(&bass)?,
            self.drums.encode(&drums)?,
        ])?;

        debug!(
            steps = resolve_steps(self.step_count, sequence),
            depth = self.depth(),
            notes = sequence.len(),
            "encoded trio"
        );
        Ok(features)
    }

    fn decode(&self, features: &FeatureBuffer) -> Result<NoteSequence> {
        expect_width(features, self.depth())?;
        let parts = features.split_features(&self.segment_depths())?;

        let melody = self.melody.decode(&parts[0])?;
        let bass = self.bass.decode(&parts[1])?;
        let drums = self.drums.decode(&parts[2])?;

        let mut sequence = NoteSequence::new(features.steps() as u32);
        sequence.notes.extend(melody.notes.into_iter().map(|mut n| {
            n.instrument = MELODY_INSTRUMENT;
            n.program = *MELODY_PROGRAMS.start();
            n
        }));
        sequence.notes.extend(bass.notes.into_iter().map(|mut n| {
            n.instrument = BASS_INSTRUMENT;
            n.program = *BASS_PROGRAMS.start();
            n
        }));
        sequence.notes.extend(drums.notes.into_iter().map(|mut n| {
            n.instrument = DRUMS_INSTRUMENT;
            n
        }));

        debug!(steps = features.steps(), notes = sequence.len(), "decoded trio");
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch_class::PitchClassTable;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn args(step_count: Option<usize>) -> TrioArgs {
        TrioArgs {
            step_count,
            melody: MelodyArgs {
                step_count: None,
                min_pitch: 48,
                max_pitch: 83,
                ignore_polyphony: false,
            },
            bass: MelodyArgs {
                step_count: Some(99),
                min_pitch: 28,
                max_pitch: 59,
                ignore_polyphony: false,
            },
            drums: DrumsArgs {
                step_count: None,
                pitch_classes: Some(PitchClassTable::new(vec![vec![36], vec![38]]).unwrap()),
            },
        }
    }

    #[test]
    fn depth_is_sum_of_segments() {
        let codec = TrioCodec::new(args(Some(8))).unwrap();
        assert_eq!(codec.depth(), 38 + 34 + 4);
        assert_eq!(codec.segment_count(), 3);
        assert_eq!(codec.bass().step_count(), Some(8));
        assert_eq!(codec.drums().step_count(), Some(8));
    }

    #[test]
    fn round_trip_tags_each_track() {
        let codec = TrioCodec::new(args(Some(4))).unwrap();
        let sequence = NoteSequence::with_notes(
            4,
            vec![
                Note::drum(36, 1),
                Note::new(40, 0, 4).with_program(34),
                Note::new(60, 0, 2).with_program(5),
            ],
        );

        let features = codec.encode(&sequence).unwrap();
        assert_eq!(features.shape(), (4, 76));

        let decoded = codec.decode(&features).unwrap();
        let expected = vec![
            Note {
                instrument: 0,
                program: 0,
                ..Note::new(60, 0, 2)
            },
            Note {
                instrument: 1,
                program: 32,
                ..Note::new(40, 0, 4)
            },
            Note {
                instrument: 2,
                ..Note::drum(36, 1)
            },
        ];
        assert_eq!(decoded.notes, expected);
    }

    #[test]
    fn notes_outside_every_track_are_dropped() {
        let codec = TrioCodec::new(args(Some(4))).unwrap();
        let sequence = NoteSequence::with_notes(
            4,
            vec![
                Note::new(60, 0, 2).with_program(5),
                Note::new(64, 0, 4).with_program(48),
            ],
        );

        let decoded = codec.decode(&codec.encode(&sequence).unwrap()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.notes[0].pitch, 60);
    }

    #[test]
    fn drum_flag_wins_over_program() {
        let codec = TrioCodec::new(args(Some(2))).unwrap();
        let sequence = NoteSequence::with_notes(2, vec![Note::drum(38, 0).with_program(33)]);

        let decoded = codec.decode(&codec.encode(&sequence).unwrap()).unwrap();
        assert_eq!(decoded.notes.len(), 1);
        assert!(decoded.notes[0].is_drum);
        assert_eq!(decoded.notes[0].instrument, 2);
    }

    #[test]
    fn sub_codec_errors_surface() {
        let codec = TrioCodec::new(args(Some(4))).unwrap();
        let sequence = NoteSequence::with_notes(4, vec![Note::new(20, 0, 1).with_program(33)]);
        assert_eq!(
            codec.encode(&sequence),
            Err(Error::PitchOutOfRange {
                pitch: 20,
                min: 28,
                max: 59
            })
        );
    }

    #[test]
    fn decode_rejects_wrong_width() {
        let codec = TrioCodec::new(args(Some(4))).unwrap();
        let features = FeatureBuffer::zeros(4, 75);
        assert!(matches!(codec.decode(&features), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn steps_follow_input_without_override() {
        let codec = TrioCodec::new(args(None)).unwrap();
        let sequence = NoteSequence::with_notes(6, vec![Note::new(60, 0, 6)]);
        assert_eq!(codec.encode(&sequence).unwrap().shape(), (6, 76));
    }
}
