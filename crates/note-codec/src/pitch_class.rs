use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest class count a drum table may have; one-hot drum labels need
/// `2^classes` columns.
pub const MAX_PITCH_CLASSES: usize = 16;

/// General MIDI percussion grouped into nine drum classes. The first pitch
/// of each class is the one decoders emit.
pub const DEFAULT_DRUM_PITCH_CLASSES: [&[u8]; 9] = [
    // bass drum
    &[36, 35],
    // snare
    &[38, 27, 28, 31, 32, 33, 34, 37, 39, 40, 56, 65, 66, 75, 85],
    // closed hi-hat
    &[42, 44, 54, 68, 69, 70, 71, 73, 78, 80],
    // open hi-hat
    &[46, 67, 72, 74, 79, 81],
    // low tom
    &[45, 29, 41, 61, 64, 84],
    // mid tom
    &[48, 47, 60, 63, 77, 86, 87],
    // high tom
    &[50, 30, 43, 62, 76, 83],
    // crash
    &[49, 55, 57, 58],
    // ride
    &[51, 52, 53, 59, 82],
];

/// Ordered groups of interchangeable percussion pitches.
///
/// Immutable once built; the pitch lookup is computed up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct PitchClassTable {
    classes: Vec<Vec<u8>>,
    class_by_pitch: HashMap<u8, usize>,
}

impl PitchClassTable {
    /// Validate and index a set of classes.
    ///
    /// Fails on an empty table, an empty class, a pitch above 127, a pitch
    /// listed in two classes, or more than [`MAX_PITCH_CLASSES`] classes.
    pub fn new(classes: Vec<Vec<u8>>) -> Result<Self> {
        if classes.is_empty() {
            return Err(Error::InvalidConfig("pitch class table is empty".into()));
        }
        if classes.len() > MAX_PITCH_CLASSES {
            return Err(Error::InvalidConfig(format!(
                "{} pitch classes exceeds the maximum of {}",
                classes.len(),
                MAX_PITCH_CLASSES
            )));
        }

        let mut class_by_pitch = HashMap::new();
        for (class, pitches) in classes.iter().enumerate() {
            if pitches.is_empty() {
                return Err(Error::InvalidConfig(format!("pitch class {} is empty", class)));
            }
            for &pitch in pitches {
                if pitch > 127 {
                    return Err(Error::InvalidConfig(format!(
                        "pitch {} in class {} is outside the MIDI range",
                        pitch, class
                    )));
                }
                if let Some(previous) = class_by_pitch.insert(pitch, class) {
                    return Err(Error::InvalidConfig(format!(
                        "pitch {} appears in classes {} and {}",
                        pitch, previous, class
                    )));
                }
            }
        }

        Ok(Self {
            classes,
            class_by_pitch,
        })
    }

    /// The nine-class General MIDI drum table.
    pub fn drums() -> Self {
        let classes = DEFAULT_DRUM_PITCH_CLASSES
            .iter()
            .map(|pitches| pitches.to_vec())
            .collect::<Vec<_>>();
        let class_by_pitch = classes
            .iter()
            .enumerate()
            .flat_map(|(class, pitches)| pitches.iter().map(move |&p| (p, class)))
            .collect();
        Self {
            classes,
            class_by_pitch,
        }
    }

    pub fn class_of(&self, pitch: u8) -> Result<usize> {
        self.class_by_pitch
            .get(&pitch)
            .copied()
            .ok_or(Error::UnmappedPitch(pitch))
    }

    /// First pitch listed for `class`.
    pub fn representative_pitch(&self, class: usize) -> Option<u8> {
        self.classes.get(class).and_then(|pitches| pitches.first().copied())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[Vec<u8>] {
        &self.classes
    }
}

impl Default for PitchClassTable {
    fn default() -> Self {
        Self::drums()
    }
}

impl TryFrom<Vec<Vec<u8>>> for PitchClassTable {
    type Error = Error;

    fn try_from(classes: Vec<Vec<u8>>) -> Result<Self> {
        Self::new(classes)
    }
}

impl From<PitchClassTable> for Vec<Vec<u8>> {
    fn from(table: PitchClassTable) -> Self {
        table.classes
    }
}
