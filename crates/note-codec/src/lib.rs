//! Codecs between quantized note sequences and fixed-width feature buffers.
//!
//! Every codec turns a [`NoteSequence`] into a `[steps, depth]`
//! [`FeatureBuffer`] and back again:
//!
//! - [`DrumsCodec`]: multi-hot drum roll with a trailing silence column,
//!   decoded either from one-hot drum-pattern labels or from the raw roll
//! - [`DrumsOneHotCodec`]: one categorical label per step, the label being
//!   the drum-class bitmask
//! - [`MelodyCodec`]: monophonic rest / note-off / pitch-on labels
//! - [`TrioCodec`]: melody, bass and drums side by side along the feature axis
//!
//! Codecs are usually built from a tagged spec:
//!
//! ```
//! use note_codec::{Codec, CodecSpec, Note, NoteSequence};
//!
//! let spec = CodecSpec::from_json_str(
//!     r#"{"kind": "melody", "args": {"stepCount": 4, "minPitch": 60, "maxPitch": 72}}"#,
//! )
//! .unwrap();
//! let codec = spec.build().unwrap();
//!
//! let mut sequence = NoteSequence::new(4);
//! sequence.push(Note::new(64, 0, 2));
//! let features = codec.encode(&sequence).unwrap();
//! assert_eq!(features.shape(), (4, 15));
//!
//! let decoded = codec.decode(&features).unwrap();
//! assert_eq!(decoded.notes[0].pitch, 64);
//! ```

pub mod buffer;
pub mod codec;
pub mod config;
pub mod drums;
pub mod melody;
pub mod note;
pub mod pitch_class;
pub mod registry;
pub mod trio;

pub use buffer::FeatureBuffer;
pub use codec::Codec;
pub use config::{load_codec, CodecSpec, ConfigError};
pub use drums::{DecodeMode, DrumsArgs, DrumsCodec, DrumsOneHotCodec};
pub use melody::{MelodyArgs, MelodyCodec};
pub use note::{Note, NoteSequence};
pub use pitch_class::{PitchClassTable, DEFAULT_DRUM_PITCH_CLASSES};
pub use registry::{build_codec, AnyCodec, CodecKind};
pub use trio::{TrioArgs, TrioCodec, BASS_PROGRAMS, MELODY_PROGRAMS};

/// Errors from encoding, decoding and codec construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("note sequence is not monophonic: note at step {start} begins before step {previous_end}")]
    NotMonophonic { start: u32, previous_end: u32 },

    #[error("pitch {pitch} outside range [{min}, {max}]")]
    PitchOutOfRange { pitch: u8, min: u8, max: u8 },

    #[error("pitch {0} is not in any pitch class")]
    UnmappedPitch(u8),

    #[error("unknown codec kind: {0}")]
    UnknownCodecKind(String),

    #[error("feature buffer shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("note step {step} outside a {steps}-step window")]
    StepOutOfRange { step: u32, steps: usize },

    #[error("invalid codec configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
