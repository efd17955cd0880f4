use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::buffer::FeatureBuffer;
use crate::codec::Codec;
use crate::config::CodecSpec;
use crate::drums::{DecodeMode, DrumsArgs, DrumsCodec, DrumsOneHotCodec};
use crate::melody::{MelodyArgs, MelodyCodec};
use crate::note::NoteSequence;
use crate::trio::{TrioArgs, TrioCodec};
use crate::{Error, Result};

/// The encoding schemes a [`CodecSpec`] can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodecKind {
    Melody,
    DrumsRoll,
    DrumsRawRoll,
    DrumsOneHot,
    Trio,
}

impl CodecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melody => "melody",
            Self::DrumsRoll => "drumsRoll",
            Self::DrumsRawRoll => "drumsRawRoll",
            Self::DrumsOneHot => "drumsOneHot",
            Self::Trio => "trio",
        }
    }

    /// Look up a kind by name. The converter names used in Magenta
    /// checkpoint configs are accepted too.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "melody" | "MelodyConverter" => Ok(Self::Melody),
            "drumsRoll" | "DrumsConverter" => Ok(Self::DrumsRoll),
            "drumsRawRoll" | "DrumRollConverter" => Ok(Self::DrumsRawRoll),
            "drumsOneHot" | "DrumsOneHotConverter" => Ok(Self::DrumsOneHot),
            "trio" | "TrioConverter" => Ok(Self::Trio),
            other => Err(Error::UnknownCodecKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CodecKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Any codec buildable from a [`CodecSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnyCodec {
    Melody(MelodyCodec),
    Drums(DrumsCodec),
    DrumsOneHot(DrumsOneHotCodec),
    Trio(TrioCodec),
}

impl AnyCodec {
    pub fn kind(&self) -> CodecKind {
        match self {
            Self::Melody(_) => CodecKind::Melody,
            Self::Drums(codec) => match codec.mode() {
                DecodeMode::Labeled => CodecKind::DrumsRoll,
                DecodeMode::Raw => CodecKind::DrumsRawRoll,
            },
            Self::DrumsOneHot(_) => CodecKind::DrumsOneHot,
            Self::Trio(_) => CodecKind::Trio,
        }
    }

    fn inner(&self) -> &dyn Codec {
        match self {
            Self::Melody(codec) => codec,
            Self::Drums(codec) => codec,
            Self::DrumsOneHot(codec) => codec,
            Self::Trio(codec) => codec,
        }
    }
}

impl Codec for AnyCodec {
    fn step_count(&self) -> Option<usize> {
        self.inner().step_count()
    }

    fn depth(&self) -> usize {
        self.inner().depth()
    }

    fn segment_count(&self) -> usize {
        self.inner().segment_count()
    }

    fn encode(&self, sequence: &NoteSequence) -> Result<FeatureBuffer> {
        self.inner().encode(sequence)
    }

    fn decode(&self, features: &FeatureBuffer) -> Result<NoteSequence> {
        self.inner().decode(features)
    }
}

/// Build the codec a spec describes.
pub fn build_codec(spec: &CodecSpec) -> Result<AnyCodec> {
    let kind = CodecKind::parse(&spec.kind)?;

    let codec = match kind {
        CodecKind::Melody => AnyCodec::Melody(MelodyCodec::new(args::<MelodyArgs>(spec)?)?),
        CodecKind::DrumsRoll => {
            AnyCodec::Drums(DrumsCodec::new(args::<DrumsArgs>(spec)?, DecodeMode::Labeled))
        }
        CodecKind::DrumsRawRoll => {
            AnyCodec::Drums(DrumsCodec::new(args::<DrumsArgs>(spec)?, DecodeMode::Raw))
        }
        CodecKind::DrumsOneHot => {
            AnyCodec::DrumsOneHot(DrumsOneHotCodec::new(args::<DrumsArgs>(spec)?))
        }
        CodecKind::Trio => AnyCodec::Trio(TrioCodec::new(args::<TrioArgs>(spec)?)?),
    };

    info!(
        kind = %kind,
        depth = codec.depth(),
        step_count = ?codec.step_count(),
        "built codec"
    );
    Ok(codec)
}

fn args<T: DeserializeOwned>(spec: &CodecSpec) -> Result<T> {
    // Drum codecs need no arguments at all; treat a missing table as `{}`.
    let value = if spec.args.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        spec.args.clone()
    };

    serde_json::from_value(value)
        .map_err(|e| Error::InvalidConfig(format!("{} args: {}", spec.kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(kind: &str, args: serde_json::Value) -> CodecSpec {
        CodecSpec {
            kind: kind.into(),
            args,
        }
    }

    #[test]
    fn kinds_round_trip_through_names() {
        for kind in [
            CodecKind::Melody,
            CodecKind::DrumsRoll,
            CodecKind::DrumsRawRoll,
            CodecKind::DrumsOneHot,
            CodecKind::Trio,
        ] {
            assert_eq!(kind.as_str().parse::<CodecKind>().unwrap(), kind);
        }
    }

    #[test]
    fn legacy_converter_names_resolve() {
        assert_eq!(CodecKind::parse("DrumRollConverter").unwrap(), CodecKind::DrumsRawRoll);
        assert_eq!(CodecKind::parse("DrumsConverter").unwrap(), CodecKind::DrumsRoll);
    }

    #[test]
    fn unknown_kind_fails() {
        let result = build_codec(&spec("polyphony", json!({})));
        assert_eq!(result, Err(Error::UnknownCodecKind("polyphony".into())));
    }

    #[test]
    fn builds_drum_codecs_without_args() {
        let roll = build_codec(&spec("drumsRoll", serde_json::Value::Null)).unwrap();
        assert_eq!(roll.kind(), CodecKind::DrumsRoll);
        assert_eq!(roll.depth(), 10);
        assert_eq!(roll.step_count(), None);

        let raw = build_codec(&spec("drumsRawRoll", json!({"numSteps": 32}))).unwrap();
        assert_eq!(raw.kind(), CodecKind::DrumsRawRoll);
        assert_eq!(raw.step_count(), Some(32));

        let one_hot = build_codec(&spec("drumsOneHot", json!({}))).unwrap();
        assert_eq!(one_hot.depth(), 512);
    }

    #[test]
    fn builds_trio_from_nested_args() {
        let codec = build_codec(&spec(
            "TrioConverter",
            json!({
                "numSteps": 16,
                "melArgs": {"minPitch": 21, "maxPitch": 108},
                "bassArgs": {"minPitch": 33, "maxPitch": 58},
                "drumsArgs": {"pitchClasses": [[36, 35], [38, 40], [42]]}
            }),
        ))
        .unwrap();

        assert_eq!(codec.kind(), CodecKind::Trio);
        assert_eq!(codec.segment_count(), 3);
        assert_eq!(codec.depth(), 90 + 28 + 8);
        assert_eq!(codec.step_count(), Some(16));
    }

    #[test]
    fn missing_melody_bounds_are_invalid_config() {
        let result = build_codec(&spec("melody", json!({"stepCount": 8})));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn bad_pitch_classes_are_invalid_config() {
        let result = build_codec(&spec("drumsOneHot", json!({"pitchClasses": [[36], [36]]})));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
