use serde::{Deserialize, Serialize};

/// A single quantized note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI pitch (0-127)
    pub pitch: u8,
    pub quantized_start_step: u32,
    /// Exclusive; always greater than the start step
    pub quantized_end_step: u32,
    #[serde(default)]
    pub is_drum: bool,
    #[serde(default)]
    pub program: u8,
    /// Track the note belongs to
    #[serde(default)]
    pub instrument: u32,
}

impl Note {
    /// A pitched note on program 0, instrument 0.
    pub fn new(pitch: u8, start: u32, end: u32) -> Self {
        Self {
            pitch,
            quantized_start_step: start,
            quantized_end_step: end,
            is_drum: false,
            program: 0,
            instrument: 0,
        }
    }

    /// A single-step drum hit.
    pub fn drum(pitch: u8, step: u32) -> Self {
        Self {
            is_drum: true,
            ..Self::new(pitch, step, step + 1)
        }
    }

    pub fn with_program(mut self, program: u8) -> Self {
        self.program = program;
        self
    }

    pub fn duration_steps(&self) -> u32 {
        self.quantized_end_step
            .saturating_sub(self.quantized_start_step)
    }
}

/// A quantized performance: an unordered set of notes over a fixed number of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSequence {
    pub notes: Vec<Note>,
    pub total_quantized_steps: u32,
    /// Quantization resolution, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_per_quarter: Option<u32>,
}

impl NoteSequence {
    pub fn new(total_quantized_steps: u32) -> Self {
        Self {
            notes: Vec::new(),
            total_quantized_steps,
            steps_per_quarter: None,
        }
    }

    pub fn with_notes(total_quantized_steps: u32, notes: Vec<Note>) -> Self {
        Self {
            notes,
            ..Self::new(total_quantized_steps)
        }
    }

    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Copy of this sequence keeping only the notes that match `keep`.
    pub fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&Note) -> bool,
    {
        Self {
            notes: self.notes.iter().filter(|&n| keep(n)).cloned().collect(),
            total_quantized_steps: self.total_quantized_steps,
            steps_per_quarter: self.steps_per_quarter,
        }
    }
}
