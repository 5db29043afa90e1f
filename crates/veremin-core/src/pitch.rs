//! Pitch tools: note names, frequencies, and the row-to-pitch ladder

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, VereminError};

// ============================================================================
// Note names and frequencies
// ============================================================================

/// Default sequencer scale, in scale steps between adjacent pitch rows
pub const DEFAULT_SCALE: [u8; 7] = [1, 2, 2, 2, 1, 2, 2];

/// E2
pub const DEFAULT_ROOT: u8 = 40;

/// Parse a scientific pitch name into a MIDI note number
///
/// # Example
/// ```
/// use veremin_core::parse_note_name;
/// assert_eq!(parse_note_name("E2").unwrap(), 40);
/// assert_eq!(parse_note_name("C#4").unwrap(), 61);
/// ```
pub fn parse_note_name(name: &str) -> Result<u8> {
    let bad = || VereminError::NoteName(name.to_string());
    let mut chars = name.trim().chars().peekable();

    let letter = chars.next().ok_or_else(bad)?;
    let base: i16 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(bad()),
    };

    let mut accidental = 0i16;
    while let Some(&c) = chars.peek() {
        match c {
            '#' => accidental += 1,
            'b' => accidental -= 1,
            _ => break,
        }
        chars.next();
    }

    let octave: i16 = chars.collect::<String>().parse().map_err(|_| bad())?;
    let midi = (octave + 1) * 12 + base + accidental;
    if (0..=127).contains(&midi) {
        Ok(midi as u8)
    } else {
        Err(bad())
    }
}

/// Equal-tempered frequency for a MIDI note (A4 = 440 Hz)
pub fn midi_to_frequency(note: u8) -> f64 {
    440.0 * 2f64.powf((note as f64 - 69.0) / 12.0)
}

/// Accepts either a MIDI number or a note name ("E2") in config files
pub(crate) fn deserialize_note<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RootNote {
        Midi(u8),
        Name(String),
    }

    match RootNote::deserialize(deserializer)? {
        RootNote::Midi(n) if n <= 127 => Ok(n),
        RootNote::Midi(n) => Err(serde::de::Error::custom(format!("MIDI note out of range: {n}"))),
        RootNote::Name(s) => parse_note_name(&s).map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Pitch ladder
// ============================================================================

/// Maps grid rows to MIDI pitches.
///
/// Rows are scanned from the highest index down to 0. The running pitch starts
/// at the root and, after visiting row `i`, climbs by `scale[i % scale.len()]`,
/// so the last row sounds the root and row 0 the highest pitch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchLadder {
    pitches: Vec<u8>,
}

impl PitchLadder {
    /// Build the ladder, or `None` when any row would leave the MIDI range
    pub fn new(root: u8, scale: &[u8], gamut: usize) -> Option<Self> {
        if scale.is_empty() {
            return None;
        }

        let mut pitches = vec![0u8; gamut];
        let mut pitch = root as u32;
        for row in (0..gamut).rev() {
            if pitch > 127 {
                return None;
            }
            pitches[row] = pitch as u8;
            pitch += scale[row % scale.len()] as u32;
        }
        Some(Self { pitches })
    }

    pub fn pitch(&self, row: usize) -> Option<u8> {
        self.pitches.get(row).copied()
    }

    /// Rows in scan order (highest index first) with their pitches
    pub fn scan(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.pitches.iter().copied().enumerate().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_name() {
        assert_eq!(parse_note_name("E2").unwrap(), 40);
        assert_eq!(parse_note_name("A4").unwrap(), 69);
        assert_eq!(parse_note_name("C-1").unwrap(), 0);
        assert_eq!(parse_note_name("D#2").unwrap(), 39);
        assert_eq!(parse_note_name("Eb2").unwrap(), 39);
        assert!(parse_note_name("H2").is_err());
        assert!(parse_note_name("C").is_err());
        assert!(parse_note_name("G9").is_ok());
        assert!(parse_note_name("A9").is_err());
    }

    #[test]
    fn test_midi_to_frequency() {
        assert!((midi_to_frequency(69) - 440.0).abs() < 1e-9);
        assert!((midi_to_frequency(81) - 880.0).abs() < 1e-9);
        assert!((midi_to_frequency(40) - 82.4069).abs() < 1e-3);
    }

    #[test]
    fn test_ladder_default() {
        let ladder = PitchLadder::new(DEFAULT_ROOT, &DEFAULT_SCALE, 10).unwrap();
        // row 9 = root; each row above adds scale[(row + 1) % 7]
        assert_eq!(ladder.pitch(9), Some(40));
        assert_eq!(ladder.pitch(8), Some(42));
        assert_eq!(ladder.pitch(7), Some(44));
        assert_eq!(ladder.pitch(6), Some(45));
        assert_eq!(ladder.pitch(0), Some(56));
        assert_eq!(ladder.pitch(10), None);
    }

    #[test]
    fn test_ladder_scan_order() {
        let ladder = PitchLadder::new(60, &[2], 3).unwrap();
        let scanned: Vec<_> = ladder.scan().collect();
        assert_eq!(scanned, vec![(2, 60), (1, 62), (0, 64)]);
    }

    #[test]
    fn test_ladder_out_of_range() {
        assert!(PitchLadder::new(120, &[2], 10).is_none());
        assert!(PitchLadder::new(40, &[], 10).is_none());
    }
}
