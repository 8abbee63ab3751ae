use std::fmt;

use variantly::Variantly;

use crate::REGISTER_COUNT;

/// The mnemonics understood by the vm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Opcode {
    /// Record a tempo. Timing stays on the fixed 120 BPM base
    SetTempo,
    /// Record a time signature
    SetTimeSignature,
    /// Record the ambient track. Routing is implied by the musical opcodes
    Track,
    /// Schedule a single pitch on the bass track
    Note,
    /// Schedule `n` pitches on the guitar track
    Chord,
    /// Schedule a percussive hit on the drums track
    Drum,
    /// Advance the tick clock
    Wait,
    /// Set a register
    Load,
    /// Decrement a register and jump while it is still positive
    DecJnz,
    /// Jump unconditionally
    Jmp,
    /// Stop execution
    Halt,
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::SetTempo,
        Opcode::SetTimeSignature,
        Opcode::Track,
        Opcode::Note,
        Opcode::Chord,
        Opcode::Drum,
        Opcode::Wait,
        Opcode::Load,
        Opcode::DecJnz,
        Opcode::Jmp,
        Opcode::Halt,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::SetTempo => "SET_TEMPO",
            Opcode::SetTimeSignature => "SET_TS",
            Opcode::Track => "TRACK",
            Opcode::Note => "NOTE",
            Opcode::Chord => "CHORD",
            Opcode::Drum => "DRUM",
            Opcode::Wait => "WAIT",
            Opcode::Load => "LOAD",
            Opcode::DecJnz => "DECJNZ",
            Opcode::Jmp => "JMP",
            Opcode::Halt => "HALT",
        }
    }

    /// Mnemonics are case sensitive
    pub fn parse(mnemonic: &str) -> Option<Opcode> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One of the general purpose registers `R0..R3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(u8);

impl Register {
    pub fn new(index: usize) -> Option<Self> {
        (index < REGISTER_COUNT).then_some(Self(index as u8))
    }

    /// Reads the register number from the second character of the token, so `R2` and `x2` are
    /// both register 2. Anything outside `0..REGISTER_COUNT` is rejected.
    pub fn parse(token: &str) -> Option<Self> {
        let digit = token.chars().nth(1)?.to_digit(10)?;
        Self::new(digit as usize)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// MIDI note number
    pub pitch: i64,
    pub velocity: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    pub pitches: Vec<i64>,
    pub velocity: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumKind {
    Kick,
    Snare,
    HiHat,
    /// Renders silence for its duration
    Other(i64),
}

impl DrumKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => DrumKind::Kick,
            1 => DrumKind::Snare,
            2 => DrumKind::HiHat,
            other => DrumKind::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drum {
    pub kind: DrumKind,
    pub velocity: i64,
    pub duration: i64,
}

/// A decoded instruction.
///
/// Jump targets are already resolved to instruction indices, `None` meaning the label was
/// never declared and the jump is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum Op {
    SetTempo(i64),
    SetTimeSignature(i64, i64),
    Track(i64),
    Note(Note),
    Chord(Chord),
    Drum(Drum),
    Wait(i64),
    Load(Option<Register>, i64),
    DecJnz(Option<Register>, Option<usize>),
    Jmp(Option<usize>),
    Halt,
    /// Anything the decoder did not recognise. Executes as a no-op
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_parse_matches_mnemonic() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::parse(op.mnemonic()), Some(op));
            assert_eq!(op.to_string(), op.mnemonic());
        }
        assert_eq!(Opcode::parse("note"), None);
        assert_eq!(Opcode::parse(""), None);
    }

    #[test]
    fn test_display_is_the_mnemonic() {
        assert_eq!(Opcode::SetTimeSignature.to_string(), "SET_TS");
        let mut mnemonics: Vec<&str> = Opcode::ALL.iter().map(|op| op.mnemonic()).collect();
        mnemonics.sort_unstable();
        mnemonics.dedup();
        assert_eq!(mnemonics.len(), Opcode::ALL.len());
    }

    #[test]
    fn test_register_from_second_character() {
        assert_eq!(Register::parse("R0").map(Register::index), Some(0));
        assert_eq!(Register::parse("R3").map(Register::index), Some(3));
        assert_eq!(Register::parse("R12").map(Register::index), Some(1));
        assert_eq!(Register::parse("R4"), None);
        assert_eq!(Register::parse("R"), None);
        assert_eq!(Register::parse("Rx"), None);
    }

    #[test]
    fn test_drum_codes() {
        assert_eq!(DrumKind::from_code(0), DrumKind::Kick);
        assert_eq!(DrumKind::from_code(1), DrumKind::Snare);
        assert_eq!(DrumKind::from_code(2), DrumKind::HiHat);
        assert_eq!(DrumKind::from_code(7), DrumKind::Other(7));
    }
}
