use std::{collections::HashMap, str::SplitWhitespace};

use vm::op::{Chord, Drum, DrumKind, Note, Op, Opcode, Register};

use crate::assemble::AssembleWarning;

/// Reads operands left to right, forgiving missing or malformed values.
///
/// An integer is the longest `[+-]?digits` prefix of the next token. Whatever follows the
/// digits is left for the next read, so `480.0` reads as `480` and the `.0` fails the read after
/// it. Once one integer fails to read, it and every later integer on the line read as `0`, and
/// words read as missing.
#[derive(Debug, Clone)]
pub struct Operands<'a> {
    tokens: SplitWhitespace<'a>,
    /// Unread tail of a token an integer was taken from
    leftover: Option<&'a str>,
    position: usize,
    failure: Option<(usize, String)>,
}

impl<'a> Operands<'a> {
    pub fn new(tokens: SplitWhitespace<'a>) -> Self {
        Self {
            tokens,
            leftover: None,
            position: 0,
            failure: None,
        }
    }

    pub fn int(&mut self) -> i64 {
        if self.failure.is_some() {
            return 0;
        }
        let position = self.position;
        self.position += 1;
        let Some(token) = self.next_token() else {
            self.failure = Some((position, String::new()));
            return 0;
        };

        let (number, rest) = split_int(token);
        match number.parse() {
            Ok(value) => {
                self.leftover = (!rest.is_empty()).then_some(rest);
                value
            }
            // No digits at all, or more than fit
            Err(_) => {
                self.failure = Some((position, token.to_string()));
                0
            }
        }
    }

    pub fn word(&mut self) -> Option<&'a str> {
        if self.failure.is_some() {
            return None;
        }
        self.position += 1;
        self.next_token()
    }

    fn next_token(&mut self) -> Option<&'a str> {
        self.leftover.take().or_else(|| self.tokens.next())
    }

    /// Tokens not read yet
    pub fn remaining(&self) -> usize {
        self.tokens.clone().count() + usize::from(self.leftover.is_some())
    }

    /// Position and text of the first operand that failed to read, empty when it was missing
    pub fn failure(&self) -> Option<&(usize, String)> {
        self.failure.as_ref()
    }
}

/// Split `token` after its longest `[+-]?digits` prefix
fn split_int(token: &str) -> (&str, &str) {
    let sign = usize::from(token.starts_with(['+', '-']));
    let digits = token[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return ("", token);
    }
    token.split_at(sign + digits)
}

/// Decode one instruction line, resolving jump labels against `labels`
pub fn decode(text: &str, labels: &HashMap<String, usize>) -> (Op, Vec<AssembleWarning>) {
    let mut tokens = text.split_whitespace();
    let mnemonic = tokens.next().unwrap_or_default();
    let mut args = Operands::new(tokens);
    let mut warnings = vec![];

    let Some(opcode) = Opcode::parse(mnemonic) else {
        warnings.push(AssembleWarning::UnknownOpcode(mnemonic.to_string()));
        return (Op::Unknown(mnemonic.to_string()), warnings);
    };

    let register = |token: Option<&str>, warnings: &mut Vec<AssembleWarning>| {
        let Some(token) = token else {
            warnings.push(AssembleWarning::Arg(opcode, 0, String::new()));
            return None;
        };
        let register = Register::parse(token);
        if register.is_none() {
            warnings.push(AssembleWarning::Register(opcode, token.to_string()));
        }
        register
    };
    // A missing label reads as the empty name, which `:` alone declares
    let target = |name: Option<&str>, warnings: &mut Vec<AssembleWarning>| {
        let name = name.unwrap_or_default();
        let target = labels.get(name).copied();
        if target.is_none() {
            warnings.push(AssembleWarning::UnknownLabel(opcode, name.to_string()));
        }
        target
    };

    let op = match opcode {
        Opcode::SetTempo => Op::SetTempo(args.int()),
        Opcode::SetTimeSignature => {
            let num = args.int();
            Op::SetTimeSignature(num, args.int())
        }
        Opcode::Track => Op::Track(args.int()),
        Opcode::Note => Op::Note(Note {
            pitch: args.int(),
            velocity: args.int(),
            duration: args.int(),
        }),
        Opcode::Chord => {
            let count = args.int().max(0) as usize;
            // Pitches that are not there would read as 0 and leave the velocity and duration 0
            // too, so the chord would be silent either way
            let available = count.min(args.remaining());
            let pitches = (0..available).map(|_| args.int()).collect();
            if available < count {
                args.int();
            }
            Op::Chord(Chord {
                pitches,
                velocity: args.int(),
                duration: args.int(),
            })
        }
        Opcode::Drum => Op::Drum(Drum {
            kind: DrumKind::from_code(args.int()),
            velocity: args.int(),
            duration: args.int(),
        }),
        Opcode::Wait => Op::Wait(args.int()),
        Opcode::Load => {
            let register = register(args.word(), &mut warnings);
            Op::Load(register, args.int())
        }
        Opcode::DecJnz => {
            let register = register(args.word(), &mut warnings);
            Op::DecJnz(register, target(args.word(), &mut warnings))
        }
        Opcode::Jmp => Op::Jmp(target(args.word(), &mut warnings)),
        Opcode::Halt => Op::Halt,
    };

    if let Some((position, token)) = args.failure() {
        warnings.push(AssembleWarning::Arg(opcode, *position, token.clone()));
    }
    (op, warnings)
}
