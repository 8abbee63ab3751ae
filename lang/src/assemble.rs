use std::{collections::HashSet, ops::Range};

use thiserror::Error;
use tracing::debug;
use vm::op::{Op, Opcode};

use crate::{parse::decode, source::Listing};

/// Problems the assembler works around. None of them stop a program from running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleWarning {
    #[error("Unknown opcode `{0}`, it will be skipped")]
    UnknownOpcode(String),
    #[error("Argument {1} to `{0}` is missing or not an integer: {2:?}, reading it and the rest as 0")]
    Arg(Opcode, usize, String),
    #[error("`{0}` register `{1}` is not one of R0..R3, the instruction will be ignored")]
    Register(Opcode, String),
    #[error("`{0}` jumps to undeclared label `{1}`, the jump will be skipped")]
    UnknownLabel(Opcode, String),
    #[error("Label `{0}` is declared more than once, jumps go to the last declaration")]
    DuplicateLabel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub warning: AssembleWarning,
    /// Byte range in the source
    pub span: Range<usize>,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub ops: Vec<Op>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decode every instruction of the listing, resolving labels to instruction indices
pub fn assemble(listing: &Listing) -> Assembly {
    let mut diagnostics = vec![];

    let mut seen = HashSet::new();
    for declaration in listing.declarations() {
        if !seen.insert(declaration.name.as_str()) {
            diagnostics.push(Diagnostic {
                warning: AssembleWarning::DuplicateLabel(declaration.name.clone()),
                span: declaration.span.clone(),
                line: declaration.number,
            });
        }
    }

    let ops = listing
        .lines()
        .iter()
        .map(|line| {
            let (op, warnings) = decode(&line.text, listing.labels());
            diagnostics.extend(warnings.into_iter().map(|warning| Diagnostic {
                warning,
                span: line.span.clone(),
                line: line.number,
            }));
            op
        })
        .collect::<Vec<_>>();

    // Keep the report in source order
    diagnostics.sort_by_key(|diagnostic| diagnostic.span.start);
    debug!(
        ops = ops.len(),
        labels = listing.labels().len(),
        warnings = diagnostics.len(),
        "assembled"
    );
    Assembly { ops, diagnostics }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use vm::op::{Op, Opcode, Register};

    use super::{assemble, AssembleWarning};
    use crate::source::Listing;

    #[test]
    fn test_forward_and_backward_labels() {
        let listing = Listing::parse("JMP end\n:top\nWAIT 10\nDECJNZ R0 top\n:end\nHALT\n");
        let assembly = assemble(&listing);
        assert!(assembly.diagnostics.is_empty());
        assert_eq!(
            assembly.ops,
            vec![
                Op::Jmp(Some(3)),
                Op::Wait(10),
                Op::DecJnz(Register::new(0), Some(1)),
                Op::Halt
            ]
        );
    }

    #[test]
    fn test_diagnostics_in_source_order() {
        let source = ":x\nNOPE\n:x\nJMP y\nNOTE 1\n";
        let assembly = assemble(&Listing::parse(source));
        let warnings: Vec<_> = assembly
            .diagnostics
            .iter()
            .map(|d| d.warning.clone())
            .collect();
        assert_eq!(
            warnings,
            vec![
                AssembleWarning::UnknownOpcode("NOPE".to_string()),
                AssembleWarning::DuplicateLabel("x".to_string()),
                AssembleWarning::UnknownLabel(Opcode::Jmp, "y".to_string()),
                AssembleWarning::Arg(Opcode::Note, 1, String::new()),
            ]
        );
        for diagnostic in &assembly.diagnostics {
            assert!(source[diagnostic.span.clone()].len() > 1);
        }
        assert_eq!(assembly.diagnostics[2].line, 4);
    }

    proptest! {
        #[test]
        fn test_never_panics(source in "[ -~\t\n]{0,200}") {
            let listing = Listing::parse(&source);
            let assembly = assemble(&listing);
            prop_assert_eq!(assembly.ops.len(), listing.len());
        }

        #[test]
        fn test_resolved_targets_match_label_table(
            body in prop::collection::vec(prop_oneof![
                Just("WAIT 1".to_string()),
                Just("NOTE 60 90 100".to_string()),
                "[a-c]".prop_map(|l| format!(":{l}")),
                "[a-d]".prop_map(|l| format!("JMP {l}")),
            ], 0..24)
        ) {
            let listing = Listing::parse(&body.join("\n"));
            let assembly = assemble(&listing);
            for (op, text) in assembly.ops.iter().zip(listing.instructions()) {
                if let Some(label) = text.strip_prefix("JMP ") {
                    prop_assert_eq!(op, &Op::Jmp(listing.label(label)));
                }
            }
        }
    }
}
