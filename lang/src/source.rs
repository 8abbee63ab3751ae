use std::{collections::HashMap, ops::Range};

use tracing::trace;

/// One instruction line, comment stripped and trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// 1-based line number in the source
    pub number: usize,
    /// Byte range of `text` in the source
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDeclaration {
    pub name: String,
    /// Index of the instruction following the declaration
    pub target: usize,
    pub number: usize,
    pub span: Range<usize>,
}

/// The instruction store: normalized instruction lines and the label table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    lines: Vec<Line>,
    labels: HashMap<String, usize>,
    declarations: Vec<LabelDeclaration>,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

impl Listing {
    /// Split GBASM source into instructions.
    ///
    /// Everything from `;` on is a comment. Spaces and tabs are trimmed and empty lines dropped.
    /// `:name` binds `name` to the index of the next instruction, a later declaration of the
    /// same name replacing the earlier one.
    pub fn parse(source: &str) -> Self {
        let mut listing = Listing::default();
        let mut offset = 0;

        for (i, raw) in source.split_inclusive('\n').enumerate() {
            let start = offset;
            offset += raw.len();

            let raw = raw.strip_suffix('\n').unwrap_or(raw);
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            let code = match raw.find(';') {
                Some(comment) => &raw[..comment],
                None => raw,
            };
            let leading = code.len() - code.trim_start_matches(is_blank).len();
            let text = code.trim_matches(is_blank);
            if text.is_empty() {
                continue;
            }
            let span = start + leading..start + leading + text.len();

            if let Some(name) = text.strip_prefix(':') {
                let target = listing.lines.len();
                trace!(name, target, "label");
                listing.labels.insert(name.to_string(), target);
                listing.declarations.push(LabelDeclaration {
                    name: name.to_string(),
                    target,
                    number: i + 1,
                    span,
                });
                continue;
            }

            listing.lines.push(Line {
                text: text.to_string(),
                number: i + 1,
                span,
            });
        }
        listing
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn instructions(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn labels(&self) -> &HashMap<String, usize> {
        &self.labels
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Every label declaration in source order, duplicates included
    pub fn declarations(&self) -> &[LabelDeclaration] {
        &self.declarations
    }
}
