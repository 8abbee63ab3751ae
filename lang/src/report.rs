use std::io;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

use crate::assemble::Diagnostic;

fn report(diagnostic: &Diagnostic, color: bool) -> Report<'static, std::ops::Range<usize>> {
    Report::build(ReportKind::Warning, diagnostic.span.clone())
        .with_config(
            Config::default()
                .with_index_type(IndexType::Byte)
                .with_color(color),
        )
        .with_message(diagnostic.warning.to_string())
        .with_label(
            Label::new(diagnostic.span.clone())
                .with_message("here")
                .with_color(Color::Yellow),
        )
        .finish()
}

/// Pretty print warnings against the source they came from
pub fn eprint_diagnostics(source: &str, diagnostics: &[Diagnostic]) {
    diagnostics.iter().for_each(|diagnostic| {
        let _ = report(diagnostic, true).eprint(Source::from(source));
    });
}

pub fn write_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    mut w: impl io::Write,
) -> io::Result<()> {
    for diagnostic in diagnostics {
        report(diagnostic, false).write(Source::from(source), &mut w)?;
    }
    Ok(())
}
