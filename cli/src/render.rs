//! Terminal rendering of an analysis message.

use std::io;
use std::io::Write;

use owo_colors::OwoColorize;
use reglens_core::AnalysisMessage;
use reglens_core::AnnotatedText;
use reglens_core::HighlightStyle;
use reglens_core::RegulationIndex;
use reglens_core::Segment;
use reglens_core::annotate;
use reglens_core::protocol::model::Consideration;
use reglens_core::protocol::model::Severity;

/// Renders the annotated text, the regulation tree and the summary of one
/// analysis message. Considerations and highlights below `min_severity`
/// are hidden; the regulation tree is never filtered.
pub fn render_message(
    out: &mut impl Write,
    message: &AnalysisMessage,
    min_severity: Option<Severity>,
) -> io::Result<()> {
    let index = message.index();
    let considerations: Vec<Consideration> = index
        .considerations()
        .iter()
        .filter(|consideration| min_severity.is_none_or(|min| consideration.severity >= min))
        .cloned()
        .collect();
    let annotated = annotate(message.originating_text(), &considerations);

    if !annotated.is_plain() {
        render_annotated(out, &annotated)?;
        writeln!(out)?;
    }
    render_tree(out, &index)?;
    render_considerations(out, &considerations)?;
    render_unresolved(out, &index)
}

/// Prints the original text with highlighted segments colored by style.
fn render_annotated(out: &mut impl Write, annotated: &AnnotatedText) -> io::Result<()> {
    for segment in annotated.segments() {
        match segment {
            Segment::Plain(text) => write!(out, "{text}")?,
            Segment::Highlight(text, span) => match span.style {
                HighlightStyle::Severe => write!(out, "{}", text.red().bold())?,
                HighlightStyle::Advisory => write!(out, "{}", text.yellow())?,
            },
        }
    }
    writeln!(out)
}

fn render_tree(out: &mut impl Write, index: &RegulationIndex) -> io::Result<()> {
    for (name, regulation) in &index.regulations {
        writeln!(out, "{}", name.bold())?;
        writeln!(out, "  {}", regulation.description)?;
        for (article_name, article) in &regulation.articles {
            writeln!(out, "  {}", article_name.bold())?;
            writeln!(out, "    {}", article.description)?;
            for citation in &article.citations {
                writeln!(out, "    \u{201c}{}\u{201d}", citation.text.italic())?;
            }
            for related in &article.related_documents {
                let document = &related.document;
                let title = document
                    .semantic_identifier
                    .as_deref()
                    .unwrap_or(&document.document_id);
                match &document.link {
                    Some(link) => writeln!(out, "    {title} ({})", link.underline())?,
                    None => writeln!(out, "    {title}")?,
                }
            }
        }
    }
    Ok(())
}

fn render_considerations(out: &mut impl Write, considerations: &[Consideration]) -> io::Result<()> {
    if considerations.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{}", "Considerations".bold())?;
    for consideration in considerations {
        writeln!(
            out,
            "  [{}] {} {}: {}",
            severity_label(consideration.severity),
            consideration.regulation,
            consideration.article,
            consideration.analysis
        )?;
        writeln!(out, "    action: {}", consideration.recommended_action)?;
    }
    Ok(())
}

fn render_unresolved(out: &mut impl Write, index: &RegulationIndex) -> io::Result<()> {
    if index.unresolved.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!(
            "{} reference(s) mention regulations or articles the analysis never introduced",
            index.unresolved.total()
        )
        .dimmed()
    )
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::High => severity.as_str().red().bold().to_string(),
        Severity::Medium => severity.as_str().yellow().to_string(),
        Severity::Low => severity.as_str().cyan().to_string(),
    }
}
