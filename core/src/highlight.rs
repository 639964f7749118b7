//! Span highlighting of analyzed text.

use std::cmp::Reverse;
use std::ops::Range;

use reglens_protocol::model::Consideration;
use reglens_protocol::model::Severity;
use serde::Serialize;

/// Visual treatment of a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightStyle {
    /// Clear problem; strong warning treatment.
    Severe,
    /// Worth review; informational treatment.
    Advisory,
}

impl HighlightStyle {
    /// Medium and low severities share the advisory treatment; the display
    /// only distinguishes "act now" from "review".
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::High => HighlightStyle::Severe,
            Severity::Medium | Severity::Low => HighlightStyle::Advisory,
        }
    }

    /// CSS class attached to rendered markup.
    pub fn css_class(self) -> &'static str {
        match self {
            HighlightStyle::Severe => "analysis-highlight-severe",
            HighlightStyle::Advisory => "analysis-highlight-advisory",
        }
    }
}

/// One placed highlight, byte-indexed into the original text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightSpan {
    pub range: Range<usize>,
    pub style: HighlightStyle,
    pub severity: Severity,
    /// URL-escaped payload carrying the regulation, article, analysis and
    /// recommended action.
    pub tooltip: String,
}

/// A text together with the non-overlapping highlights planned over it.
///
/// Span offsets always refer to the original text, so rendering is a single
/// pass and never re-scans text it already produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedText {
    pub source: String,
    /// Ascending by start position; ranges never overlap.
    pub spans: Vec<HighlightSpan>,
}

/// A contiguous piece of an [`AnnotatedText`].
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Highlight(&'a str, &'a HighlightSpan),
}

/// Overlays `text` with one highlight per locatable consideration.
///
/// Longer segments are placed first, so a shorter segment that is a
/// substring of a longer one cannot steal its match (ties keep summary
/// order). The scan cursor only moves forward through the text, which is
/// what keeps placed spans disjoint. A consideration whose segment cannot
/// be found from the cursor onward is skipped.
pub fn annotate(text: &str, considerations: &[Consideration]) -> AnnotatedText {
    let mut ordered: Vec<&Consideration> = considerations
        .iter()
        .filter(|consideration| !consideration.text_segment.is_empty())
        .collect();
    ordered.sort_by_key(|consideration| Reverse(consideration.text_segment.len()));

    let mut spans = Vec::new();
    let mut cursor = 0;
    for consideration in ordered {
        let Some(found) = text[cursor..].find(&consideration.text_segment) else {
            tracing::debug!(
                segment = %consideration.text_segment,
                "consideration segment not found in text; skipping"
            );
            continue;
        };
        let start = cursor + found;
        let end = start + consideration.text_segment.len();
        spans.push(HighlightSpan {
            range: start..end,
            style: HighlightStyle::for_severity(consideration.severity),
            severity: consideration.severity,
            tooltip: tooltip(consideration),
        });
        cursor = end;
    }

    AnnotatedText {
        source: text.to_string(),
        spans,
    }
}

/// URL-escaped tooltip payload for one consideration.
fn tooltip(consideration: &Consideration) -> String {
    let raw = format!(
        "{} {}\n{}\nRecommended action: {}",
        consideration.regulation,
        consideration.article,
        consideration.analysis,
        consideration.recommended_action
    );
    urlencoding::encode(&raw).into_owned()
}

impl AnnotatedText {
    /// True when no consideration produced a highlight.
    pub fn is_plain(&self) -> bool {
        self.spans.is_empty()
    }

    /// The text split into plain and highlighted segments, in order.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::with_capacity(self.spans.len() * 2 + 1);
        let mut cursor = 0;
        for span in &self.spans {
            if span.range.start > cursor {
                segments.push(Segment::Plain(&self.source[cursor..span.range.start]));
            }
            segments.push(Segment::Highlight(&self.source[span.range.clone()], span));
            cursor = span.range.end;
        }
        if cursor < self.source.len() {
            segments.push(Segment::Plain(&self.source[cursor..]));
        }
        segments
    }

    /// Renders `<mark>` markup in one pass over the original text.
    ///
    /// Text content is HTML-escaped here; the tooltip payload was already
    /// URL-escaped when the span was planned.
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(self.source.len() + self.spans.len() * 64);
        for segment in self.segments() {
            match segment {
                Segment::Plain(text) => html.push_str(&html_escape::encode_text(text)),
                Segment::Highlight(text, span) => {
                    let class = span.style.css_class();
                    let info = &span.tooltip;
                    html.push_str(&format!(r#"<mark class="{class}" data-info="{info}">"#));
                    html.push_str(&html_escape::encode_text(text));
                    html.push_str("</mark>");
                }
            }
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn consideration(segment: &str, severity: Severity) -> Consideration {
        Consideration {
            text_segment: segment.to_string(),
            regulation: "GDPR".to_string(),
            article: "Article 5".to_string(),
            analysis: "needs review".to_string(),
            severity,
            recommended_action: "review the clause".to_string(),
        }
    }

    #[test]
    fn longer_segments_win_over_contained_ones() {
        let text = "The quick brown fox jumps over the lazy dog";
        let considerations = vec![
            consideration("quick brown fox", Severity::High),
            consideration("fox", Severity::Low),
            consideration("lazy dog", Severity::Medium),
        ];
        let annotated = annotate(text, &considerations);

        assert_eq!(annotated.spans.len(), 2);
        assert_eq!(annotated.spans[0].range, 4..19);
        assert_eq!(annotated.spans[0].style, HighlightStyle::Severe);
        assert_eq!(annotated.spans[1].range, 35..43);
        assert_eq!(annotated.spans[1].style, HighlightStyle::Advisory);
    }

    #[test]
    fn spans_never_overlap_and_stay_ordered() {
        let text = "alpha beta gamma delta";
        let considerations = vec![
            consideration("beta", Severity::Low),
            consideration("alpha beta", Severity::High),
            consideration("delta", Severity::Medium),
        ];
        let annotated = annotate(text, &considerations);

        let mut last_end = 0;
        for span in &annotated.spans {
            assert!(span.range.start >= last_end);
            last_end = span.range.end;
        }
    }

    #[test]
    fn repeated_segments_advance_through_the_text() {
        let text = "data here and data there";
        let considerations = vec![
            consideration("data", Severity::High),
            consideration("data", Severity::Low),
        ];
        let annotated = annotate(text, &considerations);

        assert_eq!(annotated.spans.len(), 2);
        assert_eq!(annotated.spans[0].range, 0..4);
        assert_eq!(annotated.spans[1].range, 14..18);
    }

    #[test]
    fn unlocatable_segments_are_skipped() {
        let annotated = annotate(
            "short text",
            &[consideration("not present anywhere", Severity::High)],
        );
        assert!(annotated.is_plain());
    }

    #[test]
    fn empty_segments_are_skipped() {
        let annotated = annotate("short text", &[consideration("", Severity::High)]);
        assert!(annotated.is_plain());
    }

    #[test]
    fn no_considerations_leaves_the_text_unchanged() {
        let annotated = annotate("plain text", &[]);
        assert!(annotated.is_plain());
        assert_eq!(annotated.to_html(), "plain text");
    }

    #[test]
    fn medium_and_low_share_the_advisory_style() {
        assert_eq!(
            HighlightStyle::for_severity(Severity::Medium),
            HighlightStyle::for_severity(Severity::Low)
        );
        assert_eq!(
            HighlightStyle::for_severity(Severity::High),
            HighlightStyle::Severe
        );
    }

    #[test]
    fn segments_reassemble_the_source_text() {
        let text = "The quick brown fox jumps over the lazy dog";
        let annotated = annotate(
            text,
            &[
                consideration("quick brown fox", Severity::High),
                consideration("lazy dog", Severity::Low),
            ],
        );
        let reassembled: String = annotated
            .segments()
            .iter()
            .map(|segment| match segment {
                Segment::Plain(text) => *text,
                Segment::Highlight(text, _) => *text,
            })
            .collect();
        assert_eq!(reassembled, text);
    }

    #[test]
    fn tooltips_are_url_escaped() {
        let mut flagged = consideration("quick", Severity::High);
        flagged.analysis = "uses \"cookies\" & trackers".to_string();
        let annotated = annotate("quick test", &[flagged]);

        let tooltip = &annotated.spans[0].tooltip;
        assert!(!tooltip.contains('"'));
        assert!(!tooltip.contains('&'));
        assert!(!tooltip.contains(' '));
        assert!(tooltip.contains("GDPR"));
    }

    #[test]
    fn html_output_escapes_text_and_wraps_spans() {
        let text = "1 < 2 and quick brown fox";
        let annotated = annotate(text, &[consideration("quick brown fox", Severity::High)]);
        let html = annotated.to_html();

        assert!(html.starts_with("1 &lt; 2 and "));
        assert!(html.contains(r#"<mark class="analysis-highlight-severe" data-info="#));
        assert!(html.ends_with("quick brown fox</mark>"));
    }
}
