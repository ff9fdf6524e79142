//! Plain-text normalization of rich question markup.
//!
//! Question text, options, and answers may embed inline markup such as
//! `H<sub>2</sub>O` or `<b>not</b>`. Comparisons and plain-text exports go
//! through [`normalize`]; the rich document export goes through
//! [`sanitize_markup`], which keeps a small whitelist of formatting tags.

use crate::model::RubricEntry;

/// Tags preserved by [`sanitize_markup`].
pub const ALLOWED_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "sub", "sup", "br", "ul", "ol", "li", "p",
];

enum Segment<'a> {
    Text(&'a str),
    /// Full tag text including the angle brackets.
    Tag(&'a str),
}

/// Split `input` into text and tag segments.
///
/// A tag runs from `<` to the first following `>`. A `<` without a closing
/// `>` is ordinary text.
fn segments(input: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = input;
    loop {
        let Some(open) = rest.find('<') else {
            if !rest.is_empty() {
                out.push(Segment::Text(rest));
            }
            break;
        };
        let Some(close_rel) = rest[open..].find('>') else {
            out.push(Segment::Text(rest));
            break;
        };
        let close = open + close_rel;
        if open > 0 {
            out.push(Segment::Text(&rest[..open]));
        }
        out.push(Segment::Tag(&rest[open..=close]));
        rest = &rest[close + 1..];
    }
    out
}

/// Remove every `<...>` tag, keeping the text between them.
pub fn strip_markup(input: &str) -> String {
    segments(input)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Text(t) => Some(t),
            Segment::Tag(_) => None,
        })
        .collect()
}

/// Canonical plain-text form used for comparisons and text exports.
///
/// Strips tags, decodes non-breaking space entities, and trims. Idempotent.
pub fn normalize(input: &str) -> String {
    strip_markup(input)
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

/// Render one rubric entry as a single line of plain text.
pub fn flatten_rubric_entry(entry: &RubricEntry) -> String {
    match entry {
        RubricEntry::Structured(row) => format!(
            "{} (sufficient: {}, excellent: {})",
            normalize(&row.criterion),
            normalize(&row.sufficient),
            normalize(&row.excellent)
        ),
        RubricEntry::FreeText(text) => normalize(text),
    }
}

/// Render a whole rubric as one line, entries separated by ` | `.
pub fn flatten_rubric(entries: &[RubricEntry]) -> String {
    entries
        .iter()
        .map(flatten_rubric_entry)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Parse a tag segment into `(name, is_closing)`.
fn tag_name(tag: &str) -> Option<(String, bool)> {
    let inner = tag.strip_prefix('<')?.strip_suffix('>')?.trim();
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if name.is_empty() {
        None
    } else {
        Some((name, closing))
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Keep whitelisted formatting tags and drop everything else.
///
/// Allowed tags are re-emitted in canonical form without attributes, so
/// `<b onclick="x">` becomes `<b>`. Stray angle brackets in text are escaped.
pub fn sanitize_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for seg in segments(input) {
        match seg {
            Segment::Text(t) => escape_text(t, &mut out),
            Segment::Tag(t) => {
                if let Some((name, closing)) = tag_name(t) {
                    if ALLOWED_TAGS.contains(&name.as_str()) {
                        if closing {
                            out.push_str("</");
                        } else {
                            out.push('<');
                        }
                        out.push_str(&name);
                        out.push('>');
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RubricRow;

    #[test]
    fn strips_nested_inline_markup() {
        assert_eq!(normalize("<b>H<sub>2</sub>O</b>"), "H2O");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "  <i>Paris</i>&nbsp;",
            "a < b",
            "<p>x</p><br/>",
            "&nbsp;&nbsp;<em>hi</em>",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn unclosed_angle_bracket_is_text() {
        assert_eq!(normalize("x < 3"), "x < 3");
        assert_eq!(strip_markup("a <b>c</b> < d"), "a c < d");
    }

    #[test]
    fn flattens_structured_rubric() {
        let rubric = vec![
            RubricEntry::Structured(RubricRow {
                criterion: "Names <b>cause</b>".into(),
                insufficient: "none".into(),
                sufficient: "one cause".into(),
                good: "two causes".into(),
                excellent: "all causes".into(),
            }),
            RubricEntry::FreeText(" Uses terminology ".into()),
        ];
        assert_eq!(
            flatten_rubric(&rubric),
            "Names cause (sufficient: one cause, excellent: all causes) | Uses terminology"
        );
    }

    #[test]
    fn sanitize_keeps_whitelist_and_drops_attributes() {
        let input = r#"<b onclick="evil()">bold</b><script>alert(1)</script> H<SUB>2</SUB>O"#;
        assert_eq!(sanitize_markup(input), "<b>bold</b>alert(1) H<sub>2</sub>O");
    }

    #[test]
    fn sanitize_escapes_stray_brackets() {
        assert_eq!(sanitize_markup("1 < 2"), "1 &lt; 2");
        assert_eq!(sanitize_markup("<br/>line"), "<br>line");
    }
}
