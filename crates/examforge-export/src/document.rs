//! Word-compatible HTML document export.
//!
//! Produces a single HTML file with Office namespaces that word processors
//! open as a `.doc`. Rich question markup is reduced to the formatting
//! whitelist before it is embedded; plain fields are escaped.

use examforge_core::model::{GeneratedExam, GeneratorConfig, Question, RubricEntry};
use examforge_core::normalize::sanitize_markup;

use crate::ExportVariant;

const ACCENT: &str = "#E3000B";

const REVIEW_CHECKLIST: &[&str] = &[
    "Constructive alignment (Toetsmatrijs &amp; Leerdoelen)",
    "Inhoudelijke correctheid van vragen en antwoordsleutel",
    "Taalgebruik en formulering (eenduidigheid)",
    "Cesuur en puntsverdeling",
];

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Option letter for a zero-based index: A, B, C, ...
pub(crate) fn option_letter(index: usize) -> char {
    char::from_u32('A' as u32 + index as u32).unwrap_or('?')
}

/// Generate the document. Starts with a byte-order mark.
pub fn word_document(
    exam: &GeneratedExam,
    config: &GeneratorConfig,
    variant: ExportVariant,
) -> String {
    let title = html_escape(&exam.metadata.title);
    let mut html = String::new();

    html.push('\u{feff}');
    html.push_str("<html xmlns:o='urn:schemas-microsoft-com:office:office' xmlns:w='urn:schemas-microsoft-com:office:word' xmlns='http://www.w3.org/TR/REC-html40'>\n");
    html.push_str(&format!(
        "<head><meta charset='utf-8'><title>{title}</title></head>\n"
    ));
    html.push_str("<body style=\"font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;\">\n");

    if !variant.is_student() {
        html.push_str(&cover_page(exam));
    }

    // Header
    html.push_str(&format!("<h1 style=\"color: {ACCENT};\">{title}</h1>\n"));
    html.push_str(&format!(
        "<p><b>Niveau:</b> {}</p>\n",
        html_escape(config.difficulty.label())
    ));
    html.push_str(&format!(
        "<p><b>Doelgroep:</b> {}</p>\n",
        html_escape(or_placeholder(
            config.target_group.as_deref().unwrap_or_default(),
            "-"
        ))
    ));
    if variant.is_student() {
        html.push_str("<p><i>Studentversie</i></p>\n");
    } else {
        html.push_str("<p><i>Docentversie (inclusief antwoorden en puntentelling)</i></p>\n");
    }
    html.push_str(HR);

    for (i, question) in exam.questions.iter().enumerate() {
        html.push_str(&question_block(i, question, config, variant));
        html.push_str(HR);
    }

    html.push_str("</body>\n</html>\n");
    html
}

const HR: &str = "<hr style=\"border: 0; border-top: 1px solid #eee; margin: 20px 0;\"/>\n";

/// Peer-review attestation page, teacher variant only.
fn cover_page(exam: &GeneratedExam) -> String {
    let mut html = String::new();
    let cell = "padding: 10px; border: 1px solid #ddd;";
    let label = "padding: 10px; border: 1px solid #ddd; font-weight: bold; width: 30%; background: #f9f9f9;";

    html.push_str("<div style=\"page-break-after: always; font-family: sans-serif;\">\n");
    html.push_str(&format!(
        "<h1 style=\"color: {ACCENT}; border-bottom: 2px solid {ACCENT}; padding-bottom: 10px;\">Toetsdossier &amp; Kwaliteitsborging</h1>\n"
    ));
    html.push_str("<table style=\"width: 100%; margin-top: 20px; border-collapse: collapse;\">\n");
    for (name, value) in [
        (
            "Cursus",
            html_escape(or_placeholder(&exam.metadata.course_code, "Onbekend")),
        ),
        ("Toetsnaam", html_escape(&exam.metadata.title)),
        ("Auteur", "__________________________".to_string()),
    ] {
        html.push_str(&format!(
            "<tr><td style=\"{label}\">{name}</td><td style=\"{cell}\">{value}</td></tr>\n"
        ));
    }
    html.push_str("</table>\n");

    html.push_str("<h3 style=\"margin-top: 40px; color: #333;\">Vier-ogen Verklaring (Peer Review)</h3>\n");
    html.push_str("<p style=\"color: #666; font-size: 0.9em;\">Elke summatieve toets dient door een gekwalificeerde collega gescreend te worden.</p>\n");
    html.push_str("<div style=\"border: 2px solid #333; padding: 20px; margin-top: 20px;\">\n");
    html.push_str("<p>Hierbij verklaar ik dat ik deze toets heb beoordeeld op:</p>\n");
    html.push_str("<ul style=\"list-style-type: square; margin-bottom: 20px;\">\n");
    for item in REVIEW_CHECKLIST {
        html.push_str(&format!("<li>{item}</li>\n"));
    }
    html.push_str("</ul>\n");
    html.push_str("<table style=\"width: 100%; border-collapse: collapse;\">\n");
    html.push_str("<tr><td style=\"padding-top: 20px; width: 50%;\"><b>Naam Reviewer:</b><br/><br/>_______________________</td>");
    html.push_str("<td style=\"padding-top: 20px; width: 50%;\"><b>Handtekening:</b><br/><br/>_______________________</td></tr>\n");
    html.push_str("<tr><td style=\"padding-top: 20px;\"><b>Datum:</b><br/><br/>______ / ______ / 20____</td><td></td></tr>\n");
    html.push_str("</table>\n</div>\n</div>\n");
    html
}

fn question_block(
    index: usize,
    question: &Question,
    config: &GeneratorConfig,
    variant: ExportVariant,
) -> String {
    let mut html = String::new();
    html.push_str("<div style=\"margin-bottom: 25px;\">\n");
    html.push_str(&format!(
        "<h3 style=\"font-size: 1.1em; color: #1D1D1B;\">Vraag {} <span style=\"font-weight: normal; font-size: 0.8em; color: #666;\">({} punten)</span></h3>\n",
        index + 1,
        question.points()
    ));
    if !variant.is_student() {
        html.push_str(&format!(
            "<p style=\"font-size: 0.85em; color: {ACCENT};\">Cognitief niveau: {}</p>\n",
            question.cognitive_level.label(config.language)
        ));
    }

    if let Some(stem) = question.stem_text() {
        html.push_str(&format!(
            "<div style=\"background: #f5f7fa; padding: 10px; border-left: 3px solid #ccc; margin-bottom: 10px; font-style: italic;\">{}</div>\n",
            sanitize_markup(stem)
        ));
    }
    html.push_str(&format!(
        "<div style=\"margin-bottom: 10px; font-weight: bold;\">{}</div>\n",
        sanitize_markup(&question.question)
    ));

    if question.kind.is_choice() {
        html.push_str("<ul style=\"list-style-type: none; padding-left: 0;\">\n");
        for (idx, option) in question.option_list().iter().enumerate() {
            html.push_str(&format!(
                "<li style=\"margin-bottom: 8px; padding-left: 10px;\"><span style=\"display: inline-block; width: 20px; font-weight: bold;\">{}.</span> {}</li>\n",
                option_letter(idx),
                sanitize_markup(option)
            ));
        }
        html.push_str("</ul>\n");
    } else {
        html.push_str("<div style=\"height: 100px; border: 1px solid #ddd; background: #fafafa; margin-top: 10px;\"></div>\n");
    }

    if !variant.is_student() {
        html.push_str(&answer_block(question));
    }
    html.push_str("</div>\n");
    html
}

fn answer_block(question: &Question) -> String {
    let answer = question
        .correct_answer
        .entries()
        .into_iter()
        .map(sanitize_markup)
        .collect::<Vec<_>>()
        .join(", ");

    let mut html = String::new();
    html.push_str("<div style=\"background-color: #f0fdf4; padding: 15px; border: 1px solid #bbf7d0; margin-top: 15px;\">\n");
    html.push_str("<div style=\"color: #166534; font-size: 0.9em;\">\n");
    html.push_str(&format!("<b>Correct antwoord:</b> {answer}<br/><br/>\n"));
    html.push_str(&format!(
        "<b>Toelichting:</b> {}\n",
        sanitize_markup(&question.explanation)
    ));

    if let Some(rubric) = question.rubric.as_deref().filter(|r| !r.is_empty()) {
        html.push_str("<br/><br/><b>Beoordelingsmodel (3-punten schaal):</b><br/>\n");
        html.push_str("<table style=\"width: 100%; border-collapse: collapse; font-size: 0.9em; margin-top: 5px;\">\n");
        html.push_str("<tr style=\"background: #e0e0e0;\"><th style=\"text-align: left; padding: 4px;\">Criterium</th><th style=\"padding: 4px;\">Excellent (3pt)</th></tr>\n");
        for entry in rubric {
            match entry {
                RubricEntry::Structured(row) => html.push_str(&format!(
                    "<tr><td style=\"border-bottom: 1px solid #ddd; padding: 4px;\">{}</td><td style=\"border-bottom: 1px solid #ddd; padding: 4px;\">{}</td></tr>\n",
                    sanitize_markup(&row.criterion),
                    sanitize_markup(&row.excellent)
                )),
                RubricEntry::FreeText(text) => html.push_str(&format!(
                    "<tr><td colspan=\"2\">{}</td></tr>\n",
                    sanitize_markup(text)
                )),
            }
        }
        html.push_str("</table>\n");
    }
    html.push_str("</div>\n</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn render(variant: ExportVariant) -> String {
        word_document(&fixtures::exam(), &GeneratorConfig::default(), variant)
    }

    #[test]
    fn teacher_variant_has_cover_answers_and_rubric() {
        let doc = render(ExportVariant::Teacher);
        assert!(doc.starts_with('\u{feff}'));
        assert!(doc.contains("Vier-ogen Verklaring"));
        assert!(doc.contains("Cesuur en puntsverdeling"));
        assert!(doc.contains("NWI-123"));
        assert!(doc.contains("Correct antwoord:</b> <b>Alpha</b>"));
        assert!(doc.contains("Cognitief niveau: Reproductie"));
        assert!(doc.contains("Criterion 1"));
        assert!(doc.contains("Vraag 2 <span"));
        assert!(doc.contains("(3 punten)"));
    }

    #[test]
    fn student_variant_omits_answers() {
        let doc = render(ExportVariant::Student);
        assert!(doc.contains("Studentversie"));
        assert!(!doc.contains("Vier-ogen"));
        assert!(!doc.contains("Correct antwoord"));
        assert!(!doc.contains("Cognitief niveau"));
        assert!(!doc.contains("Criterion 0"));
        assert!(doc.contains("<span style=\"display: inline-block; width: 20px; font-weight: bold;\">D.</span> Delta"));
    }

    #[test]
    fn markup_is_sanitized() {
        let mut exam = fixtures::exam();
        exam.questions[0].question =
            "H<sub>2</sub>O <script>alert(1)</script><b onclick=\"x\">bold</b>".into();
        exam.metadata.title = "A <b>title</b>".into();
        let doc = word_document(&exam, &GeneratorConfig::default(), ExportVariant::Student);
        assert!(doc.contains("H<sub>2</sub>O alert(1)<b>bold</b>"));
        assert!(!doc.contains("<script>"));
        assert!(!doc.contains("onclick"));
        assert!(doc.contains("A &lt;b&gt;title&lt;/b&gt;"));
    }

    #[test]
    fn empty_rubric_renders_no_table() {
        let mut exam = fixtures::exam();
        exam.questions[1].rubric = Some(Vec::new());
        let doc = word_document(&exam, &GeneratorConfig::default(), ExportVariant::Teacher);
        assert!(!doc.contains("Beoordelingsmodel"));
        assert!(doc.contains("<b>Toelichting:</b>"));
    }

    #[test]
    fn option_letters() {
        assert_eq!(option_letter(0), 'A');
        assert_eq!(option_letter(3), 'D');
    }
}
