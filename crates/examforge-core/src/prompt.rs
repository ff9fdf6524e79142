//! Prompt assembly for generation, regeneration, grading, and refinement.
//!
//! All builders are pure and deterministic: identical input yields identical
//! parts. Binary attachments always precede the instruction text.

use crate::model::{GeneratorConfig, Language, Question, RegenerationMode, UploadedFile};
use crate::traits::Part;

fn or_fallback<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build the instruction text for a generation request.
pub fn generation_prompt(config: &GeneratorConfig, single: bool) -> String {
    let nl = config.language.is_dutch();
    let level = config.difficulty.label();
    let mut prompt = String::new();

    prompt.push_str(&match (single, nl) {
        (true, true) => format!("Genereer één (1) vervangende toetsvraag op {level} niveau. "),
        (true, false) => format!("Generate one (1) replacement exam question at {level} level. "),
        (false, true) => format!("Genereer een toets met {} vragen.\n", config.num_questions),
        (false, false) => format!("Generate an exam with {} questions.\n", config.num_questions),
    });

    let course = config.course_code.as_deref();
    let group = config.target_group.as_deref();
    let weighting = config.weighting.as_deref();
    if nl {
        prompt.push_str(&format!("Niveau: {level}.\n"));
        prompt.push_str(&format!(
            "Onderwijseenheid/Cursuscode: {}.\n",
            or_fallback(course, "Onbekend")
        ));
        prompt.push_str(&format!("Doelgroep: {}.\n", or_fallback(group, "Studenten")));
        prompt.push_str(&format!(
            "Toetsweging: {}.\n",
            or_fallback(weighting, "Niet gespecificeerd")
        ));
    } else {
        prompt.push_str(&format!("Level: {level}.\n"));
        prompt.push_str(&format!("Course Code: {}.\n", or_fallback(course, "Unknown")));
        prompt.push_str(&format!("Target Group: {}.\n", or_fallback(group, "Students")));
        prompt.push_str(&format!(
            "Weighting: {}.\n",
            or_fallback(weighting, "Not specified")
        ));
    }
    prompt.push_str(&format!("Type: {}.\n", config.question_type.label()));

    match (non_blank(config.learning_objectives.as_deref()), nl) {
        (Some(objectives), true) => prompt.push_str(&format!(
            "\nBELANGRIJK - LEERDOELEN: De vragen moeten specifiek toetsen of de student de volgende leerdoelen beheerst (Constructive Alignment):\n\"{objectives}\"\n\n"
        )),
        (Some(objectives), false) => prompt.push_str(&format!(
            "\nIMPORTANT - LEARNING OBJECTIVES: Questions must specifically test if the student masters the following objectives (Constructive Alignment):\n\"{objectives}\"\n\n"
        )),
        (None, true) => prompt.push_str(
            "\nIdentificeer zelf relevante leerdoelen uit de tekst voor constructive alignment.\n",
        ),
        (None, false) => prompt.push_str(
            "\nIdentify relevant learning objectives from the text yourself for constructive alignment.\n",
        ),
    }

    prompt.push_str(if nl {
        "Gebruik de brontekst of de geüploade bestanden hieronder als basis.\n\n"
    } else {
        "Use the source text or uploaded files below as a basis.\n\n"
    });

    let file_count = config.files.len();
    if file_count > 0 {
        prompt.push_str(&if nl {
            format!("Baseer de vragen op de inhoud van de {file_count} bijgevoegde bestand(en).")
        } else {
            format!("Base the questions on the content of the {file_count} attached file(s).")
        });
    }

    if !config.source_text.is_empty() {
        let label = if nl { "Brontekst" } else { "Source Text" };
        prompt.push_str(&format!("\n\n{label}:\n\"{}\"\n", config.source_text));
    }

    if let Some(scope) = non_blank(config.source_scope.as_deref()) {
        prompt.push_str(&if nl {
            format!(
                "\n\nCONTEXT RESTRICTIE: De gebruiker heeft aangegeven dat ALLEEN de volgende secties uit het bronmateriaal relevant zijn: \"{scope}\".\nINSTRUCTIE: Negeer informatie uit andere hoofdstukken of secties. Als het antwoord niet in de opgegeven secties te vinden is, genereer de vraag dan niet."
            )
        } else {
            format!(
                "\n\nCONTEXT RESTRICTION: The user has indicated that ONLY the following sections from the source material are relevant: \"{scope}\".\nINSTRUCTION: Ignore information from other chapters or sections. If the answer cannot be found in the specified sections, do not generate the question."
            )
        });
    }

    prompt.push_str(&format!(
        "\n\nOUTPUT LANGUAGE: {}. Ensure the JSON content is in this language.",
        config.language.directive_name()
    ));
    prompt
}

fn inline_part(file: &UploadedFile) -> Part {
    Part::inline(file.mime_type.clone(), file.data.clone())
}

/// Assemble the ordered request parts: one inline part per uploaded file,
/// then the instruction text.
pub fn build_parts(config: &GeneratorConfig, single: bool) -> Vec<Part> {
    let mut parts: Vec<Part> = config.files.iter().map(inline_part).collect();
    parts.push(Part::text(generation_prompt(config, single)));
    parts
}

fn regeneration_task(language: Language, mode: RegenerationMode) -> Option<&'static str> {
    use RegenerationMode::*;

    let task = match (language, mode) {
        (_, Random) => return None,
        (Language::Nl, Harder) => "OPDRACHT: Genereer een VARIANT op deze vraag die MOEILIJKER is. Verhoog het cognitieve niveau (bijv. van Reproductie naar Inzicht/Toepassen) of maak de opties minder evident. Behoud hetzelfde leerdoel.",
        (Language::Nl, Easier) => "OPDRACHT: Genereer een VARIANT op deze vraag die MAKKELIJKER/TOEGANKELIJKER is. Verlaag het cognitieve niveau of vereenvoudig de vraagstelling. Behoud hetzelfde leerdoel.",
        (Language::Nl, Distractors) => "OPDRACHT: Behoud de vraagstam, de vraagstelling en het goede antwoord, maar genereer NIEUWE, betere afleiders (foute antwoorden) die inspelen op veelgemaakte denkfouten.",
        (Language::Nl, Shorter) => "OPDRACHT: Herschrijf de stam en de vraagstelling zodat deze veel BEKNOPTER, directer en leesbaarder is, zonder de essentie of het antwoord te veranderen.",
        (Language::En, Harder) => "TASK: Generate a VARIANT that is HARDER. Increase cognitive level or make options less obvious. Keep the same learning objective.",
        (Language::En, Easier) => "TASK: Generate a VARIANT that is EASIER/MORE ACCESSIBLE. Lower cognitive level or simplify wording. Keep the same learning objective.",
        (Language::En, Distractors) => "TASK: Keep stem, question text and correct answer, but generate NEW, better distractors based on common misconceptions.",
        (Language::En, Shorter) => "TASK: Rewrite stem and question to be CONCISE and direct, without losing essence or changing the answer.",
    };
    Some(task)
}

/// Mode-specific instruction appended to a single-item request.
///
/// Every mode except `random` embeds the serialized original item.
pub fn regeneration_instruction(
    language: Language,
    mode: RegenerationMode,
    original: &Question,
) -> Result<String, serde_json::Error> {
    let Some(task) = regeneration_task(language, mode) else {
        return Ok(match language {
            Language::Nl => {
                "Genereer een compleet nieuwe vraag over een ander aspect van de stof.".to_string()
            }
            Language::En => {
                "Generate a completely new question about a different aspect of the material."
                    .to_string()
            }
        });
    };

    let json = serde_json::to_string(original)?;
    let intro = match language {
        Language::Nl => "Hier is de huidige vraag",
        Language::En => "Here is the current question",
    };
    Ok(format!("{intro}: {json}. \n{task}"))
}

/// Request parts for a single-item regeneration.
pub fn regeneration_parts(
    config: &GeneratorConfig,
    mode: RegenerationMode,
    original: &Question,
) -> Result<Vec<Part>, serde_json::Error> {
    let mut parts = build_parts(config, true);
    parts.push(Part::text(regeneration_instruction(
        config.language,
        mode,
        original,
    )?));
    Ok(parts)
}

/// System-level directive for exam generation.
pub fn system_instruction(language: Language) -> String {
    let content_language = match language {
        Language::Nl => "DUTCH (Nederlands)",
        Language::En => "ENGLISH",
    };
    format!(
        "Act as: A university exam developer specializing in test construction, constructive alignment, and didactics. You strictly follow the framework of Radboud University.

Your core task:
Develop exam questions + rubrics + metadata.

LANGUAGE SETTING:
You MUST generate all content (questions, answers, explanations, rubrics) in {content_language}.

OUTPUT FORMAT & STYLING (IMPORTANT):
1. **JSON Only:** Your response must be pure JSON.
2. **Rich Text / HTML:** Use HTML tags in your strings for formatting.
   - Use <b> or <strong> for key terms in the case.
   - Use <i> for Latin names or concepts.
   - Use <sub> and <sup> for formulas (e.g., H<sub>2</sub>O, x<sup>2</sup>).
   - Use <br> for line breaks.
   - Use <ul><li>...</li></ul> for lists in the question stem.

DIDACTIC QUALITY & DISTRACTORS:
- **Chain of Thought for Distractors:** Do not invent random wrong answers. Analyze: What thinking error (misconception) does a student make?
  - Distractor A: Plausible due to reading error.
  - Distractor B: Plausible due to calculation error or common assumption.
  - Distractor C: A term that looks similar (semantic confusion).
- **Explanation:** Explicitly explain in the 'explanation' field WHY the correct answer is correct AND why the distractors are wrong.

SCORING:
- Default: 3 points.
- Open Questions: Include 4-level rubric (0-3 pt).

QUESTION TYPES:
- Unless asked otherwise: 90% Single Choice, 10% Multiple Response.

COGNITIVE LEVELS (RU):
- Reproduction (knowledge, recognize)
- Insight (analyze, relate)
- Application (solve, decide)
"
    )
}

/// System-level directive for grading.
pub fn grading_instruction(language: Language) -> String {
    format!(
        "Act as: Experienced university examiner.
Task: Grade student work based on teacher's answer key.
LANGUAGE: {}

PROCESS:
1. Analyze Teacher File (The Standard).
2. Analyze Student File (The Performance).
3. Map answers.
4. Award points (Strict but fair).
5. Calculate grade.

OUTPUT:
JSON format. Provide constructive feedback.
",
        language.directive_name()
    )
}

/// Request parts for grading. The key is always introduced first.
pub fn grading_parts(
    key: &UploadedFile,
    submission: &UploadedFile,
    max_points: Option<f64>,
) -> Vec<Part> {
    let mut prompt =
        String::from("Compare Doc 2 with Doc 1. Grade each question. Calculate grade 1-10.");
    if let Some(points) = max_points {
        prompt.push_str(&format!("\nTotal points available: {points}. Scale if necessary."));
    }
    vec![
        Part::text("DOCUMENT 1: ANSWER KEY:"),
        inline_part(key),
        Part::text("DOCUMENT 2: STUDENT WORK:"),
        inline_part(submission),
        Part::text(prompt),
    ]
}

/// Instruction for a plain-text rewrite of a fragment.
pub fn refine_prompt(text: &str, instruction: &str) -> String {
    format!(
        "Role: Academic editor.
Task: Rewrite the text below according to instruction.

ORIGINAL TEXT:
\"{text}\"

INSTRUCTION:
{instruction}

OUTPUT:
Return ONLY the rewritten text. Keep HTML tags if relevant."
    )
}

/// System-level directive for the didactic coach, carrying course and level.
pub fn chat_instruction(config: &GeneratorConfig) -> String {
    let course = or_fallback(config.course_code.as_deref(), "-");
    let level = config.difficulty.label();
    match config.language {
        Language::Nl => format!(
            "Je bent een didactische coach en toetsexpert aan de Radboud Universiteit.
Huidige context: Cursus {course}, Niveau {level}.
Spreek Nederlands."
        ),
        Language::En => format!(
            "You are a didactic coach and exam expert at Radboud University.
Current context: Course {course}, Level {level}.
Speak English."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CognitiveLevel, CorrectAnswer, QuestionType};

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            mime_type: "application/pdf".into(),
            size: 3,
            data: vec![1, 2, 3],
        }
    }

    fn question() -> Question {
        Question {
            id: "q-7".into(),
            kind: QuestionType::SingleChoice,
            learning_objective: "LO1".into(),
            stem: None,
            question: "Capital of France?".into(),
            options: Some(vec!["Paris".into(), "Rome".into()]),
            correct_answer: CorrectAnswer::Single("Paris".into()),
            explanation: "Paris.".into(),
            rubric: None,
            cognitive_level: CognitiveLevel::Reproduction,
            score: None,
        }
    }

    #[test]
    fn files_precede_instruction_and_text_is_kept() {
        let config = GeneratorConfig {
            language: Language::En,
            source_text: "Mitochondria are the powerhouse of the cell.".into(),
            files: vec![file("a.pdf"), file("b.pdf")],
            ..Default::default()
        };
        let parts = build_parts(&config, false);
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], Part::Inline { .. }));
        assert!(matches!(parts[1], Part::Inline { .. }));
        let text = parts[2].as_text().unwrap();
        assert!(text.contains("the content of the 2 attached file(s)"));
        assert!(text.contains("Source Text:\n\"Mitochondria"));
    }

    #[test]
    fn missing_objectives_asks_provider_to_infer() {
        let config = GeneratorConfig {
            language: Language::En,
            ..Default::default()
        };
        let text = generation_prompt(&config, false);
        assert!(text.contains("Identify relevant learning objectives"));
        assert!(text.contains("Course Code: Unknown."));
        assert!(text.contains("Target Group: Students."));
    }

    #[test]
    fn scope_restriction_is_appended() {
        let config = GeneratorConfig {
            language: Language::En,
            source_scope: Some("Chapter 4".into()),
            ..Default::default()
        };
        let text = generation_prompt(&config, false);
        assert!(text.contains("ONLY the following sections"));
        assert!(text.contains("\"Chapter 4\""));
    }

    #[test]
    fn language_directive_is_last() {
        for lang in [Language::Nl, Language::En] {
            let config = GeneratorConfig {
                language: lang,
                source_scope: Some("H1".into()),
                ..Default::default()
            };
            let text = generation_prompt(&config, false);
            assert!(text.ends_with(&format!(
                "OUTPUT LANGUAGE: {}. Ensure the JSON content is in this language.",
                lang.directive_name()
            )));
        }
    }

    #[test]
    fn single_mode_changes_opening_only() {
        let config = GeneratorConfig {
            language: Language::En,
            ..Default::default()
        };
        let full = generation_prompt(&config, false);
        let single = generation_prompt(&config, true);
        assert!(single.starts_with("Generate one (1) replacement exam question at WO Bachelor level. "));
        let full_rest = full.split_once('\n').unwrap().1;
        let single_rest = single.split_once(". Level").map(|(_, r)| r).unwrap();
        assert_eq!(format!("Level{single_rest}"), full_rest);
    }

    #[test]
    fn assembly_is_deterministic() {
        let config = GeneratorConfig {
            source_text: "x".repeat(60),
            files: vec![file("a.pdf")],
            ..Default::default()
        };
        assert_eq!(build_parts(&config, false), build_parts(&config, false));
    }

    #[test]
    fn random_mode_omits_original() {
        let text =
            regeneration_instruction(Language::En, RegenerationMode::Random, &question()).unwrap();
        assert!(!text.contains("q-7"));
        let text =
            regeneration_instruction(Language::En, RegenerationMode::Harder, &question()).unwrap();
        assert!(text.contains("\"id\":\"q-7\""));
        assert!(text.contains("HARDER"));
    }

    #[test]
    fn grading_key_comes_first() {
        let parts = grading_parts(&file("key.pdf"), &file("work.pdf"), Some(30.0));
        assert_eq!(parts[0].as_text(), Some("DOCUMENT 1: ANSWER KEY:"));
        assert_eq!(parts[2].as_text(), Some("DOCUMENT 2: STUDENT WORK:"));
        assert!(parts[4]
            .as_text()
            .unwrap()
            .contains("Total points available: 30. Scale if necessary."));
        let unscaled = grading_parts(&file("key.pdf"), &file("work.pdf"), None);
        assert!(!unscaled[4].as_text().unwrap().contains("Total points"));
    }

    #[test]
    fn system_instruction_names_language() {
        assert!(system_instruction(Language::Nl).contains("DUTCH (Nederlands)"));
        assert!(grading_instruction(Language::En).contains("LANGUAGE: ENGLISH"));
    }

    #[test]
    fn chat_instruction_carries_course_and_level() {
        let config = GeneratorConfig {
            course_code: Some("BIO-101".into()),
            language: Language::En,
            ..Default::default()
        };
        let text = chat_instruction(&config);
        assert!(text.contains("Course BIO-101, Level WO Bachelor"));
        assert!(text.ends_with("Speak English."));

        let dutch = chat_instruction(&GeneratorConfig::default());
        assert!(dutch.contains("Cursus -, Niveau WO Bachelor"));
        assert!(dutch.ends_with("Spreek Nederlands."));
    }
}
