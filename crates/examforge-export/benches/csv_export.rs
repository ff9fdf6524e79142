use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examforge_core::model::*;
use examforge_export::csv::{ans_csv, generic_csv};
use examforge_export::slides::{build_deck, render_pptx};
use examforge_export::ExportVariant;

fn make_exam(n: usize) -> GeneratedExam {
    let questions = (0..n)
        .map(|i| Question {
            id: format!("q{i}"),
            kind: QuestionType::MultipleResponse,
            learning_objective: format!("LO{}", i % 3),
            stem: Some("A <i>\"quoted\"</i> case, with commas".into()),
            question: format!("Which of the following hold for <b>sample {i}</b>?"),
            options: Some(vec![
                "<sub>first</sub>".into(),
                "second, with comma".into(),
                "third".into(),
                "fourth".into(),
            ]),
            correct_answer: CorrectAnswer::Multiple(vec!["third".into(), "fourth".into()]),
            explanation: "Both follow from the definition.".into(),
            rubric: None,
            cognitive_level: CognitiveLevel::Insight,
            score: Some(2),
        })
        .collect();
    GeneratedExam {
        metadata: ExamMetadata {
            title: "Benchmark exam".into(),
            ..Default::default()
        },
        questions,
        integration_info: None,
    }
}

fn bench_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv");

    for n in [5usize, 20, 200] {
        let exam = make_exam(n);
        group.bench_function(format!("generic/{n}"), |b| {
            b.iter(|| generic_csv(black_box(&exam)))
        });
        group.bench_function(format!("ans/{n}"), |b| b.iter(|| ans_csv(black_box(&exam))));
    }

    group.finish();
}

fn bench_pptx(c: &mut Criterion) {
    let exam = make_exam(20);
    let config = GeneratorConfig::default();
    let deck = build_deck(&exam, &config, ExportVariant::Teacher);
    c.bench_function("pptx/20", |b| b.iter(|| render_pptx(black_box(&deck))));
}

criterion_group!(benches, bench_csv, bench_pptx);
criterion_main!(benches);
