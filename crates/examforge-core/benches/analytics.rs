use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examforge_core::analytics::{compute_cutoff, exam_matrix};
use examforge_core::model::*;
use examforge_core::normalize::{normalize, sanitize_markup};
use examforge_core::verify::check_answer;

fn make_question(i: usize) -> Question {
    let open = i % 5 == 4;
    Question {
        id: format!("q{i}"),
        kind: if open {
            QuestionType::Open
        } else {
            QuestionType::SingleChoice
        },
        learning_objective: format!("LO{}", i % 4),
        stem: Some("<b>Case:</b> a patient presents with <i>retrograde</i> amnesia.".into()),
        question: format!("Which structure is most likely damaged in case {i}?"),
        options: if open {
            None
        } else {
            Some(vec![
                "<b>Hippocampus</b>".into(),
                "Cerebellum".into(),
                "Amygdala".into(),
                "Thalamus".into(),
            ])
        },
        correct_answer: CorrectAnswer::Single("Hippocampus".into()),
        explanation: "Consolidation depends on the hippocampus.".into(),
        rubric: None,
        cognitive_level: match i % 3 {
            0 => CognitiveLevel::Reproduction,
            1 => CognitiveLevel::Insight,
            _ => CognitiveLevel::Application,
        },
        score: Some(3),
    }
}

fn bench_cutoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("cutoff");

    for n in [5usize, 20, 200] {
        let questions: Vec<_> = (0..n).map(make_question).collect();
        group.bench_function(format!("questions={n}"), |b| {
            b.iter(|| compute_cutoff(black_box(&questions)))
        });
    }

    group.finish();
}

fn bench_matrix(c: &mut Criterion) {
    let questions: Vec<_> = (0..20).map(make_question).collect();
    c.bench_function("exam_matrix/20", |b| {
        b.iter(|| exam_matrix(black_box(&questions), Language::Nl))
    });
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let markup = "<p><b>H<sub>2</sub>O</b> and <i>CO<sub>2</sub></i>&nbsp;are <ul><li>gases</li></ul></p>";

    group.bench_function("normalize", |b| b.iter(|| normalize(black_box(markup))));
    group.bench_function("sanitize", |b| {
        b.iter(|| sanitize_markup(black_box(markup)))
    });

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let question = make_question(0);
    c.bench_function("check_answer", |b| {
        b.iter(|| check_answer(black_box(&question), black_box(&[0])))
    });
}

criterion_group!(benches, bench_cutoff, bench_matrix, bench_normalize, bench_verify);
criterion_main!(benches);
