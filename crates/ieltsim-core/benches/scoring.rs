//! Benchmarks for the reading scorer.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ieltsim_core::model::{
    ChartKind, ChartRow, Passage, Question, QuestionGroup, QuestionType, ReadingSection, Test,
    UserAnswers, WritingSection, WritingTask1, WritingTask2,
};
use ieltsim_core::scoring::{band_for_raw_score, score_reading};

fn forty_question_test() -> Test {
    let passages = (0..3u32)
        .map(|p| {
            let count = if p == 2 { 14 } else { 13 };
            Passage {
                passage_number: p + 1,
                title: format!("Passage {}", p + 1),
                content: "passage text ".repeat(200),
                question_groups: vec![QuestionGroup {
                    instructions: "Answer the questions.".into(),
                    questions: (0..count)
                        .map(|i| Question {
                            id: p * 13 + i + 1,
                            kind: QuestionType::ShortAnswer,
                            text: "Which term does the author use?".into(),
                            options: vec![],
                            correct_answer: vec!["Photosynthesis".into(), "photo-synthesis".into()],
                            explanation: None,
                        })
                        .collect(),
                    options: vec![],
                }],
            }
        })
        .collect();

    Test {
        reading: ReadingSection { passages },
        writing: WritingSection {
            task1: WritingTask1 {
                prompt: "Describe the chart.".into(),
                chart_type: ChartKind::Bar,
                data: vec![ChartRow {
                    name: "2022".into(),
                    series: BTreeMap::from([("Output".to_string(), 3.4)]),
                }],
                data_keys: vec!["Output".into()],
                colors: vec!["#8884d8".into()],
            },
            task2: WritingTask2 {
                prompt: "Discuss.".into(),
            },
        },
    }
}

fn bench_score_reading(c: &mut Criterion) {
    let test = forty_question_test();
    let answers: UserAnswers = test
        .questions()
        .map(|q| (q.id, "  PHOTOSYNTHESIS  ".to_string()))
        .collect();

    c.bench_function("score_reading_40_questions", |b| {
        b.iter(|| score_reading(black_box(&test), black_box(&answers)))
    });
}

fn bench_band_lookup(c: &mut Criterion) {
    c.bench_function("band_for_raw_score_full_range", |b| {
        b.iter(|| {
            for score in 0..=40u32 {
                black_box(band_for_raw_score(black_box(score)));
            }
        })
    });
}

criterion_group!(benches, bench_score_reading, bench_band_lookup);
criterion_main!(benches);
