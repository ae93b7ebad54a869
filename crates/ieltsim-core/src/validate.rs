//! Generated-test contract validation.
//!
//! The content provider's output is untrusted: a payload that parses can
//! still violate the generation contract. `validate_test` enforces the hard
//! constraints (any defect aborts generation); `lint_test` reports soft
//! findings that never block.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::model::{QuestionType, Test};

/// Required number of reading passages.
pub const REQUIRED_PASSAGES: usize = 3;
/// Required total reading question count.
pub const REQUIRED_QUESTIONS: usize = 40;

/// A single hard contract violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestDefect {
    #[error("expected {REQUIRED_PASSAGES} reading passages, found {found}")]
    PassageCount { found: usize },

    #[error("expected {REQUIRED_QUESTIONS} reading questions, found {found}")]
    QuestionCount { found: usize },

    #[error("question id {id} appears more than once")]
    DuplicateQuestionId { id: u32 },

    #[error("question {id} has no acceptable answers")]
    EmptyAnswerKey { id: u32 },

    #[error("matching-headings group {group_index} has no shared heading options")]
    MissingHeadingOptions { group_index: usize },

    #[error("writing task 1 has no chart rows")]
    EmptyChartData,

    #[error("writing task 1 names no data series")]
    EmptyDataKeys,

    #[error("writing task 1 has no series colors")]
    EmptyColors,

    #[error("chart row '{row}' is missing series '{key}'")]
    MissingSeriesValue { row: String, key: String },
}

/// All hard defects found in one pass over the test.
#[derive(Debug, Clone)]
pub struct TestValidationError {
    pub defects: Vec<TestDefect>,
}

impl std::error::Error for TestValidationError {}

impl fmt::Display for TestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generated test violates the content contract: ")?;
        for (i, defect) in self.defects.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{defect}")?;
        }
        Ok(())
    }
}

/// Check the hard constraints of the generate contract.
pub fn validate_test(test: &Test) -> Result<(), TestValidationError> {
    let mut defects = Vec::new();

    let passages = test.reading.passages.len();
    if passages != REQUIRED_PASSAGES {
        defects.push(TestDefect::PassageCount { found: passages });
    }

    let questions = test.question_count();
    if questions != REQUIRED_QUESTIONS {
        defects.push(TestDefect::QuestionCount { found: questions });
    }

    let mut seen_ids = HashSet::new();
    for question in test.questions() {
        if !seen_ids.insert(question.id) {
            defects.push(TestDefect::DuplicateQuestionId { id: question.id });
        }
        if question.correct_answer.is_empty() {
            defects.push(TestDefect::EmptyAnswerKey { id: question.id });
        }
    }

    for (index, (_, group)) in test.groups().enumerate() {
        let is_matching_headings = group
            .questions
            .iter()
            .any(|q| q.kind == QuestionType::MatchingHeadings);
        if is_matching_headings && group.options.is_empty() {
            defects.push(TestDefect::MissingHeadingOptions { group_index: index });
        }
    }

    let task1 = &test.writing.task1;
    if task1.data.is_empty() {
        defects.push(TestDefect::EmptyChartData);
    }
    if task1.data_keys.is_empty() {
        defects.push(TestDefect::EmptyDataKeys);
    }
    if task1.colors.is_empty() {
        defects.push(TestDefect::EmptyColors);
    }
    for row in &task1.data {
        for key in &task1.data_keys {
            if !row.series.contains_key(key) {
                defects.push(TestDefect::MissingSeriesValue {
                    row: row.name.clone(),
                    key: key.clone(),
                });
            }
        }
    }

    if defects.is_empty() {
        Ok(())
    } else {
        Err(TestValidationError { defects })
    }
}

/// A soft finding from test linting.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question id, if the finding is question-scoped.
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Report soft issues worth surfacing without blocking the attempt.
pub fn lint_test(test: &Test) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for (_, group) in test.groups() {
        for question in &group.questions {
            if question.kind == QuestionType::MultipleChoice
                && question.options.is_empty()
                && group.options.is_empty()
            {
                warnings.push(ValidationWarning {
                    question_id: Some(question.id),
                    message: "multiple-choice question has no selectable options".into(),
                });
            }
            if question.explanation.is_none() {
                warnings.push(ValidationWarning {
                    question_id: Some(question.id),
                    message: "no explanation provided for the correct answer".into(),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ChartKind, ChartRow, Passage, Question, QuestionGroup, QuestionType, ReadingSection,
        WritingSection, WritingTask1, WritingTask2,
    };
    use std::collections::BTreeMap;

    fn question(id: u32, kind: QuestionType) -> Question {
        Question {
            id,
            kind,
            text: format!("Q{id}"),
            options: vec![],
            correct_answer: vec!["A".into()],
            explanation: Some("Stated directly.".into()),
        }
    }

    /// Three passages, 40 questions, well-formed writing section.
    fn valid_test() -> Test {
        let passages = (1..=3)
            .map(|n| {
                let count = if n == 3 { 14 } else { 13 };
                let start = (n - 1) * 13 + 1;
                let kind = match n {
                    1 => QuestionType::TrueFalseNotGiven,
                    2 => QuestionType::MatchingHeadings,
                    _ => QuestionType::MultipleChoice,
                };
                Passage {
                    passage_number: n as u32,
                    title: format!("Passage {n}"),
                    content: "text".into(),
                    question_groups: vec![QuestionGroup {
                        instructions: "Answer the questions.".into(),
                        questions: (start..start + count)
                            .map(|id| {
                                let mut q = question(id as u32, kind);
                                if kind == QuestionType::MultipleChoice {
                                    q.options = vec![crate::model::QuestionOption {
                                        label: "A".into(),
                                        value: "A".into(),
                                    }];
                                }
                                q
                            })
                            .collect(),
                        options: if kind == QuestionType::MatchingHeadings {
                            vec!["i".into(), "ii".into()]
                        } else {
                            vec![]
                        },
                    }],
                }
            })
            .collect();

        Test {
            reading: ReadingSection { passages },
            writing: WritingSection {
                task1: WritingTask1 {
                    prompt: "Describe the chart.".into(),
                    chart_type: ChartKind::Line,
                    data: vec![ChartRow {
                        name: "2020".into(),
                        series: BTreeMap::from([("Sales".to_string(), 12.0)]),
                    }],
                    data_keys: vec!["Sales".into()],
                    colors: vec!["#82ca9d".into()],
                },
                task2: WritingTask2 {
                    prompt: "Discuss.".into(),
                },
            },
        }
    }

    #[test]
    fn valid_test_passes() {
        assert!(validate_test(&valid_test()).is_ok());
    }

    #[test]
    fn wrong_passage_count_is_a_defect() {
        let mut test = valid_test();
        test.reading.passages.pop();
        let err = validate_test(&test).unwrap_err();
        assert!(err
            .defects
            .iter()
            .any(|d| matches!(d, TestDefect::PassageCount { found: 2 })));
    }

    #[test]
    fn wrong_question_count_is_a_defect() {
        let mut test = valid_test();
        test.reading.passages[0].question_groups[0].questions.pop();
        let err = validate_test(&test).unwrap_err();
        assert!(err
            .defects
            .iter()
            .any(|d| matches!(d, TestDefect::QuestionCount { found: 39 })));
    }

    #[test]
    fn duplicate_ids_and_empty_keys_are_defects() {
        let mut test = valid_test();
        test.reading.passages[0].question_groups[0].questions[1].id = 1;
        test.reading.passages[0].question_groups[0].questions[2]
            .correct_answer
            .clear();
        let err = validate_test(&test).unwrap_err();
        assert!(err
            .defects
            .iter()
            .any(|d| matches!(d, TestDefect::DuplicateQuestionId { id: 1 })));
        assert!(err
            .defects
            .iter()
            .any(|d| matches!(d, TestDefect::EmptyAnswerKey { .. })));
    }

    #[test]
    fn matching_headings_requires_shared_options() {
        let mut test = valid_test();
        test.reading.passages[1].question_groups[0].options.clear();
        let err = validate_test(&test).unwrap_err();
        assert!(err
            .defects
            .iter()
            .any(|d| matches!(d, TestDefect::MissingHeadingOptions { .. })));
    }

    #[test]
    fn malformed_chart_payload_is_a_defect() {
        let mut test = valid_test();
        test.writing.task1.data[0].series.clear();
        test.writing.task1.colors.clear();
        let err = validate_test(&test).unwrap_err();
        assert!(err
            .defects
            .iter()
            .any(|d| matches!(d, TestDefect::MissingSeriesValue { .. })));
        assert!(err.defects.contains(&TestDefect::EmptyColors));
    }

    #[test]
    fn lint_flags_optionless_multiple_choice() {
        let mut test = valid_test();
        test.reading.passages[2].question_groups[0].questions[0]
            .options
            .clear();
        let warnings = lint_test(&test);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("no selectable options")));
    }
}
