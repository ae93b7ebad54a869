//! Core data model types for ieltsim.
//!
//! These are the fundamental types the entire system uses to represent a
//! generated test, the answers a candidate gives, and the final results.
//! Serde names follow the content provider's camelCase wire format, so a
//! saved test file round-trips against the generation schema.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of reading question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    FormCompletion,
    MatchingHeadings,
    TrueFalseNotGiven,
    SentenceCompletion,
    ShortAnswer,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::FormCompletion => "FORM_COMPLETION",
            QuestionType::MatchingHeadings => "MATCHING_HEADINGS",
            QuestionType::TrueFalseNotGiven => "TRUE_FALSE_NOT_GIVEN",
            QuestionType::SentenceCompletion => "SENTENCE_COMPLETION",
            QuestionType::ShortAnswer => "SHORT_ANSWER",
        };
        write!(f, "{name}")
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MULTIPLE_CHOICE" => Ok(QuestionType::MultipleChoice),
            "FORM_COMPLETION" => Ok(QuestionType::FormCompletion),
            "MATCHING_HEADINGS" => Ok(QuestionType::MatchingHeadings),
            "TRUE_FALSE_NOT_GIVEN" => Ok(QuestionType::TrueFalseNotGiven),
            "SENTENCE_COMPLETION" => Ok(QuestionType::SentenceCompletion),
            "SHORT_ANSWER" => Ok(QuestionType::ShortAnswer),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// A selectable answer option attached directly to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Display label (e.g. "A").
    pub label: String,
    /// The value recorded as the answer when selected.
    pub value: String,
}

/// A single reading question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier, unique across the entire test.
    pub id: u32,
    /// Question kind.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Prompt text (opaque formatted text, rendered verbatim).
    pub text: String,
    /// Options attached directly to this question; empty when the group's
    /// shared options (or free text) apply instead.
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    /// Acceptable answers. Always a set; a singular answer is a one-element
    /// set. Never empty in a valid test.
    pub correct_answer: Vec<String>,
    /// Explanation for the correct answer, shown on the results screen.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// An ordered run of questions sharing instructions and, for some kinds,
/// a shared option list (e.g. the headings of a MATCHING_HEADINGS task).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionGroup {
    /// Instructions shown above the group.
    pub instructions: String,
    /// The questions, in presentation order.
    pub questions: Vec<Question>,
    /// Shared selectable options; empty when questions carry their own.
    #[serde(default)]
    pub options: Vec<String>,
}

/// One reading text plus its question groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub passage_number: u32,
    pub title: String,
    /// Opaque formatted text; sanitization is a presentation concern.
    pub content: String,
    pub question_groups: Vec<QuestionGroup>,
}

/// The reading half of a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSection {
    pub passages: Vec<Passage>,
}

/// Chart kinds the task 1 prompt can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

/// One named row of chart data: a label plus the numeric series values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub name: String,
    #[serde(flatten)]
    pub series: BTreeMap<String, f64>,
}

/// Writing task 1: describe a chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingTask1 {
    pub prompt: String,
    pub chart_type: ChartKind,
    pub data: Vec<ChartRow>,
    pub data_keys: Vec<String>,
    pub colors: Vec<String>,
}

/// Writing task 2: an academic essay prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingTask2 {
    pub prompt: String,
}

/// The writing half of a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingSection {
    pub task1: WritingTask1,
    pub task2: WritingTask2,
}

/// A complete generated test. Immutable once generated; owned by the
/// session for the lifetime of one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    pub reading: ReadingSection,
    pub writing: WritingSection,
}

impl Test {
    /// All reading questions in document order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.reading
            .passages
            .iter()
            .flat_map(|p| p.question_groups.iter())
            .flat_map(|g| g.questions.iter())
    }

    /// Total reading question count (40 in a valid test).
    pub fn question_count(&self) -> usize {
        self.questions().count()
    }

    /// All question groups in document order, with their passage number.
    pub fn groups(&self) -> impl Iterator<Item = (u32, &QuestionGroup)> {
        self.reading
            .passages
            .iter()
            .flat_map(|p| p.question_groups.iter().map(move |g| (p.passage_number, g)))
    }

    pub fn group_count(&self) -> usize {
        self.reading
            .passages
            .iter()
            .map(|p| p.question_groups.len())
            .sum()
    }

    /// 1-based display numbers keyed by question id, in document order.
    pub fn question_numbers(&self) -> BTreeMap<u32, usize> {
        self.questions()
            .enumerate()
            .map(|(i, q)| (q.id, i + 1))
            .collect()
    }

    /// Flattened index of the group containing the given question.
    pub fn group_index_of(&self, question_id: u32) -> Option<usize> {
        self.groups()
            .position(|(_, g)| g.questions.iter().any(|q| q.id == question_id))
    }

    /// Look up a question by id.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions().find(|q| q.id == id)
    }

    /// Save the test as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize test")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write test to {}", path.display()))?;
        Ok(())
    }

    /// Load a test from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read test from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse test JSON")
    }
}

/// The candidate's working answers, keyed by question id. Never contains
/// ids absent from the current test.
pub type UserAnswers = BTreeMap<u32, String>;

/// The two essay texts, finalized exactly once per writing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingSubmission {
    pub task1: String,
    pub task2: String,
}

/// A band plus examiner feedback for one assessment criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionFeedback {
    pub band: f64,
    pub feedback: String,
}

/// Grading output for a writing submission. Immutable after receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingFeedback {
    pub task_achievement: CriterionFeedback,
    pub coherence_and_cohesion: CriterionFeedback,
    pub lexical_resource: CriterionFeedback,
    pub grammatical_range_and_accuracy: CriterionFeedback,
    pub overall_band: f64,
    pub word_count_task1: u32,
    pub word_count_task2: u32,
}

impl WritingFeedback {
    /// The four criteria with their official names, in report order.
    pub fn criteria(&self) -> [(&'static str, &CriterionFeedback); 4] {
        [
            ("Task Achievement", &self.task_achievement),
            ("Coherence and Cohesion", &self.coherence_and_cohesion),
            ("Lexical Resource", &self.lexical_resource),
            (
                "Grammatical Range and Accuracy",
                &self.grammatical_range_and_accuracy,
            ),
        ]
    }
}

/// Reading outcome: raw score, band, and the answers/key behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingOutcome {
    pub score: u32,
    pub band: f64,
    pub user_answers: UserAnswers,
    pub answer_key: BTreeMap<u32, Vec<String>>,
}

/// Writing outcome: the submission and, when grading succeeded, feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingOutcome {
    pub feedback: Option<WritingFeedback>,
    pub submission: WritingSubmission,
}

/// The terminal artifact of a session. Depending on the mode, exactly one
/// of {reading-only, writing-only, both} is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    /// Identifier of the attempt that produced these results.
    pub attempt_id: Uuid,
    /// When the results were finalized.
    pub completed_at: DateTime<Utc>,
    pub reading: Option<ReadingOutcome>,
    pub writing: Option<WritingOutcome>,
    pub overall_band: f64,
}

impl Results {
    /// Save the results as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize results")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read results from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse results JSON")
    }
}

/// Which test section an attempt starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Reading,
    Writing,
}

/// How an attempt is run: which section it starts in and whether it covers
/// both sections ("full") or a single one ("practice").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMode {
    pub section: Section,
    pub full: bool,
}

impl TestMode {
    /// Combined reading + writing attempt.
    pub fn full() -> Self {
        TestMode {
            section: Section::Reading,
            full: true,
        }
    }

    /// Reading-only practice attempt.
    pub fn reading_practice() -> Self {
        TestMode {
            section: Section::Reading,
            full: false,
        }
    }

    /// Writing-only practice attempt.
    pub fn writing_practice() -> Self {
        TestMode {
            section: Section::Writing,
            full: false,
        }
    }
}
