//! Mock provider for tests and offline runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use ieltsim_core::model::{
    ChartKind, ChartRow, CriterionFeedback, Passage, Question, QuestionGroup, QuestionOption,
    QuestionType, ReadingSection, Test, WritingFeedback, WritingSection, WritingSubmission,
    WritingTask1, WritingTask2,
};
use ieltsim_core::scoring::word_count;
use ieltsim_core::traits::ContentProvider;

/// A deterministic content provider: canned test, canned feedback, and
/// switchable failure injection. Records calls for assertions.
pub struct MockContentProvider {
    fail_generate: bool,
    fail_grade: bool,
    feedback: WritingFeedback,
    generate_calls: AtomicU32,
    grade_calls: AtomicU32,
    last_submission: Mutex<Option<WritingSubmission>>,
}

impl MockContentProvider {
    pub fn new() -> Self {
        MockContentProvider {
            fail_generate: false,
            fail_grade: false,
            feedback: sample_feedback(),
            generate_calls: AtomicU32::new(0),
            grade_calls: AtomicU32::new(0),
            last_submission: Mutex::new(None),
        }
    }

    /// A mock whose generate operation always fails.
    pub fn failing_generation() -> Self {
        MockContentProvider {
            fail_generate: true,
            ..MockContentProvider::new()
        }
    }

    /// A mock whose grade operation always fails.
    pub fn failing_grading() -> Self {
        MockContentProvider {
            fail_grade: true,
            ..MockContentProvider::new()
        }
    }

    /// A mock returning the given feedback from grading.
    pub fn with_feedback(feedback: WritingFeedback) -> Self {
        MockContentProvider {
            feedback,
            ..MockContentProvider::new()
        }
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::Relaxed)
    }

    pub fn grade_calls(&self) -> u32 {
        self.grade_calls.load(Ordering::Relaxed)
    }

    /// The last submission passed to `grade_writing`.
    pub fn last_submission(&self) -> Option<WritingSubmission> {
        self.last_submission.lock().unwrap().clone()
    }
}

impl Default for MockContentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentProvider for MockContentProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_test(&self) -> anyhow::Result<Test> {
        self.generate_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_generate {
            anyhow::bail!("mock generation failure");
        }
        Ok(sample_test())
    }

    async fn grade_writing(
        &self,
        submission: &WritingSubmission,
    ) -> anyhow::Result<WritingFeedback> {
        self.grade_calls.fetch_add(1, Ordering::Relaxed);
        *self.last_submission.lock().unwrap() = Some(submission.clone());
        if self.fail_grade {
            anyhow::bail!("mock grading failure");
        }
        let mut feedback = self.feedback.clone();
        feedback.word_count_task1 = word_count(&submission.task1);
        feedback.word_count_task2 = word_count(&submission.task2);
        Ok(feedback)
    }
}

/// A fixed, contract-valid test: 3 passages, 40 questions across all six
/// question kinds, and a complete writing section.
pub fn sample_test() -> Test {
    let tfng = |id: u32, statement: &str, answer: &str| Question {
        id,
        kind: QuestionType::TrueFalseNotGiven,
        text: statement.to_string(),
        options: vec![],
        correct_answer: vec![answer.to_string()],
        explanation: Some("Compare the statement with paragraph B.".into()),
    };
    let completion = |id: u32, kind, text: &str, answer: &str| Question {
        id,
        kind,
        text: text.to_string(),
        options: vec![],
        correct_answer: vec![answer.to_string()],
        explanation: Some("The passage states this directly.".into()),
    };
    let heading = |id: u32, paragraph: char, answer: &str| Question {
        id,
        kind: QuestionType::MatchingHeadings,
        text: format!("Paragraph {paragraph}"),
        options: vec![],
        correct_answer: vec![answer.to_string()],
        explanation: Some("The paragraph's main idea matches this heading.".into()),
    };
    let choice = |id: u32, text: &str, answer: &str| Question {
        id,
        kind: QuestionType::MultipleChoice,
        text: text.to_string(),
        options: ["A", "B", "C", "D"]
            .iter()
            .map(|l| QuestionOption {
                label: l.to_string(),
                value: l.to_string(),
            })
            .collect(),
        correct_answer: vec![answer.to_string()],
        explanation: Some("Only this option is supported by the text.".into()),
    };

    let passage1 = Passage {
        passage_number: 1,
        title: "The Forgotten Reservoirs".into(),
        content: "Across the arid plateau, early engineers cut a lattice of \
                  underground channels that carried snowmelt to distant fields. \
                  Modern surveys suggest many of these systems still hold water \
                  today, though few are mapped.\n\nParagraph B describes how \
                  sediment slowly sealed the oldest channels."
            .into(),
        question_groups: vec![
            QuestionGroup {
                instructions: "Do the following statements agree with the information in the passage? Write TRUE, FALSE or NOT GIVEN.".into(),
                questions: vec![
                    tfng(1, "The channels were built to carry snowmelt.", "TRUE"),
                    tfng(2, "All of the channel systems have been mapped.", "FALSE"),
                    tfng(3, "The engineers worked only in winter.", "NOT GIVEN"),
                    tfng(4, "Sediment affected the oldest channels.", "TRUE"),
                    tfng(5, "Modern pumps have replaced every channel.", "FALSE"),
                    tfng(6, "Local farmers funded the original construction.", "NOT GIVEN"),
                ],
                options: vec![],
            },
            QuestionGroup {
                instructions: "Complete the sentences below with ONE WORD ONLY from the passage.".into(),
                questions: vec![
                    completion(7, QuestionType::SentenceCompletion, "The channels distributed water from melting ____.", "snow"),
                    completion(8, QuestionType::SentenceCompletion, "Over centuries the oldest channels were sealed by ____.", "sediment"),
                    completion(9, QuestionType::SentenceCompletion, "The network was cut beneath an arid ____.", "plateau"),
                    completion(10, QuestionType::SentenceCompletion, "Water was carried to distant ____.", "fields"),
                    completion(11, QuestionType::SentenceCompletion, "Recent ____ indicate water remains in many systems.", "surveys"),
                    completion(12, QuestionType::SentenceCompletion, "The channels formed a ____ under the ground.", "lattice"),
                    completion(13, QuestionType::SentenceCompletion, "Few of the systems appear on a modern ____.", "map"),
                ],
                options: vec![],
            },
        ],
    };

    let heading_options: Vec<String> = [
        "i. A network built for trade",
        "ii. Measuring what remains",
        "iii. The first cartographers",
        "iv. Goods that crossed the desert",
        "v. Why the routes moved",
        "vi. Taxing the caravans",
        "vii. Cities that vanished",
        "viii. A modern revival",
        "ix. The role of oases",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let passage2 = Passage {
        passage_number: 2,
        title: "Caravans of the Inland Sea".into(),
        content: "A. Long before rail, caravans moved silk and copper across \
                  the basin.\n\nB. Oases determined every route.\n\nC. Route \
                  shifts followed the slow drying of wells.\n\nD. Levies at \
                  each station paid for guards and water.\n\nE. Several \
                  staging towns were abandoned within a generation.\n\nF. \
                  Satellite imaging now traces the old roads.\n\nG. Tourism \
                  boards are reopening parts of the network.".into(),
        question_groups: vec![
            QuestionGroup {
                instructions: "Choose the correct heading for each paragraph from the list of headings below.".into(),
                questions: vec![
                    heading(14, 'A', "i"),
                    heading(15, 'B', "ix"),
                    heading(16, 'C', "v"),
                    heading(17, 'D', "vi"),
                    heading(18, 'E', "vii"),
                    heading(19, 'F', "ii"),
                    heading(20, 'G', "viii"),
                ],
                options: heading_options,
            },
            QuestionGroup {
                instructions: "Answer the questions below with NO MORE THAN TWO WORDS from the passage.".into(),
                questions: vec![
                    completion(21, QuestionType::ShortAnswer, "What did caravans carry besides silk?", "copper"),
                    completion(22, QuestionType::ShortAnswer, "What feature determined every route?", "oases"),
                    completion(23, QuestionType::ShortAnswer, "What did levies pay for besides water?", "guards"),
                    completion(24, QuestionType::ShortAnswer, "What technology now traces the old roads?", "satellite imaging"),
                    completion(25, QuestionType::ShortAnswer, "What happened to several staging towns?", "abandoned"),
                    completion(26, QuestionType::ShortAnswer, "Who is reopening parts of the network?", "tourism boards"),
                ],
                options: vec![],
            },
        ],
    };

    let passage3 = Passage {
        passage_number: 3,
        title: "Lighting the Victorian Harbour".into(),
        content: "The harbour's conversion from oil lanterns to electric \
                  arc lamps in 1887 halved night-time accidents within two \
                  years. A registration form preserved in the port archive \
                  records each vessel's cargo, tonnage and berth."
            .into(),
        question_groups: vec![
            QuestionGroup {
                instructions: "Choose the correct letter, A, B, C or D.".into(),
                questions: vec![
                    choice(27, "What replaced the oil lanterns?", "B"),
                    choice(28, "When did the conversion take place?", "A"),
                    choice(29, "What happened to night-time accidents?", "C"),
                    choice(30, "Where is the registration form preserved?", "D"),
                    choice(31, "What does the author say about tonnage?", "A"),
                    choice(32, "The word 'berth' refers to what?", "B"),
                    choice(33, "The passage is mainly about what?", "C"),
                ],
                options: vec![],
            },
            QuestionGroup {
                instructions: "Complete the form below with ONE WORD AND/OR A NUMBER from the passage.".into(),
                questions: vec![
                    completion(34, QuestionType::FormCompletion, "Year of conversion: ____", "1887"),
                    completion(35, QuestionType::FormCompletion, "Earlier light source: oil ____", "lanterns"),
                    completion(36, QuestionType::FormCompletion, "New light source: electric ____ lamps", "arc"),
                    completion(37, QuestionType::FormCompletion, "Records kept in the port ____", "archive"),
                    completion(38, QuestionType::FormCompletion, "Recorded per vessel: cargo, ____ and berth", "tonnage"),
                    completion(39, QuestionType::FormCompletion, "Accidents halved within two ____", "years"),
                    completion(40, QuestionType::FormCompletion, "Setting of the passage: the ____", "harbour"),
                ],
                options: vec![],
            },
        ],
    };

    Test {
        reading: ReadingSection {
            passages: vec![passage1, passage2, passage3],
        },
        writing: WritingSection {
            task1: WritingTask1 {
                prompt: "The chart shows average monthly visitors (in thousands) \
                         to three museums between 2019 and 2021. Summarise the \
                         information by selecting and reporting the main features."
                    .into(),
                chart_type: ChartKind::Bar,
                data: vec![
                    ChartRow {
                        name: "2019".into(),
                        series: [("Greenfield", 42.0), ("Harbourside", 31.5), ("Westgate", 18.0)]
                            .iter()
                            .map(|(k, v)| (k.to_string(), *v))
                            .collect(),
                    },
                    ChartRow {
                        name: "2020".into(),
                        series: [("Greenfield", 12.5), ("Harbourside", 9.0), ("Westgate", 6.5)]
                            .iter()
                            .map(|(k, v)| (k.to_string(), *v))
                            .collect(),
                    },
                    ChartRow {
                        name: "2021".into(),
                        series: [("Greenfield", 28.0), ("Harbourside", 22.5), ("Westgate", 15.0)]
                            .iter()
                            .map(|(k, v)| (k.to_string(), *v))
                            .collect(),
                    },
                ],
                data_keys: vec!["Greenfield".into(), "Harbourside".into(), "Westgate".into()],
                colors: vec!["#8884d8".into(), "#82ca9d".into(), "#ffc658".into()],
            },
            task2: WritingTask2 {
                prompt: "Some people believe museums should be free for everyone, \
                         while others think visitors should pay admission. Discuss \
                         both views and give your own opinion."
                    .into(),
            },
        },
    }
}

/// Canned feedback at a mid-range band.
pub fn sample_feedback() -> WritingFeedback {
    let criterion = |band: f64, feedback: &str| CriterionFeedback {
        band,
        feedback: feedback.to_string(),
    };
    WritingFeedback {
        task_achievement: criterion(6.5, "Covers the main trends with some detail."),
        coherence_and_cohesion: criterion(6.0, "Generally well organised; linking is mechanical."),
        lexical_resource: criterion(6.5, "Adequate range with occasional imprecision."),
        grammatical_range_and_accuracy: criterion(6.0, "Mix of structures; errors rarely impede."),
        overall_band: 6.5,
        word_count_task1: 168,
        word_count_task2: 274,
    }
}
