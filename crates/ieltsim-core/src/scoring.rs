//! Reading scorer and band arithmetic.
//!
//! Pure functions: no I/O, no session state. The session machine calls
//! these at submit time.

use crate::model::{Question, ReadingOutcome, Test, UserAnswers};

/// Minimum words expected for writing task 1.
pub const TASK1_MIN_WORDS: u32 = 150;
/// Minimum words expected for writing task 2.
pub const TASK2_MIN_WORDS: u32 = 250;

/// The official academic-reading raw-score to band conversion table.
///
/// Fixed external constant; out-of-range scores map to band 0.
pub fn band_for_raw_score(score: u32) -> f64 {
    match score {
        39..=40 => 9.0,
        37..=38 => 8.5,
        35..=36 => 8.0,
        33..=34 => 7.5,
        30..=32 => 7.0,
        27..=29 => 6.5,
        23..=26 => 6.0,
        19..=22 => 5.5,
        15..=18 => 5.0,
        13..=14 => 4.5,
        10..=12 => 4.0,
        8..=9 => 3.5,
        6..=7 => 3.0,
        4..=5 => 2.5,
        3 => 2.0,
        2 => 1.5,
        1 => 1.0,
        _ => 0.0,
    }
}

/// Canonical answer form: surrounding whitespace stripped, lowercased.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// A question is correct iff the normalized user answer is a non-empty
/// member of the normalized acceptable-answer set.
pub fn is_correct(question: &Question, answer: Option<&str>) -> bool {
    let Some(answer) = answer else {
        return false;
    };
    let normalized = normalize_answer(answer);
    if normalized.is_empty() {
        return false;
    }
    question
        .correct_answer
        .iter()
        .any(|accepted| normalize_answer(accepted) == normalized)
}

/// Score a reading attempt: correct count, band, and the answer key used.
pub fn score_reading(test: &Test, answers: &UserAnswers) -> ReadingOutcome {
    let mut score = 0u32;
    let mut answer_key = std::collections::BTreeMap::new();

    for question in test.questions() {
        answer_key.insert(question.id, question.correct_answer.clone());
        if is_correct(question, answers.get(&question.id).map(String::as_str)) {
            score += 1;
        }
    }

    ReadingOutcome {
        score,
        band: band_for_raw_score(score),
        user_answers: answers.clone(),
        answer_key,
    }
}

/// Ids of questions whose answer is missing or whitespace-empty, in
/// document order. Input to the pre-submit confirmation gate.
pub fn unanswered(test: &Test, answers: &UserAnswers) -> Vec<u32> {
    test.questions()
        .filter(|q| {
            answers
                .get(&q.id)
                .map(|a| a.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|q| q.id)
        .collect()
}

/// Round to the nearest half band, half-up (6.25 rounds to 6.5).
pub fn round_to_half_band(band: f64) -> f64 {
    (band * 2.0).round() / 2.0
}

/// Overall band for a full attempt: average the two section bands first,
/// then round to the nearest half band.
pub fn combine_overall_band(reading_band: f64, writing_band: f64) -> f64 {
    round_to_half_band((reading_band + writing_band) / 2.0)
}

/// Whitespace-delimited word count, used for the task minimums.
pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;

    fn question(correct: &[&str]) -> Question {
        Question {
            id: 1,
            kind: QuestionType::ShortAnswer,
            text: "Which city hosted the survey?".into(),
            options: vec![],
            correct_answer: correct.iter().map(|s| s.to_string()).collect(),
            explanation: None,
        }
    }

    #[test]
    fn band_table_covers_full_range() {
        for score in 0..=40u32 {
            let band = band_for_raw_score(score);
            assert!((0.0..=9.0).contains(&band), "score {score} gave {band}");
            // Half-band increments only.
            assert_eq!(band * 2.0, (band * 2.0).round());
        }
        assert_eq!(band_for_raw_score(40), 9.0);
        assert_eq!(band_for_raw_score(0), 0.0);
    }

    #[test]
    fn band_table_is_monotone() {
        for score in 1..=40u32 {
            assert!(
                band_for_raw_score(score) >= band_for_raw_score(score - 1),
                "table decreases at raw score {score}"
            );
        }
    }

    #[test]
    fn out_of_range_score_maps_to_zero() {
        assert_eq!(band_for_raw_score(41), 0.0);
        assert_eq!(band_for_raw_score(u32::MAX), 0.0);
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        let q = question(&["London"]);
        assert!(is_correct(&q, Some("  London  ")));
        assert!(is_correct(&q, Some("london")));
        assert!(is_correct(&q, Some("\tLONDON\n")));
        assert!(!is_correct(&q, Some("londons")));
    }

    #[test]
    fn empty_or_missing_answer_is_incorrect() {
        let q = question(&["TRUE"]);
        assert!(!is_correct(&q, None));
        assert!(!is_correct(&q, Some("")));
        assert!(!is_correct(&q, Some("   ")));
    }

    #[test]
    fn multi_valued_key_accepts_any_member() {
        let q = question(&["B", "b"]);
        assert!(is_correct(&q, Some("b")));
        assert!(is_correct(&q, Some("B ")));
        let q = question(&["nineteen", "19"]);
        assert!(is_correct(&q, Some("19")));
        assert!(is_correct(&q, Some("Nineteen")));
        assert!(!is_correct(&q, Some("20")));
    }

    #[test]
    fn combine_averages_then_rounds() {
        assert_eq!(combine_overall_band(6.0, 7.0), 6.5);
        // avg 6.25 rounds up to 6.5
        assert_eq!(combine_overall_band(5.5, 7.0), 6.5);
        // avg 6.75 rounds up to 7.0
        assert_eq!(combine_overall_band(6.5, 7.0), 7.0);
        assert_eq!(combine_overall_band(0.0, 0.0), 0.0);
        assert_eq!(combine_overall_band(9.0, 9.0), 9.0);
    }

    #[test]
    fn combine_is_commutative_and_half_granular() {
        let bands = [0.0, 2.5, 5.5, 6.0, 6.5, 7.0, 8.5, 9.0];
        for &a in &bands {
            for &b in &bands {
                let combined = combine_overall_band(a, b);
                assert_eq!(combined, combine_overall_band(b, a));
                assert_eq!(combined * 2.0, (combined * 2.0).round());
            }
        }
    }

    #[test]
    fn rounding_pinned_at_midpoints() {
        assert_eq!(round_to_half_band(6.125), 6.0);
        assert_eq!(round_to_half_band(6.25), 6.5);
        assert_eq!(round_to_half_band(6.375), 6.5);
        assert_eq!(round_to_half_band(6.75), 7.0);
    }

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one two  three\nfour"), 4);
    }
}
