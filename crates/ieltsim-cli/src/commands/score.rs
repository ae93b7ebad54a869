//! The `ieltsim score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;

use ieltsim_core::model::{Test, UserAnswers};
use ieltsim_core::scoring::{is_correct, score_reading};

pub fn execute(test_path: PathBuf, answers_path: PathBuf) -> Result<()> {
    let test = Test::load_json(&test_path)?;
    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers from {}", answers_path.display()))?;
    let answers: UserAnswers =
        serde_json::from_str(&content).context("failed to parse answers JSON")?;

    let outcome = score_reading(&test, &answers);
    let numbers = test.question_numbers();

    let mut table = Table::new();
    table.set_header(vec!["#", "Given", "Accepted", "Explanation"]);
    let mut incorrect = 0usize;
    for question in test.questions() {
        let given = answers.get(&question.id).map(String::as_str);
        if is_correct(question, given) {
            continue;
        }
        incorrect += 1;
        table.add_row(vec![
            numbers.get(&question.id).copied().unwrap_or(0).to_string(),
            given.unwrap_or("-").to_string(),
            question.correct_answer.join(" / "),
            question.explanation.clone().unwrap_or_default(),
        ]);
    }

    if incorrect > 0 {
        eprintln!("\nIncorrect or unanswered questions:\n{table}");
    }
    eprintln!(
        "\nReading score: {} / 40  (band {:.1})",
        outcome.score, outcome.band
    );
    Ok(())
}
