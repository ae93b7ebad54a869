//! Gemini API content provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use ieltsim_core::model::{Test, WritingFeedback, WritingSubmission};
use ieltsim_core::traits::ContentProvider;

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

const GENERATE_PROMPT: &str = "Generate a complete IELTS Academic computer-based test with Reading and Writing sections.
- The Reading section must have 3 passages and a total of 40 questions.
- Group the reading questions logically by task and provide clear, concise instructions for each group, exactly as they would appear on an official test.
- For MATCHING_HEADINGS question groups, you MUST provide an 'options' array at the group level containing the list of possible headings. The 'text' for each question in this group should name the paragraph it refers to (e.g. 'Paragraph A').
- For each Reading question, provide a brief but clear explanation for the correct answer.
- The Writing section must have Task 1 with a prompt, chartType ('bar' or 'line'), chart data, dataKeys, and colors. Task 2 should be an academic essay prompt. For the 'data' field in Task 1, you must provide a JSON string.
- Ensure a variety of question types: MULTIPLE_CHOICE, FORM_COMPLETION, MATCHING_HEADINGS, TRUE_FALSE_NOT_GIVEN, SENTENCE_COMPLETION, SHORT_ANSWER.
- For MULTIPLE_CHOICE questions, provide options. For other question types, the options array can be empty.
- The 'correctAnswer' field for all questions must be an array of strings, even if there is only one correct answer.
- Provide realistic content suitable for an official IELTS test.
- The final output MUST be a perfectly valid JSON object; any double quotes inside a string must be escaped.";

fn grade_prompt(submission: &WritingSubmission) -> String {
    format!(
        "As an expert IELTS examiner, evaluate the provided Writing Task 1 and \
         Task 2 submissions.\nProvide a band score and constructive feedback for \
         each of the four official criteria: Task Achievement/Response, Coherence \
         and Cohesion, Lexical Resource, and Grammatical Range and Accuracy.\nAlso \
         calculate an overall band score for the writing section (weighting Task 2 \
         more heavily) and provide the word count for each task.\n\nTask 1 \
         Submission:\n\"{}\"\n\nTask 2 Submission:\n\"{}\"\n\nThe final output \
         MUST be a perfectly valid JSON object; any double quotes inside a string \
         must be escaped.",
        submission.task1, submission.task2
    )
}

/// Gemini API backend for test generation and essay grading.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        GeminiProvider {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        }
    }

    /// Issue a schema-constrained JSON generation request and parse the
    /// first candidate's text as JSON.
    async fn request_json(&self, prompt: &str, schema: Value) -> Result<Value, ProviderError> {
        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(self.model.clone()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::ApiError { status, message });
        }

        let api_response: GeminiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let text = api_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or(ProviderError::EmptyResponse)?;

        serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedPayload(format!("candidate is not valid JSON: {e}")))
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[async_trait]
impl ContentProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate_test(&self) -> anyhow::Result<Test> {
        let mut payload = self.request_json(GENERATE_PROMPT, test_schema()).await?;

        // Task 1 chart data arrives as an embedded JSON string.
        if let Some(data) = payload.pointer_mut("/writing/task1/data") {
            if let Value::String(raw) = data {
                let rows: Value = serde_json::from_str(raw).map_err(|e| {
                    ProviderError::MalformedPayload(format!("chart data: {e}"))
                })?;
                *data = rows;
            }
        }

        let test: Test = serde_json::from_value(payload)
            .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;
        Ok(test)
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn grade_writing(
        &self,
        submission: &WritingSubmission,
    ) -> anyhow::Result<WritingFeedback> {
        let payload = self
            .request_json(&grade_prompt(submission), feedback_schema())
            .await?;
        let feedback: WritingFeedback = serde_json::from_value(payload)
            .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;
        Ok(feedback)
    }
}

/// Response schema for test generation, in Gemini's schema dialect.
fn test_schema() -> Value {
    let question = json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "INTEGER" },
            "type": {
                "type": "STRING",
                "enum": [
                    "MULTIPLE_CHOICE",
                    "FORM_COMPLETION",
                    "MATCHING_HEADINGS",
                    "TRUE_FALSE_NOT_GIVEN",
                    "SENTENCE_COMPLETION",
                    "SHORT_ANSWER"
                ]
            },
            "text": { "type": "STRING" },
            "options": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING" },
                        "value": { "type": "STRING" }
                    },
                    "required": ["label", "value"]
                }
            },
            "correctAnswer": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "The correct answer(s). Always an array of strings, even for a single answer."
            },
            "explanation": {
                "type": "STRING",
                "description": "A brief explanation for why the answer is correct."
            }
        },
        "required": ["id", "type", "text", "correctAnswer", "explanation"]
    });

    let question_group = json!({
        "type": "OBJECT",
        "properties": {
            "instructions": { "type": "STRING" },
            "questions": { "type": "ARRAY", "items": question },
            "options": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Shared options for the group, such as the headings of a MATCHING_HEADINGS task."
            }
        },
        "required": ["instructions", "questions"]
    });

    let passage = json!({
        "type": "OBJECT",
        "properties": {
            "passageNumber": { "type": "INTEGER" },
            "title": { "type": "STRING" },
            "content": { "type": "STRING" },
            "questionGroups": { "type": "ARRAY", "items": question_group }
        },
        "required": ["passageNumber", "title", "content", "questionGroups"]
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "reading": {
                "type": "OBJECT",
                "properties": {
                    "passages": { "type": "ARRAY", "items": passage }
                },
                "required": ["passages"]
            },
            "writing": {
                "type": "OBJECT",
                "properties": {
                    "task1": {
                        "type": "OBJECT",
                        "properties": {
                            "prompt": { "type": "STRING" },
                            "chartType": { "type": "STRING", "enum": ["bar", "line"] },
                            "data": {
                                "type": "STRING",
                                "description": "A JSON string encoding an array of chart rows. Each row has a 'name' string plus numeric properties for every dataKey."
                            },
                            "dataKeys": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "colors": { "type": "ARRAY", "items": { "type": "STRING" } }
                        },
                        "required": ["prompt", "chartType", "data", "dataKeys", "colors"]
                    },
                    "task2": {
                        "type": "OBJECT",
                        "properties": { "prompt": { "type": "STRING" } },
                        "required": ["prompt"]
                    }
                },
                "required": ["task1", "task2"]
            }
        },
        "required": ["reading", "writing"]
    })
}

/// Response schema for essay grading.
fn feedback_schema() -> Value {
    let criterion = || {
        json!({
            "type": "OBJECT",
            "properties": {
                "band": { "type": "NUMBER" },
                "feedback": { "type": "STRING" }
            },
            "required": ["band", "feedback"]
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "taskAchievement": criterion(),
            "coherenceAndCohesion": criterion(),
            "lexicalResource": criterion(),
            "grammaticalRangeAndAccuracy": criterion(),
            "overallBand": { "type": "NUMBER" },
            "wordCountTask1": { "type": "INTEGER" },
            "wordCountTask2": { "type": "INTEGER" }
        },
        "required": [
            "taskAchievement",
            "coherenceAndCohesion",
            "lexicalResource",
            "grammaticalRangeAndAccuracy",
            "overallBand",
            "wordCountTask1",
            "wordCountTask2"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{sample_feedback, sample_test};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Wrap a payload the way the API returns it: a single candidate whose
    /// text part is the JSON-encoded payload.
    fn candidate_body(payload: &Value) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": payload.to_string() }]
                }
            }]
        })
    }

    /// The sample test in wire form: chart data as an embedded JSON string.
    fn wire_test() -> Value {
        let mut value = serde_json::to_value(sample_test()).unwrap();
        let data = value.pointer("/writing/task1/data").unwrap().clone();
        *value.pointer_mut("/writing/task1/data").unwrap() = Value::String(data.to_string());
        value
    }

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new("test-key", Some(server.uri()), None)
    }

    #[tokio::test]
    async fn successful_generation_parses_embedded_chart_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body(&wire_test())))
            .mount(&server)
            .await;

        let test = provider(&server).generate_test().await.unwrap();
        assert_eq!(test.reading.passages.len(), 3);
        assert_eq!(test.question_count(), 40);
        assert_eq!(test.writing.task1.data.len(), 3);
        assert!(test.writing.task1.data[0].series.contains_key("Greenfield"));
    }

    #[tokio::test]
    async fn malformed_chart_data_is_a_hard_failure() {
        let server = MockServer::start().await;

        let mut payload = wire_test();
        *payload.pointer_mut("/writing/task1/data").unwrap() =
            Value::String("not valid json {".into());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body(&payload)))
            .mount(&server)
            .await;

        let err = provider(&server).generate_test().await.unwrap_err();
        assert!(err.to_string().contains("chart data"));
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = provider(&server).generate_test().await.unwrap_err();
        assert!(err.to_string().contains("authentication"));
    }

    #[tokio::test]
    async fn rate_limiting_honors_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = provider(&server).generate_test().await.unwrap_err();
        assert!(err.to_string().contains("retry after 7000ms"));
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = provider(&server).generate_test().await.unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }

    #[tokio::test]
    async fn successful_grading() {
        let server = MockServer::start().await;

        let payload = serde_json::to_value(sample_feedback()).unwrap();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body(&payload)))
            .mount(&server)
            .await;

        let submission = WritingSubmission {
            task1: "The chart shows visitor numbers falling in 2020.".into(),
            task2: "Museums serve the public best when access is universal.".into(),
        };
        let feedback = provider(&server).grade_writing(&submission).await.unwrap();
        assert_eq!(feedback.overall_band, 6.5);
        assert_eq!(feedback.criteria()[0].0, "Task Achievement");
    }
}
