use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use url::Url;

use quiz_core::model::{ParticipationId, QuizId};

use crate::config::QuizApiConfig;
use crate::error::BackendError;
use crate::ports::{
    Credential, ParticipationRecord, QuizContentService, QuizRecord, SubmissionReceipt,
    SubmissionService, SubmittedAnswer,
};

/// HTTP client for the quiz backend's participation and content endpoints.
#[derive(Clone, Debug)]
pub struct RestQuizBackend {
    client: Client,
    base_url: Url,
}

impl RestQuizBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &QuizApiConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Endpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request
            .header(AUTHORIZATION, credential.header_value())
            .header(CONTENT_TYPE, "application/json")
    }
}

#[async_trait]
impl QuizContentService for RestQuizBackend {
    async fn create_participation(
        &self,
        quiz_id: &QuizId,
        credential: &Credential,
    ) -> Result<ParticipationRecord, BackendError> {
        let url = self.endpoint(&["participation", "quiz", quiz_id.as_str()])?;
        let response = self
            .authorized(self.client.post(url), credential)
            .send()
            .await?;
        let response = ensure_success(response)?;
        Ok(response.json().await?)
    }

    async fn get_quiz_with_questions(
        &self,
        quiz_id: &QuizId,
        credential: &Credential,
    ) -> Result<QuizRecord, BackendError> {
        let url = self.endpoint(&["quiz", "with-questions", quiz_id.as_str()])?;
        let response = self
            .authorized(self.client.get(url), credential)
            .send()
            .await?;
        let response = ensure_success(response)?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SubmissionService for RestQuizBackend {
    async fn submit_answers(
        &self,
        participation_id: &ParticipationId,
        answers: &[SubmittedAnswer],
        credential: &Credential,
    ) -> Result<SubmissionReceipt, BackendError> {
        let url = self.endpoint(&["participation", participation_id.as_str(), "submit"])?;
        let response = self
            .authorized(self.client.post(url), credential)
            .json(&SubmitRequest { answers })
            .send()
            .await?;
        let response = ensure_success(response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = response.text().await?;
        Ok(parse_receipt(&content_type, &body))
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    answers: &'a [SubmittedAnswer],
}

fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
        other => BackendError::HttpStatus(other),
    })
}

/// Interpret a 2xx submission body. Plain-text bodies become the message;
/// malformed JSON still counts as a successful submission.
fn parse_receipt(content_type: &str, body: &str) -> SubmissionReceipt {
    let body = body.trim();
    if body.is_empty() {
        return SubmissionReceipt::default();
    }
    if !content_type.contains("application/json") {
        return SubmissionReceipt::with_message(body);
    }
    serde_json::from_str(body).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "submission response was not a receipt");
        SubmissionReceipt::with_message("Quiz submitted")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> RestQuizBackend {
        let config = QuizApiConfig::from_lookup(|key| {
            (key == "QUIZ_API_BASE_URL").then(|| base.to_string())
        })
        .unwrap();
        RestQuizBackend::new(&config).unwrap()
    }

    #[test]
    fn endpoints_extend_base_path() {
        let backend = backend("http://localhost:8086/api/v1");
        let url = backend
            .endpoint(&["participation", "quiz", "quiz-1"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8086/api/v1/participation/quiz/quiz-1");
    }

    #[test]
    fn endpoints_tolerate_trailing_slash_and_escape_ids() {
        let backend = backend("https://quiz.example.com/api/");
        let url = backend
            .endpoint(&["participation", "a b/c", "submit"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://quiz.example.com/api/participation/a%20b%2Fc/submit"
        );
    }

    #[test]
    fn json_receipt_is_parsed() {
        let receipt = parse_receipt(
            "application/json; charset=utf-8",
            r#"{ "score": 3, "percentage": 75.0, "totalQuestions": 4 }"#,
        );
        assert_eq!(receipt.score, Some(3));
        assert_eq!(receipt.total_questions, Some(4));
    }

    #[test]
    fn text_receipt_becomes_message() {
        let receipt = parse_receipt("text/plain", "Submitted!\n");
        assert_eq!(receipt, SubmissionReceipt::with_message("Submitted!"));
    }

    #[test]
    fn empty_body_carries_no_message() {
        assert_eq!(parse_receipt("text/plain", ""), SubmissionReceipt::default());
        assert_eq!(parse_receipt("", "  \n"), SubmissionReceipt::default());
        assert_eq!(parse_receipt("application/json", ""), SubmissionReceipt::default());
    }

    #[test]
    fn broken_json_still_counts_as_submitted() {
        let receipt = parse_receipt("application/json", "{ not json");
        assert_eq!(receipt, SubmissionReceipt::with_message("Quiz submitted"));
    }
}
