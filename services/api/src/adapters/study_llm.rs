//! services/api/src/adapters/study_llm.rs
//!
//! This module contains the adapter for the study LLM.
//! It implements the `StudyAiService` port from the `core` crate: text extraction
//! from uploads, summaries, quizzes and the study-buddy chat.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestMessageContentPartFile,
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FileObject, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use study_assistant_core::{
    domain::{ChatMessage, ChatRole, QuizQuestion},
    ports::{PortError, PortResult, StudyAiService},
};
use tracing::{error, warn};

const QUIZ_QUESTION_COUNT: usize = 5;

const PDF_MIME_TYPE: &str = "application/pdf";
const PDF_FILE_NAME: &str = "upload.pdf";

const EXTRACT_INSTRUCTIONS: &str = "Extract all text from this file. Keep paragraphs and headings where you can. If there is no text, reply with an empty message.";

const SUMMARY_INSTRUCTIONS: &str = "Summarize the text you are given. Cover the key points, main arguments and conclusions. Use short paragraphs.";

const QUIZ_INSTRUCTIONS: &str = r#"Write a multiple-choice quiz that tests comprehension of the text you are given.
Reply with a JSON object of the form {"quiz": [{"question": "...", "options": ["...", "...", "...", "..."], "correctAnswer": "..."}]}.
Every question has exactly 4 options and correctAnswer is copied verbatim from the options."#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StudyAiService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiStudyAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiStudyAdapter {
    /// Creates a new `OpenAiStudyAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Sends a chat completion and returns the text of the first choice.
    ///
    /// Provider errors are logged in full; the caller only sees `failure`.
    async fn complete(&self, request: CreateChatCompletionRequest, failure: &str) -> PortResult<String> {
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                error!("{}: {}", failure, e);
                PortError::Unexpected(failure.to_string())
            })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                error!("{}: the model returned no text content", failure);
                PortError::Unexpected(failure.to_string())
            })
    }

    fn request(&self, messages: Vec<ChatCompletionRequestMessage>) -> PortResult<CreateChatCompletionRequest> {
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(build_error)
    }
}

fn build_error(e: OpenAIError) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn system_message(content: impl Into<String>) -> PortResult<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(content.into())
        .build()
        .map_err(build_error)?
        .into())
}

fn user_message(content: impl Into<String>) -> PortResult<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content.into())
        .build()
        .map_err(build_error)?
        .into())
}

fn assistant_message(content: impl Into<String>) -> PortResult<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestAssistantMessageArgs::default()
        .content(content.into())
        .build()
        .map_err(build_error)?
        .into())
}

fn chat_system_prompt(context: &str) -> String {
    format!(
        "You are a friendly study buddy. Answer questions about the material below, clearly and encouragingly. \
         If a question is outside this material, say politely that you can only help with the material provided.\n\n\
         \"\"\"\n{}\n\"\"\"",
        context
    )
}

/// Maps the stored conversation onto provider messages and appends the new question.
fn chat_messages(
    history: &[ChatMessage],
    new_message: &str,
    context: &str,
) -> PortResult<Vec<ChatCompletionRequestMessage>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(system_message(chat_system_prompt(context))?);
    for message in history {
        messages.push(match message.role {
            ChatRole::User => user_message(message.content.as_str())?,
            ChatRole::Model => assistant_message(message.content.as_str())?,
        });
    }
    messages.push(user_message(new_message)?);
    Ok(messages)
}

#[derive(Deserialize)]
struct QuizEnvelope {
    quiz: Vec<QuizQuestion>,
}

/// Parses the model's `{"quiz": [...]}` reply, tolerating a markdown code fence.
///
/// Questions whose answer is not one of their options are dropped.
fn parse_quiz(raw: &str) -> PortResult<Vec<QuizQuestion>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    let envelope: QuizEnvelope = serde_json::from_str(body.trim())?;

    let total = envelope.quiz.len();
    let quiz: Vec<QuizQuestion> = envelope
        .quiz
        .into_iter()
        .filter(QuizQuestion::is_well_formed)
        .collect();
    if quiz.len() < total {
        warn!(
            dropped = total - quiz.len(),
            "Dropped generated quiz questions whose answer is not among the options"
        );
    }
    Ok(quiz)
}

/// Builds the request asking the model to read an image or PDF upload.
fn extraction_message(file_data: &[u8], mime_type: &str) -> PortResult<ChatCompletionRequestMessage> {
    let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(file_data));
    let upload: ChatCompletionRequestUserMessageContentPart = if mime_type.starts_with("image/") {
        ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(ImageUrlArgs::default().url(data_url).build().map_err(build_error)?)
            .build()
            .map_err(build_error)?
            .into()
    } else if mime_type == PDF_MIME_TYPE {
        ChatCompletionRequestUserMessageContentPart::File(ChatCompletionRequestMessageContentPartFile {
            file: FileObject {
                file_data: Some(data_url),
                file_id: None,
                filename: Some(PDF_FILE_NAME.to_string()),
            },
        })
    } else {
        return Err(PortError::InvalidInput(format!(
            "Files of type '{}' are not supported.",
            mime_type
        )));
    };

    let content: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
        upload,
        ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(EXTRACT_INSTRUCTIONS)
            .build()
            .map_err(build_error)?
            .into(),
    ];
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(build_error)?
        .into())
}

//=========================================================================================
// `StudyAiService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyAiService for OpenAiStudyAdapter {
    async fn extract_text(&self, file_data: &[u8], mime_type: &str) -> PortResult<String> {
        let mime_type = mime_type.trim().to_lowercase();

        // Plain-text uploads need no model call.
        if mime_type.starts_with("text/") || mime_type == "application/json" {
            return String::from_utf8(file_data.to_vec()).map_err(|_| {
                PortError::InvalidInput("The uploaded file is not valid UTF-8 text.".to_string())
            });
        }

        let message = extraction_message(file_data, &mime_type)?;
        let request = self.request(vec![message])?;
        self.complete(request, "Failed to process the file with the AI service.")
            .await
    }

    async fn generate_summary(&self, text: &str) -> PortResult<String> {
        let request = self.request(vec![
            system_message(SUMMARY_INSTRUCTIONS)?,
            user_message(format!("Text:\n\"\"\"\n{}\n\"\"\"", text))?,
        ])?;
        self.complete(request, "Failed to generate summary with the AI service.")
            .await
    }

    async fn generate_quiz(&self, text: &str) -> PortResult<Vec<QuizQuestion>> {
        let request = self.request(vec![
            system_message(QUIZ_INSTRUCTIONS)?,
            user_message(format!(
                "Write {} questions about this text:\n\"\"\"\n{}\n\"\"\"",
                QUIZ_QUESTION_COUNT, text
            ))?,
        ])?;

        let failure = "Failed to generate quiz with the AI service.";
        let raw = self.complete(request, failure).await?;
        parse_quiz(&raw).map_err(|e| {
            error!("{}: unparsable quiz reply: {}", failure, e);
            PortError::Unexpected(failure.to_string())
        })
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        new_message: &str,
        context: &str,
    ) -> PortResult<String> {
        let request = self.request(chat_messages(history, new_message, context)?)?;
        self.complete(request, "Failed to get a chat response from the AI service.")
            .await
    }
}
