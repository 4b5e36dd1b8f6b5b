//! OpenAI chat-completion intent classifier.

use std::sync::Arc;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    assessment::ClassifiedIntent,
    base::{config::Config, prompts::get_classifier_directive, types::Res},
};

use super::{GenericIntentClassifier, IntentClassifier};

// Extra methods on `IntentClassifier` applied by the openai implementation.

impl IntentClassifier {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiIntentClassifier::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI intent classifier implementation.
#[derive(Clone)]
pub struct OpenAiIntentClassifier {
    client: Client<OpenAIConfig>,
    model: String,
    directive: String,
    temperature: f32,
}

impl OpenAiIntentClassifier {
    #[instrument(name = "OpenAiIntentClassifier::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            model: config.openai_classifier_model.clone(),
            directive: get_classifier_directive(config).to_string(),
            temperature: config.openai_classifier_temperature,
        }
    }
}

#[async_trait]
impl GenericIntentClassifier for OpenAiIntentClassifier {
    #[instrument(skip(self))]
    async fn classify(&self, utterance: &str) -> Res<Option<ClassifiedIntent>> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(self.directive.clone()),
                name: Some("System".to_string()),
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(utterance.to_string()),
                name: Some("User".to_string()),
            }),
        ];

        let request = CreateChatCompletionRequestArgs::default().model(&self.model).messages(messages).temperature(self.temperature).build()?;

        let response = self.client.chat().create(request).await?;
        let content = response.choices.first().and_then(|choice| choice.message.content.clone()).unwrap_or_default();

        debug!("Classifier returned: {}", content);

        parse_classification(&content)
    }
}

// Helpers.

/// The JSON object the directive asks the model for.
#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    label: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    entity: Option<String>,
}

/// Parses the model's answer into the classifier contract.
///
/// Tolerates a surrounding code fence. `None` and empty labels mean no intent.
fn parse_classification(content: &str) -> Res<Option<ClassifiedIntent>> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    if json.is_empty() {
        return Ok(None);
    }

    let raw: RawClassification = serde_json::from_str(json)?;
    let label = raw.label.trim();

    if label.is_empty() || label == "None" {
        return Ok(None);
    }

    let confidence = if raw.confidence.is_finite() { raw.confidence.clamp(0.0, 1.0) } else { 0.0 };

    Ok(Some(ClassifiedIntent {
        label: label.to_string(),
        confidence,
        entity: raw.entity.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
    }))
}

// Tests.
