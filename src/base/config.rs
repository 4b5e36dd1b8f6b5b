//! Load configuration via `config` crate with env-override support.

use std::{collections::HashMap, ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::assessment::Step;

use super::types::Res;

/// Default OpenAI classifier model to use
fn default_openai_classifier_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Default sampling temperature for the OpenAI classifier
fn default_openai_classifier_temperature() -> f32 {
    0.0
}

/// Default database endpoint (in-memory).
fn default_db_endpoint() -> String {
    "mem://".to_string()
}

/// Default database namespace.
fn default_db_namespace() -> String {
    "lifeline".to_string()
}

/// Default database name.
fn default_db_database() -> String {
    "bot".to_string()
}

/// Default confidence a step requires before it acts on a classification.
fn default_step_confidence_threshold() -> f32 {
    0.70
}

/// Default confidence the standing crisis rule requires.
fn default_priority_danger_threshold() -> f32 {
    0.80
}

/// Configuration for the lifeline-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// OpenAI model used for intent classification (`OPENAI_CLASSIFIER_MODEL`).
    #[serde(default = "default_openai_classifier_model")]
    pub openai_classifier_model: String,
    /// Sampling temperature for the classifier model (`OPENAI_CLASSIFIER_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_openai_classifier_temperature")]
    pub openai_classifier_temperature: f32,
    /// Optional custom classifier directive to override the default (`CLASSIFIER_DIRECTIVE`).
    #[serde(default)]
    pub classifier_directive: Option<String>,
    /// Optional custom crisis referral message to override the default (`CRISIS_REFERRAL_MESSAGE`).
    #[serde(default)]
    pub crisis_referral_message: Option<String>,
    /// Slack app token (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Database endpoint URL (`DB_ENDPOINT`), e.g. `mem://` or `ws://localhost:8000`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`DB_USERNAME`); sign-in is skipped when empty.
    #[serde(default)]
    pub db_username: String,
    /// Database password (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: String,
    /// Database namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Confidence a step requires, exclusive (`STEP_CONFIDENCE_THRESHOLD`).
    #[serde(default = "default_step_confidence_threshold")]
    pub step_confidence_threshold: f32,
    /// Confidence the standing crisis rule requires, exclusive (`PRIORITY_DANGER_THRESHOLD`).
    #[serde(default = "default_priority_danger_threshold")]
    pub priority_danger_threshold: f32,
    /// Per-step threshold overrides, keyed by snake_case step name.
    #[serde(default)]
    pub step_threshold_overrides: HashMap<Step, f32>,
    /// Clarifications allowed per step before the dialog ends (`MAX_REPROMPTS`).
    /// Unbounded when unset.
    #[serde(default)]
    pub max_reprompts: Option<u32>,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("LIFELINE_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Res<()> {
        if self.openai_classifier_temperature < 0.0 || self.openai_classifier_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI classifier temperature must be between 0 and 2."));
        }

        if !(0.0..=1.0).contains(&self.step_confidence_threshold) {
            return Err(anyhow::anyhow!("Step confidence threshold must be between 0 and 1."));
        }

        if !(0.0..=1.0).contains(&self.priority_danger_threshold) {
            return Err(anyhow::anyhow!("Priority danger threshold must be between 0 and 1."));
        }

        if let Some((step, _)) = self.step_threshold_overrides.iter().find(|(_, t)| !(0.0..=1.0).contains(*t)) {
            return Err(anyhow::anyhow!("Threshold override for `{}` must be between 0 and 1.", step));
        }

        if self.max_reprompts == Some(0) {
            return Err(anyhow::anyhow!("Max reprompts must be at least 1 when set."));
        }

        Ok(())
    }
}
