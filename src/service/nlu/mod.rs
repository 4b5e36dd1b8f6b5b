//! Intent classification for user utterances.
//!
//! The dialog only consumes the classifier's output contract: a top intent
//! label, its confidence, and an optional entity. Any provider that can
//! produce that is a valid implementation of [`GenericIntentClassifier`].

pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::warn;

use crate::{assessment::ClassifiedIntent, base::types::Res};

// Traits.

/// Generic intent classifier trait that clients must implement.
#[async_trait]
pub trait GenericIntentClassifier: Send + Sync + 'static {
    /// Classify a single utterance.
    ///
    /// Returns `Ok(None)` when the provider recognized no intent. Callers treat
    /// both `Ok(None)` and `Err(_)` as [`ClassifiedIntent::none`].
    async fn classify(&self, utterance: &str) -> Res<Option<ClassifiedIntent>>;
}

// Structs.

/// Intent classifier for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct IntentClassifier {
    inner: Arc<dyn GenericIntentClassifier>,
}

impl Deref for IntentClassifier {
    type Target = dyn GenericIntentClassifier;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl IntentClassifier {
    pub fn new(inner: Arc<dyn GenericIntentClassifier>) -> Self {
        Self { inner }
    }

    /// Classify, collapsing failures and empty results into [`ClassifiedIntent::none`].
    pub async fn classify_or_none(&self, utterance: &str) -> ClassifiedIntent {
        match self.classify(utterance).await {
            Ok(Some(intent)) => intent,
            Ok(None) => ClassifiedIntent::none(),
            Err(err) => {
                warn!("Intent classification failed: {}", err);
                ClassifiedIntent::none()
            }
        }
    }
}
