//! The risk-assessment dialog.
//!
//! Every user message is one turn. A turn either begins a new assessment or
//! hands the latest classification to the current [`Step`], which decides how
//! the user's risk score changes and whether the dialog re-asks, moves on, or
//! ends. Independently of the step, a standing crisis rule answers every turn
//! classified as `Priority_Danger` with a crisis referral.
//!
//! Nothing here performs I/O: [`Assessment::run_turn`] takes the persisted
//! state and returns the replies and the next state.

pub mod intent;
pub mod profile;
pub mod step;

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, info, warn};

use crate::base::{config::Config, prompts};

pub use intent::ClassifiedIntent;
pub use profile::UserProfile;
pub use step::{Action, DialogState, Mood, Outcome, Step};

/// Confidence thresholds, all exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Used by every step without an override.
    pub step: f32,
    /// Used by the standing crisis rule.
    pub priority_danger: f32,
    pub overrides: HashMap<Step, f32>,
}

impl Thresholds {
    pub fn for_step(&self, step: Step) -> f32 {
        self.overrides.get(&step).copied().unwrap_or(self.step)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            step: 0.70,
            priority_danger: 0.80,
            overrides: HashMap::new(),
        }
    }
}

/// Everything a turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Messages to send, in order.
    pub replies: Vec<String>,
    /// The state to persist; `None` once the dialog has ended.
    pub dialog: Option<DialogState>,
    /// Set when the dialog ended this turn.
    pub outcome: Option<Outcome>,
}

/// The dialog engine.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Debug, Clone)]
pub struct Assessment {
    thresholds: Arc<Thresholds>,
    max_reprompts: Option<u32>,
    crisis_referral: Arc<str>,
}

impl Default for Assessment {
    fn default() -> Self {
        Self::new(Thresholds::default(), None, prompts::CRISIS_REFERRAL)
    }
}

impl Assessment {
    pub fn new(thresholds: Thresholds, max_reprompts: Option<u32>, crisis_referral: impl Into<String>) -> Self {
        let crisis_referral: String = crisis_referral.into();

        Self {
            thresholds: Arc::new(thresholds),
            max_reprompts,
            crisis_referral: Arc::from(crisis_referral),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let thresholds = Thresholds {
            step: config.step_confidence_threshold,
            priority_danger: config.priority_danger_threshold,
            overrides: config.step_threshold_overrides.clone(),
        };

        Self::new(thresholds, config.max_reprompts, prompts::get_crisis_referral(config))
    }

    /// Whether the standing crisis rule fires for this classification.
    pub fn is_priority_danger(&self, intent: &ClassifiedIntent) -> bool {
        intent.is(intent::PRIORITY_DANGER, self.thresholds.priority_danger)
    }

    /// Runs one turn.
    ///
    /// With no active dialog, the turn begins a new assessment and the
    /// utterance is only checked against the crisis rule.
    pub fn run_turn(&self, dialog: Option<DialogState>, profile: &mut UserProfile, intent: &ClassifiedIntent) -> TurnOutcome {
        let mut replies = Vec::new();
        let danger = self.is_priority_danger(intent);

        if danger {
            warn!("Priority danger detected (confidence {:.2}); sending crisis referral.", intent.confidence);
            replies.push(self.crisis_referral.to_string());
        }

        let Some(mut dialog) = dialog else {
            return self.begin(replies, profile);
        };

        // A persisted `Result` needs no answer.
        if dialog.step == Step::Result {
            return self.finish(replies, profile, step::result_outcome(profile.suicidal_risk));
        }

        let threshold = self.thresholds.for_step(dialog.step);
        let decision = step::decide(&dialog, intent, profile, threshold);

        debug!("Step `{}` decided {:?} (delta {}).", dialog.step, decision.action, decision.delta);

        profile.suicidal_risk += decision.delta;

        if let Some(frequency) = decision.frequency {
            profile.frequency = Some(frequency);
        }

        if let Some(mood) = decision.mood {
            dialog.mood = Some(mood);
        }

        if let Some(reply) = decision.reply {
            replies.push(reply.to_string());
        }

        match decision.action {
            Action::Reprompt => {
                if self.max_reprompts.is_some_and(|max| dialog.reprompts >= max) {
                    return self.finish(replies, profile, Outcome::RetryLimit);
                }

                dialog.reprompts += 1;
                replies.push(prompts::CLARIFY.to_string());
                self.enter(replies, dialog, profile)
            }
            Action::Advance(next) => {
                dialog.step = next;
                dialog.reprompts = 0;
                self.enter(replies, dialog, profile)
            }
            // The crisis referral already went out; a farewell after it reads as dismissal.
            Action::End(Outcome::ConsentDeclined) if danger => {
                info!("Consent not given after a crisis referral; ending without a closing message.");

                TurnOutcome {
                    replies,
                    dialog: None,
                    outcome: Some(Outcome::ConsentDeclined),
                }
            }
            Action::End(outcome) => self.finish(replies, profile, outcome),
        }
    }

    /// Starts a fresh assessment; the score from any earlier one is discarded.
    fn begin(&self, mut replies: Vec<String>, profile: &mut UserProfile) -> TurnOutcome {
        info!("Beginning a new assessment.");

        profile.suicidal_risk = 0;
        profile.frequency = None;

        replies.push(prompts::greeting(profile.name.as_deref()));
        self.enter(replies, DialogState::new(), profile)
    }

    /// Asks the question of `dialog.step`, or evaluates it if it takes no answer.
    fn enter(&self, mut replies: Vec<String>, dialog: DialogState, profile: &UserProfile) -> TurnOutcome {
        match dialog.step.question(dialog.mood) {
            Some(question) => {
                replies.push(question.to_string());

                TurnOutcome {
                    replies,
                    dialog: Some(dialog),
                    outcome: None,
                }
            }
            None => self.finish(replies, profile, step::result_outcome(profile.suicidal_risk)),
        }
    }

    fn finish(&self, mut replies: Vec<String>, profile: &UserProfile, outcome: Outcome) -> TurnOutcome {
        info!("Assessment ended with `{}` (risk {}).", outcome, profile.suicidal_risk);

        replies.push(outcome.message(&self.crisis_referral).to_string());

        TurnOutcome {
            replies,
            dialog: None,
            outcome: Some(outcome),
        }
    }
}
