//! Waterfall steps and the per-step decision functions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::base::prompts;

use super::{
    intent::{ALONE, ClassifiedIntent, FREQUENCY, FrequencyLevel, NEGATIVE_ANSWER, NEGATIVE_FEELING, POSITIVE_ANSWER, POSITIVE_FEELING},
    profile::UserProfile,
};

/// Scores above this are classified as high risk.
pub const HIGH_RISK_ABOVE: i32 = 5;

/// A position in the fixed waterfall.
///
/// A step is "waiting for the answer to its own question": entering it sends
/// [`Step::question`], and the next turn is decided by [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    GetAgreement,
    AskFeeling,
    SuicidalThinking,
    Relationship,
    FrequencyOfFeeling,
    TrySuicide,
    PlanSuicide,
    BeforeResult,
    Result,
}

impl Step {
    /// Every step, in waterfall order.
    pub const ALL: [Step; 9] = [
        Step::GetAgreement,
        Step::AskFeeling,
        Step::SuicidalThinking,
        Step::Relationship,
        Step::FrequencyOfFeeling,
        Step::TrySuicide,
        Step::PlanSuicide,
        Step::BeforeResult,
        Step::Result,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::GetAgreement => "get_agreement",
            Step::AskFeeling => "ask_feeling",
            Step::SuicidalThinking => "suicidal_thinking",
            Step::Relationship => "relationship",
            Step::FrequencyOfFeeling => "frequency_of_feeling",
            Step::TrySuicide => "try_suicide",
            Step::PlanSuicide => "plan_suicide",
            Step::BeforeResult => "before_result",
            Step::Result => "result",
        }
    }

    /// The question asked on entering this step. `Result` asks nothing.
    pub fn question(self, mood: Option<Mood>) -> Option<&'static str> {
        let question = match self {
            Step::GetAgreement => prompts::GET_AGREEMENT_QUESTION,
            Step::AskFeeling => prompts::ASK_FEELING_QUESTION,
            Step::SuicidalThinking => prompts::SUICIDAL_THINKING_QUESTION,
            Step::Relationship => match mood {
                Some(Mood::Positive) => prompts::RELATIONSHIP_QUESTION_POSITIVE,
                _ => prompts::RELATIONSHIP_QUESTION_NEGATIVE,
            },
            Step::FrequencyOfFeeling => prompts::FREQUENCY_OF_FEELING_QUESTION,
            Step::TrySuicide => prompts::TRY_SUICIDE_QUESTION,
            Step::PlanSuicide => prompts::PLAN_SUICIDE_QUESTION,
            Step::BeforeResult => prompts::BEFORE_RESULT_QUESTION,
            Step::Result => return None,
        };

        Some(question)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The mood reported at `SuicidalThinking`; selects the `Relationship` branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Negative,
    Positive,
}

/// Dialog position persisted between turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogState {
    pub step: Step,
    #[serde(default)]
    pub mood: Option<Mood>,
    /// Clarifications sent for the current step.
    #[serde(default)]
    pub reprompts: u32,
}

impl DialogState {
    pub fn new() -> Self {
        Self {
            step: Step::GetAgreement,
            mood: None,
            reprompts: 0,
        }
    }
}

impl Default for DialogState {
    fn default() -> Self {
        Self::new()
    }
}

/// How a dialog ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    ConsentDeclined,
    NoHelpNeeded,
    Crisis,
    HighRisk,
    LowRisk,
    InvalidState,
    RetryLimit,
}

impl Outcome {
    /// The closing message for this outcome.
    pub fn message(self, crisis_referral: &str) -> &str {
        match self {
            Outcome::ConsentDeclined => prompts::CONSENT_DECLINED,
            Outcome::NoHelpNeeded => prompts::NO_HELP_NEEDED,
            Outcome::Crisis => crisis_referral,
            Outcome::HighRisk => prompts::HIGH_RISK_RESULT,
            Outcome::LowRisk => prompts::LOW_RISK_RESULT,
            Outcome::InvalidState => prompts::INVALID_STATE,
            Outcome::RetryLimit => prompts::RETRY_LIMIT,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::ConsentDeclined => "consent_declined",
            Outcome::NoHelpNeeded => "no_help_needed",
            Outcome::Crisis => "crisis",
            Outcome::HighRisk => "high_risk",
            Outcome::LowRisk => "low_risk",
            Outcome::InvalidState => "invalid_state",
            Outcome::RetryLimit => "retry_limit",
        };

        f.write_str(name)
    }
}

/// What the dialog does after a step has decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Clarify and ask the same step again.
    Reprompt,
    /// Move to the given step.
    Advance(Step),
    /// Stop the dialog.
    End(Outcome),
}

/// The full effect of one step on one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub delta: i32,
    pub reply: Option<&'static str>,
    pub mood: Option<Mood>,
    pub frequency: Option<String>,
}

impl Decision {
    fn new(action: Action) -> Self {
        Self {
            action,
            delta: 0,
            reply: None,
            mood: None,
            frequency: None,
        }
    }

    pub fn reprompt() -> Self {
        Self::new(Action::Reprompt)
    }

    pub fn advance(next: Step) -> Self {
        Self::new(Action::Advance(next))
    }

    pub fn end(outcome: Outcome) -> Self {
        Self::new(Action::End(outcome))
    }

    fn with_delta(mut self, delta: i32) -> Self {
        self.delta = delta;
        self
    }

    fn with_reply(mut self, reply: &'static str) -> Self {
        self.reply = Some(reply);
        self
    }

    fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    fn with_frequency(mut self, frequency: String) -> Self {
        self.frequency = Some(frequency);
        self
    }
}

/// Classifies a final score.
pub fn result_outcome(suicidal_risk: i32) -> Outcome {
    if suicidal_risk > HIGH_RISK_ABOVE { Outcome::HighRisk } else { Outcome::LowRisk }
}

/// Decides what the current step does with the user's latest classification.
///
/// This is pure: the caller applies the returned [`Decision`] to the profile
/// and dialog state.
pub fn decide(state: &DialogState, intent: &ClassifiedIntent, profile: &UserProfile, threshold: f32) -> Decision {
    let is = |label: &str| intent.is(label, threshold);

    match state.step {
        Step::GetAgreement => {
            if is(POSITIVE_ANSWER) {
                Decision::advance(Step::AskFeeling)
            } else {
                Decision::end(Outcome::ConsentDeclined)
            }
        }
        // An open question: whatever the user said, including nothing the classifier recognizes, answers it.
        Step::AskFeeling => Decision::advance(Step::SuicidalThinking).with_reply(prompts::ASK_FEELING_ACK),
        Step::SuicidalThinking => {
            if is(NEGATIVE_FEELING) {
                Decision::advance(Step::Relationship).with_delta(1).with_mood(Mood::Negative).with_reply(prompts::NEGATIVE_FEELING_REPLY)
            } else if is(POSITIVE_FEELING) {
                Decision::advance(Step::Relationship).with_delta(-1).with_mood(Mood::Positive).with_reply(prompts::POSITIVE_FEELING_REPLY)
            } else {
                Decision::reprompt()
            }
        }
        Step::Relationship => match state.mood {
            None => Decision::end(Outcome::InvalidState),
            Some(Mood::Positive) => {
                if is(POSITIVE_ANSWER) {
                    Decision::advance(Step::FrequencyOfFeeling).with_delta(2).with_reply(prompts::AFFIRMATIVE_REPLY)
                } else if is(NEGATIVE_ANSWER) {
                    Decision::end(Outcome::NoHelpNeeded)
                } else {
                    Decision::reprompt()
                }
            }
            Some(Mood::Negative) => {
                if is(POSITIVE_ANSWER) {
                    Decision::advance(Step::FrequencyOfFeeling).with_delta(3).with_reply(prompts::AFFIRMATIVE_REPLY)
                } else if is(NEGATIVE_ANSWER) {
                    Decision::advance(Step::FrequencyOfFeeling).with_reply(prompts::NEGATIVE_REPLY)
                } else {
                    Decision::reprompt()
                }
            }
        },
        Step::FrequencyOfFeeling => {
            if is(ALONE) {
                Decision::advance(Step::TrySuicide).with_delta(2).with_reply(prompts::ALONE_REPLY)
            } else if is(POSITIVE_FEELING) {
                Decision::advance(Step::TrySuicide).with_delta(-1).with_reply(prompts::POSITIVE_FEELING_REPLY)
            } else {
                Decision::reprompt()
            }
        }
        Step::TrySuicide => {
            let entity = intent.entity.as_deref().filter(|_| is(FREQUENCY));

            match entity.and_then(|e| FrequencyLevel::from_entity(e).map(|level| (e, level))) {
                Some((entity, level)) => Decision::advance(Step::PlanSuicide)
                    .with_delta(level.risk_delta())
                    .with_frequency(entity.trim().to_string())
                    .with_reply(prompts::FREQUENCY_REPLY),
                None => Decision::reprompt(),
            }
        }
        Step::PlanSuicide => {
            if is(POSITIVE_ANSWER) {
                Decision::end(Outcome::Crisis).with_delta(5)
            } else if is(NEGATIVE_ANSWER) {
                Decision::advance(Step::BeforeResult).with_reply(prompts::NEGATIVE_REPLY)
            } else {
                Decision::reprompt()
            }
        }
        Step::BeforeResult => {
            if is(POSITIVE_ANSWER) {
                Decision::advance(Step::Result).with_delta(3).with_reply(prompts::AFFIRMATIVE_REPLY)
            } else if is(NEGATIVE_ANSWER) {
                Decision::advance(Step::Result).with_reply(prompts::NEGATIVE_REPLY)
            } else {
                Decision::reprompt()
            }
        }
        Step::Result => Decision::end(result_outcome(profile.suicidal_risk)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: f32 = 0.70;

    fn at(step: Step) -> DialogState {
        DialogState { step, ..DialogState::new() }
    }

    fn with_mood(step: Step, mood: Mood) -> DialogState {
        DialogState { step, mood: Some(mood), reprompts: 0 }
    }

    fn decide_at(state: &DialogState, intent: ClassifiedIntent) -> Decision {
        decide(state, &intent, &UserProfile::default(), T)
    }

    #[test]
    fn get_agreement() {
        let d = decide_at(&at(Step::GetAgreement), ClassifiedIntent::new(POSITIVE_ANSWER, 0.71));
        assert_eq!(d.action, Action::Advance(Step::AskFeeling));

        let d = decide_at(&at(Step::GetAgreement), ClassifiedIntent::new(NEGATIVE_ANSWER, 0.71));
        assert_eq!(d.action, Action::End(Outcome::ConsentDeclined));

        let d = decide_at(&at(Step::GetAgreement), ClassifiedIntent::new(POSITIVE_ANSWER, 0.5));
        assert_eq!(d.action, Action::End(Outcome::ConsentDeclined));
        assert_eq!(d.delta, 0);
    }

    #[test]
    fn unusable_classification_reprompts_without_delta() {
        let unusable = [ClassifiedIntent::none(), ClassifiedIntent::new(NEGATIVE_FEELING, 0.70), ClassifiedIntent::new("", 0.95)];

        let states = [
            at(Step::SuicidalThinking),
            with_mood(Step::Relationship, Mood::Negative),
            with_mood(Step::Relationship, Mood::Positive),
            at(Step::FrequencyOfFeeling),
            at(Step::TrySuicide),
            at(Step::PlanSuicide),
            at(Step::BeforeResult),
        ];

        for state in &states {
            for intent in &unusable {
                let d = decide_at(state, intent.clone());
                assert_eq!(d.action, Action::Reprompt, "{} with {:?}", state.step, intent);
                assert_eq!(d.delta, 0);
                assert_eq!(d.frequency, None);
            }
        }
    }

    #[test]
    fn ask_feeling_accepts_any_answer() {
        for intent in [ClassifiedIntent::none(), ClassifiedIntent::new(NEGATIVE_FEELING, 0.3), ClassifiedIntent::new(ALONE, 0.9)] {
            let d = decide_at(&at(Step::AskFeeling), intent);
            assert_eq!((d.action, d.delta), (Action::Advance(Step::SuicidalThinking), 0));
            assert_eq!(d.reply, Some(prompts::ASK_FEELING_ACK));
        }
    }

    #[test]
    fn suicidal_thinking_sets_mood() {
        let d = decide_at(&at(Step::SuicidalThinking), ClassifiedIntent::new(NEGATIVE_FEELING, 0.9));
        assert_eq!((d.action, d.delta, d.mood), (Action::Advance(Step::Relationship), 1, Some(Mood::Negative)));

        let d = decide_at(&at(Step::SuicidalThinking), ClassifiedIntent::new(POSITIVE_FEELING, 0.9));
        assert_eq!((d.action, d.delta, d.mood), (Action::Advance(Step::Relationship), -1, Some(Mood::Positive)));

        let d = decide_at(&at(Step::SuicidalThinking), ClassifiedIntent::new(POSITIVE_ANSWER, 0.9));
        assert_eq!(d.action, Action::Reprompt);
    }

    #[test]
    fn relationship_branches_on_mood() {
        let yes = ClassifiedIntent::new(POSITIVE_ANSWER, 0.9);
        let no = ClassifiedIntent::new(NEGATIVE_ANSWER, 0.9);

        let d = decide_at(&with_mood(Step::Relationship, Mood::Positive), yes.clone());
        assert_eq!((d.action, d.delta), (Action::Advance(Step::FrequencyOfFeeling), 2));

        let d = decide_at(&with_mood(Step::Relationship, Mood::Positive), no.clone());
        assert_eq!((d.action, d.delta), (Action::End(Outcome::NoHelpNeeded), 0));

        let d = decide_at(&with_mood(Step::Relationship, Mood::Negative), yes.clone());
        assert_eq!((d.action, d.delta), (Action::Advance(Step::FrequencyOfFeeling), 3));

        let d = decide_at(&with_mood(Step::Relationship, Mood::Negative), no);
        assert_eq!((d.action, d.delta), (Action::Advance(Step::FrequencyOfFeeling), 0));

        let d = decide_at(&at(Step::Relationship), yes);
        assert_eq!((d.action, d.delta), (Action::End(Outcome::InvalidState), 0));
    }

    #[test]
    fn frequency_of_feeling() {
        let d = decide_at(&at(Step::FrequencyOfFeeling), ClassifiedIntent::new(ALONE, 0.9));
        assert_eq!((d.action, d.delta), (Action::Advance(Step::TrySuicide), 2));

        let d = decide_at(&at(Step::FrequencyOfFeeling), ClassifiedIntent::new(POSITIVE_FEELING, 0.9));
        assert_eq!((d.action, d.delta), (Action::Advance(Step::TrySuicide), -1));
    }

    #[test]
    fn try_suicide_captures_frequency() {
        for (entity, delta) in [("전혀", 0), ("가끔", 1), ("자주", 2), ("항상", 3)] {
            let d = decide_at(&at(Step::TrySuicide), ClassifiedIntent::new(FREQUENCY, 0.9).with_entity(entity));
            assert_eq!(d.action, Action::Advance(Step::PlanSuicide));
            assert_eq!(d.delta, delta);
            assert_eq!(d.frequency.as_deref(), Some(entity));
        }

        // Unknown entity or missing entity.
        let d = decide_at(&at(Step::TrySuicide), ClassifiedIntent::new(FREQUENCY, 0.9).with_entity("매일"));
        assert_eq!(d.action, Action::Reprompt);
        let d = decide_at(&at(Step::TrySuicide), ClassifiedIntent::new(FREQUENCY, 0.9));
        assert_eq!(d.action, Action::Reprompt);

        // Entity on the wrong label is ignored.
        let d = decide_at(&at(Step::TrySuicide), ClassifiedIntent::new(ALONE, 0.9).with_entity("항상"));
        assert_eq!(d.action, Action::Reprompt);
    }

    #[test]
    fn plan_suicide() {
        let d = decide_at(&at(Step::PlanSuicide), ClassifiedIntent::new(POSITIVE_ANSWER, 0.9));
        assert_eq!((d.action, d.delta), (Action::End(Outcome::Crisis), 5));

        let d = decide_at(&at(Step::PlanSuicide), ClassifiedIntent::new(NEGATIVE_ANSWER, 0.9));
        assert_eq!((d.action, d.delta), (Action::Advance(Step::BeforeResult), 0));
    }

    #[test]
    fn before_result() {
        let d = decide_at(&at(Step::BeforeResult), ClassifiedIntent::new(POSITIVE_ANSWER, 0.9));
        assert_eq!((d.action, d.delta), (Action::Advance(Step::Result), 3));

        let d = decide_at(&at(Step::BeforeResult), ClassifiedIntent::new(NEGATIVE_ANSWER, 0.9));
        assert_eq!((d.action, d.delta), (Action::Advance(Step::Result), 0));
    }

    #[test]
    fn result_boundary_is_low_risk() {
        assert_eq!(result_outcome(5), Outcome::LowRisk);
        assert_eq!(result_outcome(6), Outcome::HighRisk);
        assert_eq!(result_outcome(-2), Outcome::LowRisk);

        let profile = UserProfile { suicidal_risk: 6, ..Default::default() };
        let d = decide(&at(Step::Result), &ClassifiedIntent::none(), &profile, T);
        assert_eq!(d.action, Action::End(Outcome::HighRisk));
    }

    #[test]
    fn every_step_but_result_asks_a_question() {
        for step in Step::ALL {
            assert_eq!(step.question(None).is_none(), step == Step::Result, "{step}");
        }

        assert_eq!(Step::Relationship.question(Some(Mood::Positive)), Some(prompts::RELATIONSHIP_QUESTION_POSITIVE));
        assert_eq!(Step::Relationship.question(Some(Mood::Negative)), Some(prompts::RELATIONSHIP_QUESTION_NEGATIVE));
    }

    #[test]
    fn step_names_match_serde() {
        for step in Step::ALL {
            assert_eq!(serde_json::to_string(&step).unwrap(), format!("\"{}\"", step.name()));
        }
    }
}
