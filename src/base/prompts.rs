//! User-facing messages and the classifier directive.
//!
//! The bot talks to Korean-speaking teenagers, so every message sent to the
//! user is Korean. The classifier directive is written in English since it is
//! only ever read by the model.

use crate::base::config::Config;

// Dialog questions.

/// Asked when the assessment begins.
pub const GET_AGREEMENT_QUESTION: &str = "지금부터 요즘 마음 상태에 대해 몇 가지 질문을 드려도 괜찮을까요?";

/// Open question about the user's day-to-day life.
pub const ASK_FEELING_QUESTION: &str = "요즘 하루하루 어떻게 지내고 있는지 편하게 이야기해 줄래요?";

/// Asks whether the user's mood has been low or fine.
pub const SUICIDAL_THINKING_QUESTION: &str = "최근 기분은 어땠나요? 우울하거나 힘든 기분이 자주 들었나요, 아니면 괜찮게 지냈나요?";

/// Relationship question after a negative mood report.
pub const RELATIONSHIP_QUESTION_NEGATIVE: &str = "혹시 가족이나 친구처럼 주변 사람들과의 관계 때문에 힘든 일이 있나요?";

/// Relationship question after a positive mood report.
pub const RELATIONSHIP_QUESTION_POSITIVE: &str = "그래도 요즘 고민되거나 누군가의 도움이 필요한 일이 있나요?";

/// Asks how often the user feels alone.
pub const FREQUENCY_OF_FEELING_QUESTION: &str = "세상에 혼자라고 느끼거나 내 편이 아무도 없다고 느낄 때가 있나요?";

/// Asks how often thoughts of suicide come up.
pub const TRY_SUICIDE_QUESTION: &str = "죽고 싶다는 생각은 얼마나 자주 드나요? '전혀', '가끔', '자주', '항상' 중에서 골라 줄래요?";

/// Asks whether the user has a concrete plan.
pub const PLAN_SUICIDE_QUESTION: &str = "혹시 구체적으로 자살을 계획해 본 적이 있나요?";

/// Asks about previous attempts before the result.
pub const BEFORE_RESULT_QUESTION: &str = "이전에 자해를 하거나 자살을 시도해 본 적이 있나요?";

// Step replies.

/// Sent after the user answers the open question.
pub const ASK_FEELING_ACK: &str = "이야기해 줘서 고마워요.";

/// Sent after a negative mood report.
pub const NEGATIVE_FEELING_REPLY: &str = "많이 힘들었겠어요. 조금 더 이야기 나눠 볼게요.";

/// Sent after a positive mood report.
pub const POSITIVE_FEELING_REPLY: &str = "괜찮게 지내고 있다니 다행이에요.";

/// Sent after the user says they feel alone.
pub const ALONE_REPLY: &str = "혼자라고 느끼는 건 정말 외롭고 힘든 일이에요. 그렇게 느끼는 건 당신 잘못이 아니에요.";

/// Sent after a frequency answer has been captured.
pub const FREQUENCY_REPLY: &str = "솔직하게 말해 줘서 고마워요.";

/// Sent when the user answers yes to a question that adds to the score.
pub const AFFIRMATIVE_REPLY: &str = "그랬군요. 말해 줘서 고마워요.";

/// Sent when the user answers no to a question.
pub const NEGATIVE_REPLY: &str = "알겠어요.";

// Clarification.

/// Sent when the classification is not usable for the current step.
pub const CLARIFY: &str = "제가 잘 이해하지 못했어요. 다시 한 번 말해 줄래요?";

// Terminal messages.

/// The user did not agree to the assessment.
pub const CONSENT_DECLINED: &str = "알겠어요. 이야기하고 싶어지면 언제든 다시 말을 걸어 주세요.";

/// The user said they need no further help.
pub const NO_HELP_NEEDED: &str = "지금은 도움이 필요하지 않다니 다행이에요. 힘든 일이 생기면 언제든 다시 찾아와 주세요.";

/// Default crisis referral, also used for the standing priority rule.
pub const CRISIS_REFERRAL: &str = "지금 당장 도움이 필요해 보여요. 혼자 견디지 말고 자살예방상담전화 109나 청소년상담전화 1388로 바로 연락해 주세요. 위급한 상황이라면 112나 119에 연락해 주세요.";

/// High risk at the end of the assessment.
pub const HIGH_RISK_RESULT: &str = "이야기를 들어 보니 지금 많이 힘든 상태인 것 같아요. 전문 상담 선생님과 꼭 이야기해 보길 바라요. 자살예방상담전화 109와 청소년상담전화 1388은 24시간 열려 있어요.";

/// Low risk at the end of the assessment.
pub const LOW_RISK_RESULT: &str = "끝까지 이야기해 줘서 고마워요. 지금은 위험이 높아 보이지 않지만, 힘들 때는 언제든 청소년상담전화 1388에 연락할 수 있어요.";

/// The dialog state could not be interpreted.
pub const INVALID_STATE: &str = "죄송해요. 대화를 이어가는 중에 문제가 생겼어요. 메시지를 보내서 처음부터 다시 시작해 주세요.";

/// The clarification limit was reached.
pub const RETRY_LIMIT: &str = "대답을 잘 이해하지 못해서 대화를 여기서 마칠게요. 도움이 필요하면 청소년상담전화 1388로 연락해 주세요.";

/// Builds the greeting sent when an assessment begins.
pub fn greeting(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => format!("안녕하세요, {}님. 저는 마음 이야기를 함께 나누는 상담 챗봇이에요.", name.trim()),
        _ => "안녕하세요. 저는 마음 이야기를 함께 나누는 상담 챗봇이에요.".to_string(),
    }
}

// Classifier.

/// System directive for the intent classifier.
pub const CLASSIFIER_DIRECTIVE: &str = r#####"
# Role

You are an intent classifier for a Korean-language youth counseling chatbot.  You never talk to the user.  You receive exactly one user utterance and return exactly one JSON object describing its intent.

## Labels

- `Panswer`: the user agrees or answers yes (e.g. "네", "응", "좋아요", "있어요").
- `Nanswer`: the user declines or answers no (e.g. "아니요", "싫어", "없어요").
- `Pfeeling`: the user reports a good or neutral mood (e.g. "괜찮아요", "기분 좋아").
- `Nfeeling`: the user reports a low, sad, or anxious mood (e.g. "우울해요", "힘들어").
- `Alone`: the user says they feel lonely or that nobody is on their side.
- `Frequency`: the user answers how often something happens.  Put the matching word into `entity`, which must be exactly one of "전혀", "가끔", "자주", "항상".
- `Priority_Danger`: the user expresses imminent danger to themselves (e.g. a method, a time, or that they are about to act).
- `None`: nothing above fits.

## Output

Return _just_ the JSON, with no code fences and no other text:

{"label": "<label>", "confidence": <number between 0 and 1>, "entity": <string or null>}

`confidence` is your probability that the label is correct.  Be conservative; use a low confidence when the utterance is ambiguous.
"#####;

/// Get the classifier directive, using the config override if provided.
pub fn get_classifier_directive(config: &Config) -> &str {
    if let Some(custom_directive) = &config.classifier_directive { custom_directive } else { CLASSIFIER_DIRECTIVE }
}

/// Get the crisis referral message, using the config override if provided.
pub fn get_crisis_referral(config: &Config) -> &str {
    if let Some(custom_referral) = &config.crisis_referral_message {
        custom_referral
    } else {
        CRISIS_REFERRAL
    }
}
