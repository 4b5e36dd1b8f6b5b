#![cfg(test)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lifeline_bot::{
    assessment::{Assessment, ClassifiedIntent, Outcome, Step, Thresholds},
    base::{
        prompts,
        types::{Res, Void},
    },
    interaction::{
        gate::TurnGate,
        turn::{IncomingTurn, process_turn},
    },
    service::{
        chat::{ChatClient, GenericChatClient},
        db::DbClient,
        nlu::{GenericIntentClassifier, IntentClassifier},
    },
};
use mockall::mock;

// Mocks.

// Mock chat client for testing.

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        fn bot_user_id(&self) -> &str;
        async fn start(&self) -> Void;
        async fn send_message(&self, conversation_id: &str, text: &str) -> Void;
        async fn user_name(&self, user_id: &str) -> Res<Option<String>>;
    }
}

// Mock intent classifier for testing.

mock! {
    pub Nlu {}

    #[async_trait]
    impl GenericIntentClassifier for Nlu {
        async fn classify(&self, utterance: &str) -> Res<Option<ClassifiedIntent>>;
    }
}

type Outbox = Arc<Mutex<Vec<(String, String)>>>;

/// A chat client that records every sent message.
fn get_mock_chat(outbox: Outbox) -> MockChat {
    let mut mock = MockChat::new();

    mock.expect_bot_user_id().return_const("U0BOT".to_string());
    mock.expect_start().returning(|| Ok(()));
    mock.expect_send_message().returning(move |conversation_id, text| {
        outbox.lock().unwrap().push((conversation_id.to_string(), text.to_string()));
        Ok(())
    });
    mock.expect_user_name().returning(|_| Ok(Some("하늘".to_string())));

    mock
}

/// Maps fixed test utterances to classifications.
fn script(utterance: &str) -> Res<Option<ClassifiedIntent>> {
    let intent = match utterance {
        "안녕" => None,
        "네" => Some(ClassifiedIntent::new("Panswer", 0.9)),
        "아니요" => Some(ClassifiedIntent::new("Nanswer", 0.9)),
        "그냥 그래요" => Some(ClassifiedIntent::new("Pfeeling", 0.75)),
        "우울해요" => Some(ClassifiedIntent::new("Nfeeling", 0.9)),
        "괜찮아요" => Some(ClassifiedIntent::new("Pfeeling", 0.9)),
        "외로워요" => Some(ClassifiedIntent::new("Alone", 0.9)),
        "가끔" => Some(ClassifiedIntent::new("Frequency", 0.9).with_entity("가끔")),
        "항상" => Some(ClassifiedIntent::new("Frequency", 0.9).with_entity("항상")),
        "지금 옥상이에요" => Some(ClassifiedIntent::new("Priority_Danger", 0.81)),
        "음..." => Some(ClassifiedIntent::new("Nfeeling", 0.4)),
        "서버 오류" => return Err(anyhow::anyhow!("classifier unavailable")),
        _ => None,
    };

    Ok(intent)
}

fn get_mock_nlu() -> MockNlu {
    let mut mock = MockNlu::new();
    mock.expect_classify().returning(|utterance| script(utterance));
    mock
}

struct TestEnvironment {
    db: DbClient,
    nlu: IntentClassifier,
    chat: ChatClient,
    assessment: Assessment,
    gate: TurnGate,
    outbox: Outbox,
}

impl TestEnvironment {
    /// Sends one user message and returns the messages the bot sent in reply.
    async fn say(&self, conversation_id: &str, text: &str) -> Vec<String> {
        self.outbox.lock().unwrap().clear();

        let turn = IncomingTurn {
            conversation_id: conversation_id.to_string(),
            user_id: "U0USER".to_string(),
            text: text.to_string(),
        };

        process_turn(&turn, &self.db, &self.nlu, &self.chat, &self.assessment, &self.gate).await.expect("Turn failed");

        self.outbox.lock().unwrap().iter().map(|(_, text)| text.clone()).collect()
    }

    async fn step(&self, conversation_id: &str) -> Option<Step> {
        let state = self.db.get_or_create_conversation(conversation_id).await.expect("Failed to load conversation");
        state.dialog.map(|d| d.step)
    }

    async fn risk(&self, conversation_id: &str) -> i32 {
        let state = self.db.get_or_create_conversation(conversation_id).await.expect("Failed to load conversation");
        state.profile.suicidal_risk
    }
}

/// Helper function to setup the test environment.
async fn setup_test_environment(assessment: Assessment) -> TestEnvironment {
    let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));

    // Initialize the database (using in-memory for tests).
    let db = DbClient::surreal_memory().await.expect("Failed to create DB client");

    let nlu = IntentClassifier::new(Arc::new(get_mock_nlu()));
    let chat = ChatClient::new(Arc::new(get_mock_chat(outbox.clone())));

    TestEnvironment {
        db,
        nlu,
        chat,
        assessment,
        gate: TurnGate::new(),
        outbox,
    }
}

#[tokio::test]
async fn test_first_message_greets_by_name() {
    let env = setup_test_environment(Assessment::default()).await;

    let replies = env.say("D01", "안녕").await;

    assert_eq!(replies, vec![prompts::greeting(Some("하늘")), prompts::GET_AGREEMENT_QUESTION.to_string()]);
    assert_eq!(env.step("D01").await, Some(Step::GetAgreement));

    let state = env.db.get_or_create_conversation("D01").await.unwrap();
    assert_eq!(state.profile.name.as_deref(), Some("하늘"));
}

#[tokio::test]
async fn test_full_dialog_persists_each_step() {
    let env = setup_test_environment(Assessment::default()).await;
    let id = "D02";

    env.say(id, "안녕").await;

    env.say(id, "네").await;
    assert_eq!(env.step(id).await, Some(Step::AskFeeling));

    env.say(id, "그냥 그래요").await;
    assert_eq!(env.step(id).await, Some(Step::SuicidalThinking));

    env.say(id, "우울해요").await;
    assert_eq!((env.step(id).await, env.risk(id).await), (Some(Step::Relationship), 1));

    env.say(id, "네").await;
    assert_eq!((env.step(id).await, env.risk(id).await), (Some(Step::FrequencyOfFeeling), 4));

    env.say(id, "외로워요").await;
    assert_eq!((env.step(id).await, env.risk(id).await), (Some(Step::TrySuicide), 6));

    env.say(id, "가끔").await;
    assert_eq!((env.step(id).await, env.risk(id).await), (Some(Step::PlanSuicide), 7));

    env.say(id, "아니요").await;
    assert_eq!((env.step(id).await, env.risk(id).await), (Some(Step::BeforeResult), 7));

    let replies = env.say(id, "아니요").await;
    assert_eq!(env.step(id).await, None);
    assert_eq!(env.risk(id).await, 7);
    assert_eq!(replies.last().map(String::as_str), Some(prompts::HIGH_RISK_RESULT));

    let state = env.db.get_or_create_conversation(id).await.unwrap();
    assert_eq!(state.profile.frequency.as_deref(), Some("가끔"));
}

#[tokio::test]
async fn test_unrecognized_answer_to_open_question_moves_on() {
    let env = setup_test_environment(Assessment::default()).await;
    let id = "D12";

    env.say(id, "안녕").await;
    env.say(id, "네").await;

    // The classifier has no intent for a plain account of the day.
    let replies = env.say(id, "별일 없이 학교 다녀왔어요").await;

    assert_eq!(replies, vec![prompts::ASK_FEELING_ACK.to_string(), prompts::SUICIDAL_THINKING_QUESTION.to_string()]);
    assert_eq!((env.step(id).await, env.risk(id).await), (Some(Step::SuicidalThinking), 0));
}

#[tokio::test]
async fn test_unusable_input_keeps_step_and_score() {
    let env = setup_test_environment(Assessment::default()).await;
    let id = "D03";

    env.say(id, "안녕").await;
    env.say(id, "네").await;
    env.say(id, "그냥 그래요").await;

    for utterance in ["음...", "서버 오류", "무슨 말인지 모르겠어"] {
        let replies = env.say(id, utterance).await;

        assert_eq!(replies, vec![prompts::CLARIFY.to_string(), prompts::SUICIDAL_THINKING_QUESTION.to_string()]);
        assert_eq!(env.step(id).await, Some(Step::SuicidalThinking));
        assert_eq!(env.risk(id).await, 0);
    }
}

#[tokio::test]
async fn test_priority_danger_on_any_turn() {
    let env = setup_test_environment(Assessment::default()).await;
    let id = "D04";

    let replies = env.say(id, "지금 옥상이에요").await;
    assert_eq!(replies.first().map(String::as_str), Some(prompts::CRISIS_REFERRAL));

    env.say(id, "네").await;
    env.say(id, "그냥 그래요").await;
    env.say(id, "우울해요").await;

    let replies = env.say(id, "지금 옥상이에요").await;
    assert_eq!(replies.first().map(String::as_str), Some(prompts::CRISIS_REFERRAL));
    assert_eq!(env.step(id).await, Some(Step::Relationship));
    assert_eq!(env.risk(id).await, 1);
}

#[tokio::test]
async fn test_declined_consent_then_restart() {
    let env = setup_test_environment(Assessment::default()).await;
    let id = "D05";

    env.say(id, "안녕").await;
    let replies = env.say(id, "아니요").await;

    assert_eq!(replies, vec![prompts::CONSENT_DECLINED.to_string()]);
    assert_eq!(env.step(id).await, None);

    // The next message begins a new assessment.
    let replies = env.say(id, "안녕").await;
    assert_eq!(replies.last().map(String::as_str), Some(prompts::GET_AGREEMENT_QUESTION));
    assert_eq!(env.step(id).await, Some(Step::GetAgreement));
}

#[tokio::test]
async fn test_conversations_are_isolated() {
    let env = setup_test_environment(Assessment::default()).await;

    env.say("D06", "안녕").await;
    env.say("D06", "네").await;
    env.say("D07", "안녕").await;

    assert_eq!(env.step("D06").await, Some(Step::AskFeeling));
    assert_eq!(env.step("D07").await, Some(Step::GetAgreement));
}

#[tokio::test]
async fn test_retry_limit_from_configuration() {
    let env = setup_test_environment(Assessment::new(Thresholds::default(), Some(1), prompts::CRISIS_REFERRAL)).await;
    let id = "D08";

    env.say(id, "안녕").await;
    env.say(id, "네").await;
    env.say(id, "그냥 그래요").await;

    env.say(id, "음...").await;
    assert_eq!(env.step(id).await, Some(Step::SuicidalThinking));

    let replies = env.say(id, "음...").await;
    assert_eq!(replies, vec![prompts::RETRY_LIMIT.to_string()]);
    assert_eq!(env.step(id).await, None);
}

#[tokio::test]
async fn test_plan_ends_in_crisis() {
    let env = setup_test_environment(Assessment::default()).await;
    let id = "D09";

    for utterance in ["안녕", "네", "그냥 그래요", "괜찮아요", "네", "괜찮아요", "항상"] {
        env.say(id, utterance).await;
    }

    assert_eq!((env.step(id).await, env.risk(id).await), (Some(Step::PlanSuicide), 3));

    let replies = env.say(id, "네").await;
    assert_eq!(replies, vec![prompts::CRISIS_REFERRAL.to_string()]);
    assert_eq!(env.risk(id).await, 8);
    assert_eq!(env.step(id).await, None);
}

#[tokio::test]
async fn test_failed_send_does_not_persist() {
    let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));
    let db = DbClient::surreal_memory().await.expect("Failed to create DB client");

    let mut chat = MockChat::new();
    chat.expect_user_name().returning(|_| Err(anyhow::anyhow!("users.info failed")));
    chat.expect_send_message().returning(|_, _| Err(anyhow::anyhow!("chat.postMessage failed")));

    let env = TestEnvironment {
        db,
        nlu: IntentClassifier::new(Arc::new(get_mock_nlu())),
        chat: ChatClient::new(Arc::new(chat)),
        assessment: Assessment::default(),
        gate: TurnGate::new(),
        outbox,
    };

    let turn = IncomingTurn {
        conversation_id: "D10".to_string(),
        user_id: "U0USER".to_string(),
        text: "안녕".to_string(),
    };

    let result = process_turn(&turn, &env.db, &env.nlu, &env.chat, &env.assessment, &env.gate).await;

    assert!(result.is_err());
    assert_eq!(env.step("D10").await, None);
}

#[tokio::test]
async fn test_outcome_is_reported() {
    let env = setup_test_environment(Assessment::default()).await;

    env.say("D11", "안녕").await;

    let turn = IncomingTurn {
        conversation_id: "D11".to_string(),
        user_id: "U0USER".to_string(),
        text: "아니요".to_string(),
    };

    let outcome = process_turn(&turn, &env.db, &env.nlu, &env.chat, &env.assessment, &env.gate).await.unwrap();

    assert_eq!(outcome.outcome, Some(Outcome::ConsentDeclined));
    assert_eq!(outcome.dialog, None);
}
