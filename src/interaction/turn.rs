//! One dialog turn: load, classify, decide, reply, persist.

use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    assessment::{Assessment, TurnOutcome},
    base::types::{Res, Void},
    service::{chat::ChatClient, db::DbClient, nlu::IntentClassifier},
};

use super::gate::TurnGate;

/// A user message that should advance the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingTurn {
    pub conversation_id: String,
    pub user_id: String,
    pub text: String,
}

/// Handles a turn on a background task.
///
/// Failures are logged; the conversation state is left as it was before the turn.
#[instrument(skip_all, fields(conversation_id = %turn.conversation_id))]
pub fn handle_turn(turn: IncomingTurn, db: DbClient, nlu: IntentClassifier, chat: ChatClient, assessment: Assessment, gate: TurnGate) {
    tokio::spawn(async move {
        // Process the turn.
        let result = process_turn(&turn, &db, &nlu, &chat, &assessment, &gate).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling turn: {}", err);
        }
    });
}

/// Runs one turn to completion.
///
/// State is persisted only after every reply has been sent, so an error (or a
/// dropped future) part way through leaves the stored state untouched.
#[instrument(skip_all, fields(conversation_id = %turn.conversation_id))]
pub async fn process_turn(turn: &IncomingTurn, db: &DbClient, nlu: &IntentClassifier, chat: &ChatClient, assessment: &Assessment, gate: &TurnGate) -> Res<TurnOutcome> {
    let _guard = gate.acquire(&turn.conversation_id).await;

    let mut state = db.get_or_create_conversation(&turn.conversation_id).await?;

    if state.profile.name.is_none() {
        state.profile.name = lookup_name(chat, &turn.user_id).await;
    }

    let intent = nlu.classify_or_none(&turn.text).await;

    info!("Classified as `{}` ({:.2}).", intent.label, intent.confidence);

    let outcome = assessment.run_turn(state.dialog.take(), &mut state.profile, &intent);

    send_replies(chat, &turn.conversation_id, &outcome.replies).await?;

    state.dialog = outcome.dialog.clone();
    db.save_conversation(&turn.conversation_id, &state).await?;

    Ok(outcome)
}

/// Sends replies one at a time so they arrive in order.
async fn send_replies(chat: &ChatClient, conversation_id: &str, replies: &[String]) -> Void {
    for reply in replies {
        chat.send_message(conversation_id, reply).await?;
    }

    Ok(())
}

/// A missing name is never fatal.
async fn lookup_name(chat: &ChatClient, user_id: &str) -> Option<String> {
    match chat.user_name(user_id).await {
        Ok(name) => name,
        Err(err) => {
            warn!("Failed to look up name for `{}`: {}", user_id, err);
            None
        }
    }
}
