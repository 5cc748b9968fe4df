use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::types::CallbackOutcome;

/// Shared between the redirect handler and the flow waiting on it.
///
/// The sender is taken by the first request, so only one redirect is ever
/// acted upon.
pub struct CallbackSlot {
    pub expected_state: String,
    pub sender: Option<oneshot::Sender<CallbackOutcome>>,
}

impl CallbackSlot {
    pub fn new(expected_state: String, sender: oneshot::Sender<CallbackOutcome>) -> Self {
        Self {
            expected_state,
            sender: Some(sender),
        }
    }
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(slot): Extension<Arc<Mutex<CallbackSlot>>>,
) -> Html<&'static str> {
    let mut slot = slot.lock().await;
    let Some(sender) = slot.sender.take() else {
        return Html("<h4>This authorization request has already been handled.</h4>");
    };

    let outcome = classify(&params, &slot.expected_state);
    let page = match outcome {
        CallbackOutcome::Code(_) => {
            "<h2>Authorization complete.</h2><p>You may close this window.</p>"
        }
        CallbackOutcome::Denied(_) => {
            "<h2>Authorization failed or was cancelled.</h2><p>You may close this window.</p>"
        }
        CallbackOutcome::StateMismatch => "<h4>State mismatch, authorization rejected.</h4>",
        CallbackOutcome::MissingCode => "<h4>Missing authorization code.</h4>",
    };

    // the flow may have given up already; nothing left to tell it then
    let _ = sender.send(outcome);
    Html(page)
}

fn classify(params: &HashMap<String, String>, expected_state: &str) -> CallbackOutcome {
    if let Some(error) = params.get("error") {
        let reason = match params.get("error_description") {
            Some(description) => format!("{} ({})", error, description),
            None => error.clone(),
        };
        return CallbackOutcome::Denied(reason);
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return CallbackOutcome::StateMismatch;
    }

    match params.get("code") {
        Some(code) if !code.is_empty() => CallbackOutcome::Code(code.clone()),
        _ => CallbackOutcome::MissingCode,
    }
}
