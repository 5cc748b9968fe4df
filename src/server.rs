use std::{sync::Arc, time::Duration};

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use crate::{
    Res, ShuffleError,
    api::{self, CallbackSlot},
    types::CallbackOutcome,
    utils::RedirectTarget,
};

/// How long shutdown waits for open connections before the task is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Local listener capturing the single OAuth redirect.
///
/// It lives exactly as long as one authorization attempt: [`wait_for_code`]
/// shuts it down on every path, and dropping it early (e.g. on an error in
/// between) signals shutdown as well.
///
/// [`wait_for_code`]: CallbackServer::wait_for_code
pub struct CallbackServer {
    outcome: oneshot::Receiver<CallbackOutcome>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Binds the redirect host/port and starts serving the redirect path and
    /// `/health` in a background task.
    pub async fn start(target: &RedirectTarget, expected_state: String) -> Res<Self> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let slot = Arc::new(Mutex::new(CallbackSlot::new(expected_state, outcome_tx)));

        let mut app = Router::new().route(&target.path, get(api::callback).layer(Extension(slot)));
        if target.path != "/health" {
            app = app.route("/health", get(api::health));
        }

        let listener = TcpListener::bind(target.bind_addr()).await.map_err(|e| {
            ShuffleError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot bind {}:{}: {}", target.host, target.port, e),
            ))
        })?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok(Self {
            outcome: outcome_rx,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Waits up to `timeout` for the redirect, stops the listener and turns
    /// the outcome into the authorization code.
    ///
    /// # Errors
    ///
    /// [`ShuffleError::Auth`] when the user denied access, the state did not
    /// match, the code was missing or nothing arrived in time.
    pub async fn wait_for_code(mut self, timeout: Duration) -> Res<String> {
        let received = tokio::time::timeout(timeout, &mut self.outcome).await;
        self.shutdown().await;

        match received {
            Err(_) => Err(ShuffleError::Auth(format!(
                "no redirect received within {} seconds",
                timeout.as_secs()
            ))),
            Ok(Err(_)) => Err(ShuffleError::Auth(
                "redirect listener stopped unexpectedly".to_string(),
            )),
            Ok(Ok(CallbackOutcome::Code(code))) => Ok(code),
            Ok(Ok(CallbackOutcome::Denied(reason))) => Err(ShuffleError::Auth(format!(
                "access was not granted: {}",
                reason
            ))),
            Ok(Ok(CallbackOutcome::StateMismatch)) => Err(ShuffleError::Auth(
                "state parameter did not match, redirect rejected".to_string(),
            )),
            Ok(Ok(CallbackOutcome::MissingCode)) => Err(ShuffleError::Auth(
                "redirect carried no authorization code".to_string(),
            )),
        }
    }

    async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
                handle.abort();
            }
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
