//! Cancellation signal: a single token cancelled by the first interrupt or
//! by normal shutdown, whichever comes first.

use std::future::Future;
use std::io;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Listener task tied to a token. [`shutdown`](Self::shutdown) cancels the
/// token (normal program end) and stops the listener.
#[derive(Debug)]
pub struct InterruptListener {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl InterruptListener {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

/// Cancel `token` on the first Ctrl+C. Later interrupts do nothing further.
pub fn cancel_on_interrupt(token: CancellationToken) -> InterruptListener {
    cancel_on(token, tokio::signal::ctrl_c())
}

/// Cancel `token` when `signal` resolves successfully. Used directly by tests
/// to simulate an interrupt without an OS signal.
pub fn cancel_on<S>(token: CancellationToken, signal: S) -> InterruptListener
where
    S: Future<Output = io::Result<()>> + Send + 'static,
{
    let listener_token = token.clone();
    let handle = tokio::spawn(async move {
        tokio::select! {
            res = signal => match res {
                Ok(()) => {
                    tracing::warn!("interrupt received; cancelling in-flight uploads");
                    listener_token.cancel();
                }
                Err(e) => tracing::warn!("cannot listen for interrupt: {}", e),
            },
            _ = listener_token.cancelled() => {}
        }
    });
    InterruptListener { token, handle }
}
