use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Cancellation and deadline carried from the caller down to the session.
///
/// Nothing in the pipeline acts on it, sessions decide how to honour it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    signal: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Triggers the tokens created together with it.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelToken {
    /// A token that is never cancelled.
    pub fn none() -> Self {
        Self::default()
    }
    pub fn channel() -> (CancelHandle, CancelToken) {
        let (sender, receiver) = watch::channel(false);
        (
            CancelHandle(sender),
            CancelToken {
                signal: Some(receiver),
                deadline: None,
            },
        )
    }
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
    pub fn is_cancelled(&self) -> bool {
        self.signal.as_ref().is_some_and(|v| *v.borrow())
            || self.deadline.is_some_and(|v| Instant::now() >= v)
    }
    /// Completes once cancelled. Pending forever on tokens without a signal, deadlines are not
    /// awaited here.
    pub async fn cancelled(&self) {
        match &self.signal {
            Some(signal) => {
                let mut signal = signal.clone();
                if signal.wait_for(|v| *v).await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn signal_reaches_clones() {
        let (handle, token) = CancelToken::channel();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
        token.cancelled().await;
    }

    #[test]
    fn deadline() {
        assert!(!CancelToken::none().is_cancelled());
        let expired = CancelToken::none().with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(expired.is_cancelled());
        let later = CancelToken::none().with_timeout(Duration::from_secs(60));
        assert!(!later.is_cancelled());
        assert!(later.deadline().is_some());
    }
}
