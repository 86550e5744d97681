use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A message delivered to an inbox after a delay.
///
/// At most one delivery is outstanding per task: scheduling again replaces
/// the previous one. Dropping the task cancels it.
pub struct DeferredTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl DeferredTask {
    pub fn new(name: &'static str) -> Self {
        Self { name, handle: None }
    }

    /// Deliver `message` to `inbox` once `delay` has elapsed.
    pub fn schedule<T>(&mut self, delay: Duration, inbox: &mpsc::UnboundedSender<T>, message: T)
    where
        T: Send + 'static,
    {
        if self.cancel() {
            debug!("{} timer re-armed", self.name);
        }

        let inbox = inbox.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inbox.send(message);
        }));
    }

    /// Cancel the outstanding delivery. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
