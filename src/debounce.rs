use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;

pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Delivers the last pushed value once no new value has arrived for `delay`.
/// Each push cancels the delivery scheduled by the previous one.
pub struct Debouncer<T> {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    sender: Arc<watch::Sender<T>>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            delay,
            pending: Mutex::new(None),
            sender: Arc::new(sender),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn push(&self, value: T) {
        let sender = self.sender.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sender.send_replace(value);
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Drops any scheduled delivery without applying it.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Last applied value.
    pub fn current(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}

pub type SearchDebouncer = Debouncer<String>;

pub fn search_debouncer(delay_ms: u64) -> SearchDebouncer {
    Debouncer::new(String::new(), Duration::from_millis(delay_ms))
}

#[cfg(test)]
mod tests {
    use super::{search_debouncer, DEFAULT_SEARCH_DEBOUNCE_MS};
    use tokio::time::{sleep, Duration};

    #[tokio::test(start_paused = true)]
    async fn only_the_last_value_of_a_burst_is_applied() {
        let debouncer = search_debouncer(DEFAULT_SEARCH_DEBOUNCE_MS);
        let mut receiver = debouncer.subscribe();

        debouncer.push("j".to_string());
        sleep(Duration::from_millis(100)).await;
        debouncer.push("jo".to_string());
        sleep(Duration::from_millis(100)).await;
        debouncer.push("johnson".to_string());

        sleep(Duration::from_millis(299)).await;
        assert_eq!(debouncer.current(), "");
        assert!(!receiver.has_changed().expect("sender alive"));

        sleep(Duration::from_millis(2)).await;
        assert_eq!(debouncer.current(), "johnson");
        assert!(receiver.has_changed().expect("sender alive"));
        assert_eq!(*receiver.borrow_and_update(), "johnson");
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_inputs_are_each_applied() {
        let debouncer = search_debouncer(300);
        debouncer.push("smith".to_string());
        sleep(Duration::from_millis(301)).await;
        assert_eq!(debouncer.current(), "smith");

        debouncer.push("global".to_string());
        sleep(Duration::from_millis(301)).await;
        assert_eq!(debouncer.current(), "global");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_value() {
        let debouncer = search_debouncer(300);
        debouncer.push("pending".to_string());
        debouncer.cancel();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(debouncer.current(), "");
        assert_eq!(debouncer.delay(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn poisoned_pending_slot_still_debounces() {
        let debouncer = search_debouncer(300);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = debouncer.pending.lock().expect("lock");
            panic!("poison the pending slot");
        }));
        assert!(debouncer.pending.is_poisoned());

        debouncer.push("first".to_string());
        debouncer.push("second".to_string());
        sleep(Duration::from_millis(301)).await;
        assert_eq!(debouncer.current(), "second");

        debouncer.push("dropped".to_string());
        debouncer.cancel();
        sleep(Duration::from_millis(301)).await;
        assert_eq!(debouncer.current(), "second");
    }
}
