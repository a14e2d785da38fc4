use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Handle returned by [`Signal::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Observer registry for one kind of endpoint notification.
///
/// Handlers run synchronously on the emitting thread, in registration order.
/// For capture signals that is the device thread.
pub struct Signal<T> {
    handlers: RwLock<Vec<(SubscriptionId, Handler<T>)>>,
    next_id: AtomicU64,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    pub fn has_subscribers(&self) -> bool {
        !self.handlers.read().is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Invoke every handler with `value`.
    ///
    /// The handler list is snapshotted first, so a handler may subscribe or
    /// unsubscribe without deadlocking.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Handler<T>> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in snapshot {
            handler(value);
        }
    }

    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn handlers_run_in_registration_order() {
        let signal = Signal::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            signal.subscribe(move |v: &u32| seen.lock().push((tag, *v)));
        }
        signal.emit(&7);

        assert_eq!(
            *seen.lock(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let signal = Signal::<()>::new();
        let count = Arc::new(AtomicU64::new(0));

        let c1 = Arc::clone(&count);
        let a = signal.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&count);
        signal.subscribe(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        assert!(signal.unsubscribe(a));
        assert!(!signal.unsubscribe(a));
        signal.emit(&());

        assert_eq!(count.load(Ordering::SeqCst), 10);
        assert_eq!(signal.subscriber_count(), 1);
    }

    #[test]
    fn emit_without_subscribers_is_noop() {
        let signal = Signal::<String>::new();
        assert!(!signal.has_subscribers());
        signal.emit(&"nobody listens".to_string());
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let signal = Arc::new(Signal::<()>::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let inner_signal = Arc::clone(&signal);
        let inner_slot = Arc::clone(&slot);
        let id = signal.subscribe(move |_| {
            if let Some(id) = *inner_slot.lock() {
                inner_signal.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        signal.emit(&());
        assert!(!signal.has_subscribers());
    }
}
