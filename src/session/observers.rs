use std::sync::{Arc, Mutex};

use tracing::debug;

use super::state::SessionState;

type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Registry of state-snapshot subscribers.
///
/// Subscribers are notified synchronously, in subscription order, with the
/// full current snapshot on every change. Callbacks must not block; they are
/// fan-out points, not workers.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    next_token: u64,
    observers: Vec<(u64, Observer)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&SessionState) + Send + Sync + 'static) -> Subscription {
        let mut inner = self.inner.lock().expect("observer registry poisoned");
        let token = inner.next_token;
        inner.next_token += 1;
        inner.observers.push((token, Arc::new(callback)));
        Subscription {
            token,
            registry: Arc::clone(&self.inner),
        }
    }

    pub fn notify(&self, state: &SessionState) {
        // Clone the callbacks out so a subscriber may (un)subscribe from
        // within its own callback without deadlocking.
        let observers: Vec<Observer> = {
            let inner = self.inner.lock().expect("observer registry poisoned");
            inner.observers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for observer in observers {
            observer(state);
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("observer registry poisoned");
        let dropped = inner.observers.len();
        inner.observers.clear();
        if dropped > 0 {
            debug!("Dropped {} observer subscriptions", dropped);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("observer registry poisoned").observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable unsubscribe token returned by `subscribe`.
///
/// Unsubscription is explicit; dropping the handle leaves the subscription
/// in place.
pub struct Subscription {
    token: u64,
    registry: Arc<Mutex<RegistryInner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        let mut inner = self.registry.lock().expect("observer registry poisoned");
        inner.observers.retain(|(token, _)| *token != self.token);
    }
}
