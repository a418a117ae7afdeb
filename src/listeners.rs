//! Change-notification registry shared by the library store and sync settings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ListenerRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Removes exactly the registration behind `id`. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let Ok(mut listeners) = self.listeners.lock() else {
            return false;
        };
        match listeners.iter().position(|(lid, _)| *lid == id) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every listener in registration order. Listeners run outside the lock,
    /// so one may subscribe or unsubscribe from inside its callback.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener();
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_calls_every_listener() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            registry.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        registry.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe_removes_one_registration() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = Arc::clone(&hits);
        let h2 = Arc::clone(&hits);
        let first = registry.subscribe(move || {
            h1.fetch_add(1, Ordering::SeqCst);
        });
        registry.subscribe(move || {
            h2.fetch_add(10, Ordering::SeqCst);
        });

        assert!(registry.unsubscribe(first));
        assert!(!registry.unsubscribe(first));
        registry.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let registry = Arc::new(ListenerRegistry::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let reg = Arc::clone(&registry);
        let inner = Arc::clone(&slot);
        let id = registry.subscribe(move || {
            if let Some(id) = *inner.lock().unwrap() {
                reg.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        registry.notify();
        assert!(registry.is_empty());
    }
}
