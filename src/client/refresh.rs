use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Tasks,
    Products,
    Images,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(Resource) + Send + Sync>;

/// Explicit observer registry: panels subscribe to the resources they show
/// and are told when a mutation went through.
#[derive(Clone, Default)]
pub struct RefreshHub {
    next_id: Arc<AtomicU64>,
    listeners: Arc<Mutex<Vec<(SubscriptionId, Resource, Listener)>>>,
}

impl RefreshHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        resource: Resource,
        listener: impl Fn(Resource) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, resource, Arc::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(sid, _, _)| *sid != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn notify(&self, resource: Resource) {
        // snapshot first so listeners may (un)subscribe while being called
        let targets: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners
                .iter()
                .filter(|(_, r, _)| *r == resource)
                .map(|(_, _, l)| l.clone())
                .collect(),
            Err(_) => return,
        };
        for listener in targets {
            listener(resource);
        }
    }
}
