use crate::crop::CropState;

/// Published on every observable transition of an editor session.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    HistoryChanged { position: Option<usize>, len: usize },
    CropChanged { state: CropState },
    BusyChanged { busy: bool },
    ErrorRaised { message: String },
    ErrorDismissed,
    PromptChanged,
    ComparingChanged { comparing: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&EditorEvent)>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber_id, _)| *subscriber_id != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, event: EditorEvent) {
        tracing::trace!(?event, subscribers = self.subscribers.len(), "publish editor event");
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
