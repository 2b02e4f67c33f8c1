use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::timers;

/// Notifications dismiss themselves after this long.
pub(crate) const NOTIFICATION_TTL_MS: u32 = 8_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Notification {
    pub(crate) id: u64,
    pub(crate) kind: NoticeKind,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) timestamp_ms: f64,
    pub(crate) tx_hash: Option<String>,
}

pub(crate) type NoticeSubscriber = Rc<dyn Fn()>;

/// Ephemeral user-facing messages. Every user-meaningful event lands here;
/// entries expire on a timer or by manual dismissal.
pub(crate) struct NotificationStore {
    entries: RefCell<Vec<Notification>>,
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<NoticeSubscriber>>,
}

impl NotificationStore {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            subscribers: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn subscribe(&self, subscriber: NoticeSubscriber) {
        self.subscribers.borrow_mut().push(subscriber);
    }

    pub(crate) fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub(crate) fn push(
        self: &Rc<Self>,
        kind: NoticeKind,
        title: impl Into<String>,
        message: impl Into<String>,
        tx_hash: Option<String>,
    ) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.entries.borrow_mut().push(Notification {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            timestamp_ms: timers::now_ms(),
            tx_hash,
        });
        self.notify();

        let store: Weak<Self> = Rc::downgrade(self);
        timers::schedule(NOTIFICATION_TTL_MS, move || {
            if let Some(store) = store.upgrade() {
                store.dismiss(id);
            }
        })
        .forget();
        id
    }

    pub(crate) fn success(
        self: &Rc<Self>,
        title: impl Into<String>,
        message: impl Into<String>,
        tx_hash: Option<String>,
    ) -> u64 {
        self.push(NoticeKind::Success, title, message, tx_hash)
    }

    pub(crate) fn error(self: &Rc<Self>, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(NoticeKind::Error, title, message, None)
    }

    pub(crate) fn info(
        self: &Rc<Self>,
        title: impl Into<String>,
        message: impl Into<String>,
        tx_hash: Option<String>,
    ) -> u64 {
        self.push(NoticeKind::Info, title, message, tx_hash)
    }

    pub(crate) fn dismiss(&self, id: u64) {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            entries.len() != before
        };
        if removed {
            self.notify();
        }
    }

    fn notify(&self) {
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            (subscriber)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_ids_and_notifies() {
        let store = NotificationStore::new();
        let fired = Rc::new(Cell::new(0));
        let observed = fired.clone();
        store.subscribe(Rc::new(move || observed.set(observed.get() + 1)));

        let first = store.info("Mint Started", "Minting pixel at (1, 2)...", None);
        let second = store.error("Mint Failed", "Failed to mint pixel at (1, 2)");
        assert_ne!(first, second);
        assert_eq!(store.entries().len(), 2);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn dismiss_removes_one_entry() {
        let store = NotificationStore::new();
        let id = store.success("Pixel Minted!", "Successfully minted pixel at (1, 2)", None);
        let keep = store.info("note", "still here", None);
        store.dismiss(id);
        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, keep);
        // Dismissing twice is a no-op.
        store.dismiss(id);
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn carries_explorer_link() {
        let store = NotificationStore::new();
        store.success("Batch Mint Complete!", "Successfully minted 3 pixels!", Some("0xabc".into()));
        assert_eq!(store.entries()[0].tx_hash.as_deref(), Some("0xabc"));
    }
}
