//! Single-slot, latest-value-wins hand-off.
//!
//! A mailbox holds at most one value. Publishing always succeeds and
//! replaces anything unread; taking never blocks and yields `None` when
//! nothing new arrived since the last take. The consumer keeps its last
//! known value in that case.
//!
//! [`LocalSlot`] is the single-threaded form for bare-metal loops and
//! tests. [`mailbox()`] (with `std`) splits one shared slot into a writer
//! and a reader that can live on different threads.
//!
//! ```rust
//! use disyn_platform::{Inbox, LocalSlot, Outbox};
//!
//! let mut slot = LocalSlot::new();
//! slot.publish(1);
//! slot.publish(2);
//! assert_eq!(slot.try_take(), Some(2));
//! assert_eq!(slot.try_take(), None);
//! ```

/// Receiving half of a hand-off channel.
pub trait Inbox<T> {
    /// Newest unread value, if any. Never blocks.
    fn try_take(&mut self) -> Option<T>;
}

/// Sending half of a hand-off channel.
pub trait Outbox<T> {
    /// Store `value`, replacing any unread one.
    fn publish(&mut self, value: T);
}

/// Single-threaded one-value slot.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSlot<T> {
    value: Option<T>,
}

impl<T> LocalSlot<T> {
    /// Empty slot.
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// True when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Unread value without taking it.
    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl<T> Default for LocalSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Inbox<T> for LocalSlot<T> {
    #[inline]
    fn try_take(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T> Outbox<T> for LocalSlot<T> {
    #[inline]
    fn publish(&mut self, value: T) {
        self.value = Some(value);
    }
}

#[cfg(feature = "std")]
pub use shared::{MailboxReader, MailboxWriter, mailbox};

#[cfg(feature = "std")]
mod shared {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::{Inbox, Outbox};

    /// Create a shared slot and split it into its two halves.
    pub fn mailbox<T>() -> (MailboxWriter<T>, MailboxReader<T>) {
        let slot = Arc::new(Mutex::new(None));
        (
            MailboxWriter {
                slot: Arc::clone(&slot),
            },
            MailboxReader { slot },
        )
    }

    /// Producer side of a shared slot.
    #[derive(Debug)]
    pub struct MailboxWriter<T> {
        slot: Arc<Mutex<Option<T>>>,
    }

    /// Consumer side of a shared slot.
    ///
    /// Takes with `try_lock`: if the writer happens to hold the lock, the
    /// take reports nothing new and the value stays for the next one.
    #[derive(Debug)]
    pub struct MailboxReader<T> {
        slot: Arc<Mutex<Option<T>>>,
    }

    impl<T> Outbox<T> for MailboxWriter<T> {
        fn publish(&mut self, value: T) {
            *self.slot.lock() = Some(value);
        }
    }

    impl<T> Inbox<T> for MailboxReader<T> {
        fn try_take(&mut self) -> Option<T> {
            self.slot.try_lock().and_then(|mut slot| slot.take())
        }
    }

    impl<T> MailboxReader<T> {
        /// True once the writer has been dropped.
        pub fn is_orphaned(&self) -> bool {
            Arc::strong_count(&self.slot) == 1
        }
    }
}
