//! # Reboot Notification Bus
//!
//! Decouples the mode registry from any one host's shutdown sequencing:
//! the registry only needs a subscribe/unsubscribe pair and a callback
//! contract. Hosts with their own notification machinery implement
//! [`RebootNotifier`]; everyone else can use the bundled
//! [`NotifierChain`].

use alloc::{sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicU64, Ordering};
use spin::RwLock;

/// Verdict a handler returns to the chain that invoked it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotifyResult {
    /// Carry on with the remaining handlers.
    Done,
    /// Stop dispatching this notification.
    Stop,
}

/// A subscriber on the reboot notification path.
pub trait RebootHandler: Send + Sync {
    /// Called once per reboot request. `cmd` is the free-form reboot
    /// argument; the borrow must not be retained past this call.
    fn on_reboot(&self, cmd: Option<&str>) -> NotifyResult;
}

/// Token identifying one active subscription.
#[derive(Debug, Eq, PartialEq)]
#[must_use = "an unsaved token cannot be unsubscribed"]
pub struct Subscription(u64);

/// Host-side reboot notification bus.
pub trait RebootNotifier: Send + Sync {
    fn subscribe(&self, handler: Arc<dyn RebootHandler>) -> Subscription;
    fn unsubscribe(&self, token: Subscription);
}

/// A minimal notification chain.
///
/// Dispatch runs under the read lock, subscription changes under the
/// write lock, so `unsubscribe` cannot return while a dispatch is in
/// flight. Handlers must not call back into the chain dispatching them.
pub struct NotifierChain {
    handlers: RwLock<Vec<(u64, Arc<dyn RebootHandler>)>>,
    next_token: AtomicU64,
}

impl NotifierChain {
    pub const fn new() -> NotifierChain {
        NotifierChain {
            handlers: RwLock::new(Vec::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Dispatches a reboot notification to every subscriber in
    /// subscription order, stopping early on [`NotifyResult::Stop`].
    pub fn notify(&self, cmd: Option<&str>) {
        for (_, handler) in self.handlers.read().iter() {
            if handler.on_reboot(cmd) == NotifyResult::Stop {
                break;
            }
        }
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl Default for NotifierChain {
    fn default() -> NotifierChain {
        NotifierChain::new()
    }
}

impl RebootNotifier for NotifierChain {
    fn subscribe(&self, handler: Arc<dyn RebootHandler>) -> Subscription {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().push((token, handler));
        Subscription(token)
    }

    fn unsubscribe(&self, token: Subscription) {
        self.handlers.write().retain(|(id, _)| *id != token.0);
    }
}
