//! # Reboot Mode Registration
//!
//! Ties a mode table, a platform write callback and a bus subscription
//! together into one handle. While the handle is alive, every reboot
//! notification resolves the requested mode against the table and, on a
//! hit, persists the magic value through the callback.

use alloc::{boxed::Box, sync::Arc};
use spin::Mutex;
use syscall::error::Result;

use crate::notify::{NotifyResult, RebootHandler, RebootNotifier, Subscription};
use crate::table::{ModeProperty, ModeTable};

/// Platform write callback.
///
/// Persists a resolved magic value to whatever store survives the reboot
/// (scratch register, NVRAM cell, ...). Fire-and-forget: the registry
/// neither checks nor retries the write; a backend that needs failure
/// visibility has to log through its own channel.
pub trait MagicWriter: Send + Sync {
    fn write_magic(&self, magic: u64);
}

/// State reachable from the notification path. The mutex serializes
/// lookups against teardown; `None` means the owning registration has
/// been released and nothing more may be written.
struct ModeDispatch {
    table: Mutex<Option<ModeTable>>,
    writer: Box<dyn MagicWriter>,
}

impl RebootHandler for ModeDispatch {
    fn on_reboot(&self, cmd: Option<&str>) -> NotifyResult {
        let magic = {
            let table = self.table.lock();
            table.as_ref().and_then(|table| table.resolve(cmd))
        };

        // The write happens outside the guard; the backend may take its
        // time without holding up a racing teardown.
        if let Some(magic) = magic {
            self.writer.write_magic(magic);
        }

        NotifyResult::Done
    }
}

/// Handle for one registered reboot mode driver.
///
/// Obtained from [`register`]; released by [`Registration::unregister`]
/// or automatically when dropped, whichever comes first.
pub struct Registration {
    dispatch: Arc<ModeDispatch>,
    bus: Arc<dyn RebootNotifier>,
    token: Option<Subscription>,
}

/// Builds a mode table from `properties` and subscribes a dispatch
/// handler to `bus`.
///
/// A table construction error aborts the registration: nothing is
/// subscribed and no entry is retained. An empty table is not an error;
/// the handler simply never finds a magic to write.
///
/// # Errors
///
/// * `EINVAL` - a qualifying property key has an empty mode name.
/// * `ENOMEM` - table storage could not be allocated.
pub fn register<'a, I>(
    bus: Arc<dyn RebootNotifier>,
    properties: I,
    writer: Box<dyn MagicWriter>,
) -> Result<Registration>
where
    I: IntoIterator<Item = ModeProperty<'a>>,
{
    let table = ModeTable::from_properties(properties)?;
    let dispatch = Arc::new(ModeDispatch {
        table: Mutex::new(Some(table)),
        writer,
    });
    let token = bus.subscribe(dispatch.clone());

    Ok(Registration {
        dispatch,
        bus,
        token: Some(token),
    })
}

impl Registration {
    /// Unsubscribes from the bus and releases the mode table.
    ///
    /// Unsubscription completes before the table is torn down, so no new
    /// dispatch can reach the table once this returns; a dispatch already
    /// holding the table lock finishes first.
    pub fn unregister(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        self.bus.unsubscribe(token);

        // Detach under the lock, free after. A racing on_reboot either
        // resolved against the intact table or now sees None.
        let table = self.dispatch.table.lock().take();
        drop(table);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release();
    }
}
