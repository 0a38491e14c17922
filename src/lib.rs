//! # Reboot Mode Registry
//!
//! Platform glue that arranges for a magic value to be written to a
//! platform-specific store whenever a reboot is requested with a named
//! mode. A later boot stage reads the value back to decide how to come
//! up (normal boot, recovery, bootloader, ...).
//!
//! The mode table is built once from decoded configuration properties
//! (`mode-<name> = <low> [<high>]`); at reboot time the requested mode is
//! resolved with an exact pass and a best-effort separator-normalized
//! pass, and a hit is persisted through a caller-supplied write callback.
//! A miss is silent: the reboot proceeds untouched.
//!
//! ## Submodules
//!
//! - `table`: the name → magic table and the two-pass resolver.
//! - `notify`: the reboot notification bus abstraction and a bundled chain.
//! - `registry`: registration handles wiring table, bus and write callback.
//! - `dtb` (feature `dtb`): property decode for hosts configured from an FDT.

#![cfg_attr(not(test), no_std)]
#![deny(clippy::not_unsafe_ptr_arg_deref)]
#![deny(clippy::unwrap_used)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

extern crate alloc;

pub use ::syscall::error;

pub mod notify;
pub mod registry;
pub mod table;

#[cfg(feature = "dtb")]
pub mod dtb;

pub use notify::{NotifierChain, NotifyResult, RebootHandler, RebootNotifier, Subscription};
pub use registry::{register, MagicWriter, Registration};
pub use table::{ModeProperty, ModeTable, CMD_CAPACITY, DEFAULT_MODE, MODE_PREFIX};
