//! Per-page UI state machines.
//!
//! Each browser page owns one [`UploadController`] and one
//! [`ListingController`], wired together by a [`PageCoordinator`].
//! Controllers are cheap to clone handles; their state sits behind a
//! `tokio::sync::Mutex` that is never held across a network call.

pub mod coordinator;
pub mod listing;
pub mod notifications;
pub mod upload;

#[cfg(test)]
pub(crate) mod fake;

pub use coordinator::{PageCoordinator, ReloadListener, ReloadTrigger};
pub use listing::{DeleteState, FileRow, ListingController, ListingView, SizeOption};
pub use notifications::{notification_channel, NotificationInbox, Notifier};
pub use upload::{UploadController, UploadView};
