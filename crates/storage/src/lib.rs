// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! omc-storage: the filesystem message fabric.
//!
//! Workers and their team lead share nothing but a directory tree. Every
//! write in this crate is rename-based, every read tolerates a concurrent
//! rename, and every path derived from an untrusted name is validated
//! against its base directory before any I/O.

pub mod fsutil;
pub mod mailbox;
pub mod paths;
pub mod signals;
pub mod tasks;

pub use fsutil::FsError;
pub use mailbox::{Inbox, MailboxError, Outbox};
pub use paths::{ensure_within, FabricLayout, PathError};
pub use signals::SignalPlane;
pub use tasks::{Selection, TaskStore, TaskStoreError};
