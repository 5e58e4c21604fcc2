//! Scripted dialogs.
//!
//! A [`Dialog`] plays a fixed list of messages with simulated typing, then
//! optionally waits for the user's reply. Dialogs are usually registered on
//! a [`DialogManager`](crate::manager::DialogManager), which starts them
//! from their trigger and routes replies back to them.

pub mod common;
pub mod definition;
mod playback;

pub use common::*;
pub use definition::{Dialog, DialogOptions, FallibleHookFn, Hook, SyncHookFn};
