//! # TICTAC Shared
//!
//! Message types exchanged between the broker and its transport.
//!
//! ## Flow
//!
//! - A client sends a [`ClientRequest`] through `notify`
//! - Everything the broker has to say comes back as [`ServerUpdate`]s over the
//!   client's subscription stream, including the [`Outcome`] of the request
//!
//! Ids and marks are the `tictac_core` types, so a value seen on the wire can
//! be used directly as a store key.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod outcome;
pub mod request;
pub mod update;

pub use outcome::{Code, Outcome};
pub use request::{ClientRequest, RequestKind};
pub use update::{
    LobbyDetails, LobbySummary, MemberView, NavigationPath, RematchState, ServerUpdate,
    Technicality,
};
