//! jotpad-core - Core library for Jotpad
//!
//! This crate contains the note models, the offline demo store, the remote
//! store adapter, and the session logic shared by Jotpad interfaces.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod offline;
pub mod remote;
pub mod retry;
pub mod search;
pub mod services;
pub mod state;
pub mod storage;
pub mod subscription;
pub mod util;

pub use error::{Error, Result};
pub use models::{Identity, NewNote, Note, NoteId, NotePatch};
