//! Core types for the Grocer shopping list.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the [`AppState`](state::AppState) aggregate, every mutation that can be
//! applied to it, and the pure view functions the screens render from.

pub mod defaults;
pub mod error;
pub mod model;
pub mod state;
pub mod store;
pub mod suggest;
pub mod undo;
pub mod views;

pub use error::{Error, Result};
