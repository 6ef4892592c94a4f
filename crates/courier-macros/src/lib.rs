//! Procedural macros for the Courier mediator.
//!
//! This crate provides:
//!
//! - `#[derive(Message)]` - Implements `courier_core::Message` for a type
//!
//! # Message Derive Macro
//!
//! ```rust,ignore
//! use courier::Message;
//!
//! // Reply-producing message
//! #[derive(Message)]
//! #[message(reply = "String")]
//! pub struct Rename {
//!     pub name: String,
//! }
//!
//! // Void message with a custom display name
//! #[derive(Message)]
//! #[message(name = "accounts.process")]
//! pub struct ProcessAccount {
//!     pub account_id: u64,
//! }
//! ```

mod message;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `courier_core::Message`.
///
/// # Attributes
///
/// - `#[message(reply = "...")]` - The reply type (default: `()`)
/// - `#[message(name = "...")]` - Override the name used in errors and logs
///   (default: the Rust type name)
/// - `#[message(crate = "...")]` - Path to the crate exporting `Message`
///   (default: `::courier_core`)
///
/// Generic types are supported as long as every type parameter is `'static`.
#[proc_macro_derive(Message, attributes(message))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match message::derive_message(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
