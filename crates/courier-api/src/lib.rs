//! REST client for the chat server's HTTP surface.
//!
//! Covers login, conversation and message history fetches, conversation
//! creation, and profile lookup. Shares a [`SessionHandle`] with the
//! realtime client so a 401 anywhere forces logout exactly once.
//!
//! [`SessionHandle`]: courier_common::SessionHandle

mod client;
mod dto;
mod error;

pub use client::ApiClient;
pub use dto::{CreatedConversation, InitMessage, LoginRequest, LoginResponse, NewConversation};
pub use error::ApiError;
