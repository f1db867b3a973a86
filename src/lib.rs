//! Chat-style translation client.
//!
//! A [`ChatController`] owns the page state (input, language selectors, chat
//! log), talks to the translation backend through an [`ApiClient`], and
//! renders through any [`ChatView`].

pub mod api;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod controller;
pub mod environment;
pub mod error;
pub mod page;
pub mod speech;
pub mod terminal;
pub mod view;

pub use api::ApiClient;
pub use controller::ChatController;
pub use error::ChatError;
pub use view::ChatView;
