//! Portfolio Client - session, authentication and moderation flow.
//!
//! Talks to the portfolio backend's REST API on behalf of a UI layer:
//! - [`session`] - Persisted token and user, restored at startup
//! - [`auth`] - Login and registration
//! - [`moderation`] - Authenticated admin endpoints
//! - [`panel`] - Role-gated admin panel view state
//! - [`forms`] - Unauthenticated contact and testimonial forms
//!
//! # Architecture
//!
//! All components share one [`http::ApiClient`] and one
//! [`session::SessionStore`]; both are cheap to clone. [`PortfolioClient`]
//! wires them together from a [`ClientConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
pub mod listing;
pub mod moderation;
pub mod panel;
pub mod session;

pub use auth::{AuthFlow, AuthState};
pub use client::PortfolioClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{AuthError, ModerationError, PanelError, StorageError, SubmissionError};
pub use forms::{ContactForm, FormStatus, PublicTestimonials, SubmissionForm, TestimonialForm};
pub use http::{ApiClient, ApiError};
pub use listing::Listing;
pub use moderation::ModerationClient;
pub use panel::{AdminPanel, FilterCounts, PanelAccess, PanelSection, PanelView, Tab};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionStore};
