//! Core types for the portfolio client.
//!
//! This module provides type-safe wrappers and records for the resources the
//! portfolio backend exposes.

pub mod contact;
pub mod email;
pub mod id;
pub mod inquiry;
pub mod rating;
pub mod stats;
pub mod status;
pub mod testimonial;
pub mod user;
pub mod validation;
pub mod wire;

pub use contact::{ContactMessage, ContactMessageUpdate, ContactSubmission, DEFAULT_SUBJECT};
pub use email::{Email, EmailError};
pub use id::*;
pub use inquiry::ShopInquiry;
pub use rating::Rating;
pub use stats::{Activity, ActivityKind, DashboardStats, InquiryCounts, MessageCounts};
pub use status::*;
pub use testimonial::{
    Testimonial, TestimonialFilter, TestimonialStatusUpdate, TestimonialSubmission, public_only,
};
pub use user::{UserRecord, UserSummary};
pub use validation::{MIN_PASSWORD_LENGTH, ValidationError, require, validate_password};
