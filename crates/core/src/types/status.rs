//! Status and role enums for portfolio resources.

use serde::{Deserialize, Serialize};

/// Account role, the only authorization signal the client consults.
///
/// Any role string other than `admin` decodes as [`Role::User`], so an
/// unexpected value from the backend never unlocks the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May open the admin panel.
    Admin,
    /// Regular visitor account.
    #[default]
    #[serde(other)]
    User,
}

impl Role {
    /// Whether this role passes the admin panel gate.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Moderation status of a testimonial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TestimonialStatus {
    /// Submitted, waiting for review. Hidden from the public list.
    #[default]
    Pending,
    /// Visible on the public site.
    Approved,
    /// Reviewed and declined. Hidden from the public list.
    Rejected,
}

impl TestimonialStatus {
    /// Map the admin panel's show/hide toggle onto a status.
    ///
    /// Hiding an approved testimonial sends it back to `pending` rather than
    /// `rejected`, matching the panel's eye/eye-off button.
    #[must_use]
    pub const fn from_approval(approved: bool) -> Self {
        if approved { Self::Approved } else { Self::Pending }
    }

    /// Map the legacy `verified` flag onto a status.
    #[must_use]
    pub const fn from_verified(verified: bool) -> Self {
        Self::from_approval(verified)
    }

    /// Whether testimonials in this status may appear on the public site.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl std::fmt::Display for TestimonialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Follow-up status shared by contact messages and shop inquiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    /// Not looked at yet. The backend's `unread` default decodes here.
    #[default]
    #[serde(alias = "unread")]
    New,
    /// Being handled.
    #[serde(alias = "in_progress")]
    InProgress,
    /// Handled.
    Completed,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" | "unread" => Ok(Self::New),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid status: {s}")),
        }
    }
}
