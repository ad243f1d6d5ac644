//! Testimonial records and submissions.
//!
//! Two shapes exist on the wire. The admin API returns rows with a `status`
//! column (`pending`/`approved`/`rejected`), while the static showcase data
//! uses `verified: bool` with `content`, `role`, `projectType` and `date`
//! field names. Both decode into the single [`Testimonial`] model:
//!
//! | Wire field | Canonical field |
//! |---|---|
//! | `status` | `status` |
//! | `verified: true` / `false` | `status: approved` / `pending` |
//! | `content` | `message` |
//! | `role` | `position` |
//! | `projectType` | `project_type` |
//! | `date` | `created_at` |
//!
//! When a record carries both `status` and `verified`, `status` wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{Identified, TestimonialId};
use super::rating::Rating;
use super::status::TestimonialStatus;
use super::validation::{ValidationError, require};
use super::wire::timestamp;

/// A testimonial as the client models it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TestimonialRecord")]
pub struct Testimonial {
    /// Backend id.
    pub id: TestimonialId,
    /// Author name.
    pub name: String,
    /// Author email (empty for showcase entries).
    pub email: String,
    /// Author company.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Author position or role.
    pub position: String,
    /// Testimonial text.
    pub message: String,
    /// Star rating.
    pub rating: Rating,
    /// Moderation status.
    pub status: TestimonialStatus,
    /// Kind of project the testimonial refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    /// Submission time.
    #[serde(serialize_with = "timestamp::option::serialize")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Testimonial {
    /// Whether this testimonial may appear on the public site.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.status.is_public()
    }
}

impl Identified for Testimonial {
    type Id = TestimonialId;

    fn id(&self) -> TestimonialId {
        self.id
    }
}

/// Union of both wire shapes.
#[derive(Deserialize)]
struct TestimonialRecord {
    id: TestimonialId,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default, alias = "role")]
    position: Option<String>,
    #[serde(alias = "content")]
    message: String,
    #[serde(default)]
    rating: Rating,
    #[serde(default)]
    status: Option<TestimonialStatus>,
    #[serde(default)]
    verified: Option<bool>,
    #[serde(default, alias = "projectType")]
    project_type: Option<String>,
    #[serde(default, alias = "date", with = "timestamp::option")]
    created_at: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<TestimonialRecord> for Testimonial {
    fn from(record: TestimonialRecord) -> Self {
        let status = record
            .status
            .or_else(|| record.verified.map(TestimonialStatus::from_verified))
            .unwrap_or_default();

        Self {
            id: record.id,
            name: record.name,
            email: record.email.unwrap_or_default(),
            company: non_blank(record.company),
            position: record.position.unwrap_or_default(),
            message: record.message,
            rating: record.rating,
            status,
            project_type: non_blank(record.project_type),
            created_at: record.created_at,
        }
    }
}

/// Keep only testimonials that may be shown publicly.
///
/// Applied client-side to every public listing, whatever the backend sent.
#[must_use]
pub fn public_only(testimonials: impl IntoIterator<Item = Testimonial>) -> Vec<Testimonial> {
    testimonials.into_iter().filter(Testimonial::is_public).collect()
}

/// Admin-side filter over the testimonial list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestimonialFilter {
    /// Every testimonial.
    #[default]
    All,
    /// Only approved (publicly visible) testimonials.
    Approved,
    /// Everything not approved yet, including rejected ones.
    Pending,
}

impl TestimonialFilter {
    /// Whether `testimonial` passes the filter.
    #[must_use]
    pub const fn matches(self, testimonial: &Testimonial) -> bool {
        match self {
            Self::All => true,
            Self::Approved => testimonial.is_public(),
            Self::Pending => !testimonial.is_public(),
        }
    }
}

impl std::str::FromStr for TestimonialFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "approved" | "verified" => Ok(Self::Approved),
            "pending" | "unverified" => Ok(Self::Pending),
            _ => Err(format!("invalid filter: {s}")),
        }
    }
}

/// Body of `PUT /api/admin/testimonials/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestimonialStatusUpdate {
    /// New status.
    pub status: TestimonialStatus,
}

/// Body of `POST /api/testimonials`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestimonialSubmission {
    /// Author name.
    pub name: String,
    /// Author email.
    pub email: String,
    /// Author company.
    #[serde(default)]
    pub company: String,
    /// Author position or role.
    #[serde(default)]
    pub position: String,
    /// Testimonial text.
    pub message: String,
    /// Star rating.
    #[serde(default)]
    pub rating: Rating,
}

impl TestimonialSubmission {
    /// Trim the fields and validate them, producing the payload to send.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found: blank name or message, or a
    /// malformed email.
    pub fn prepared(&self) -> Result<Self, ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("message", &self.message)?;
        let email = Email::parse(&self.email)?;

        Ok(Self {
            name: self.name.trim().to_owned(),
            email: email.into_inner(),
            company: self.company.trim().to_owned(),
            position: self.position.trim().to_owned(),
            message: self.message.trim().to_owned(),
            rating: self.rating,
        })
    }
}
