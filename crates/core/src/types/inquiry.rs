//! Shop (service) inquiries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{Identified, ShopInquiryId};
use super::status::ProgressStatus;
use super::wire::timestamp;

/// A request for a paid service, listed on the panel's shop tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopInquiry {
    /// Backend id.
    pub id: ShopInquiryId,
    /// Client name.
    pub name: String,
    /// Client email.
    pub email: String,
    /// Client phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Requested service.
    pub service_type: String,
    /// Free-form project description.
    pub project_description: String,
    /// Budget bracket.
    #[serde(default)]
    pub budget_range: Option<String>,
    /// Desired timeline.
    #[serde(default)]
    pub timeline: Option<String>,
    /// Follow-up status.
    #[serde(default)]
    pub status: ProgressStatus,
    /// When the inquiry was received.
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for ShopInquiry {
    type Id = ShopInquiryId;

    fn id(&self) -> ShopInquiryId {
        self.id
    }
}
