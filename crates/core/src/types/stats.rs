//! Dashboard statistics computed by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire::timestamp;

/// Aggregate counts shown on the dashboard tab.
///
/// Always fetched from the backend after a mutation, never derived from the
/// client's cached lists. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_testimonials: u64,
    pub pending_testimonials: u64,
    pub total_messages: u64,
    pub unread_messages: u64,
    pub contact_messages: MessageCounts,
    pub shop_inquiries: InquiryCounts,
    pub recent_activity: Vec<Activity>,
}

impl DashboardStats {
    /// Testimonials not waiting for review.
    #[must_use]
    pub const fn approved_testimonials(&self) -> u64 {
        self.total_testimonials.saturating_sub(self.pending_testimonials)
    }

    /// Total contact messages, whichever of the two counters the backend
    /// filled in.
    #[must_use]
    pub fn message_total(&self) -> u64 {
        self.contact_messages.total.max(self.total_messages)
    }
}

/// Contact message counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageCounts {
    pub total: u64,
    pub replied: u64,
}

/// Shop inquiry counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InquiryCounts {
    pub total: u64,
    pub completed: u64,
}

/// One line of the dashboard's recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub name: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// What kind of submission an activity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Testimonial,
    Contact,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Testimonial => write!(f, "testimonial"),
            Self::Contact => write!(f, "contact"),
            Self::Other => write!(f, "inquiry"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_flat_backend_stats() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "totalUsers": 2,
            "totalTestimonials": 7,
            "pendingTestimonials": 3,
            "totalMessages": 4,
            "unreadMessages": 1
        }))
        .unwrap();

        assert_eq!(stats.approved_testimonials(), 4);
        assert_eq!(stats.message_total(), 4);
        assert!(stats.recent_activity.is_empty());
    }

    #[test]
    fn test_nested_counters_and_activity() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "contactMessages": {"total": 9, "replied": 2},
            "shopInquiries": {"total": 3},
            "recentActivity": [
                {"type": "testimonial", "name": "Sarah", "created_at": "2024-09-15 08:00:00"},
                {"type": "shop", "name": "Client"}
            ]
        }))
        .unwrap();

        assert_eq!(stats.message_total(), 9);
        assert_eq!(stats.shop_inquiries.completed, 0);
        assert_eq!(stats.recent_activity[1].kind, ActivityKind::Other);
    }

    #[test]
    fn test_pending_above_total_saturates() {
        let stats = DashboardStats {
            total_testimonials: 1,
            pending_testimonials: 2,
            ..DashboardStats::default()
        };
        assert_eq!(stats.approved_testimonials(), 0);
    }
}
