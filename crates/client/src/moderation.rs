//! Authenticated admin endpoints.

use portfolio_core::{
    ContactMessage, ContactMessageId, ContactMessageUpdate, DashboardStats, ProgressStatus,
    ShopInquiry, Testimonial, TestimonialId, TestimonialStatus, TestimonialStatusUpdate,
    UserRecord,
};
use secrecy::SecretString;
use tracing::{debug, instrument};

use crate::error::ModerationError;
use crate::http::ApiClient;
use crate::session::SessionStore;

/// Client for the `/api/admin` resources.
///
/// Every call takes the bearer token from the [`SessionStore`] at call time;
/// without a session it fails with [`ModerationError::NoSession`] and sends
/// nothing. Mutations are not optimistic: each returns the record the
/// backend reports after the change.
#[derive(Debug, Clone)]
pub struct ModerationClient {
    api: ApiClient,
    session: SessionStore,
}

impl ModerationClient {
    /// Create a client that authenticates with the session in `session`.
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Fetch dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<DashboardStats, ModerationError> {
        let token = self.token()?;
        let stats: DashboardStats = self.api.get("api/admin/stats", Some(&token)).await?;
        debug!(
            total_testimonials = stats.total_testimonials,
            pending_testimonials = stats.pending_testimonials,
            "Fetched dashboard stats"
        );
        Ok(stats)
    }

    /// Fetch every testimonial, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn list_testimonials(&self) -> Result<Vec<Testimonial>, ModerationError> {
        let token = self.token()?;
        let testimonials: Vec<Testimonial> =
            self.api.get("api/admin/testimonials", Some(&token)).await?;
        debug!(count = testimonials.len(), "Fetched testimonials");
        Ok(testimonials)
    }

    /// Approve (`true`) or un-approve (`false`, back to pending) a
    /// testimonial.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn set_testimonial_status(
        &self,
        id: TestimonialId,
        approved: bool,
    ) -> Result<Testimonial, ModerationError> {
        let token = self.token()?;
        let body = TestimonialStatusUpdate {
            status: TestimonialStatus::from_approval(approved),
        };
        let updated: Testimonial = self
            .api
            .put(&format!("api/admin/testimonials/{id}"), &body, Some(&token))
            .await?;
        debug!(%id, status = %updated.status, "Testimonial status updated");
        Ok(updated)
    }

    /// Delete a testimonial.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn delete_testimonial(&self, id: TestimonialId) -> Result<(), ModerationError> {
        let token = self.token()?;
        self.api
            .delete(&format!("api/admin/testimonials/{id}"), Some(&token))
            .await?;
        debug!(%id, "Testimonial deleted");
        Ok(())
    }

    /// Fetch contact messages.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>, ModerationError> {
        let token = self.token()?;
        let messages: Vec<ContactMessage> = self.api.get("api/admin/messages", Some(&token)).await?;
        debug!(count = messages.len(), "Fetched contact messages");
        Ok(messages)
    }

    /// Set a contact message's follow-up status and replied flag together.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn update_contact_message(
        &self,
        id: ContactMessageId,
        status: ProgressStatus,
        replied: bool,
    ) -> Result<ContactMessage, ModerationError> {
        let token = self.token()?;
        let body = ContactMessageUpdate { status, replied };
        let updated: ContactMessage = self
            .api
            .patch(&format!("api/admin/contact-messages/{id}"), &body, Some(&token))
            .await?;
        debug!(%id, status = %updated.status, replied = updated.replied, "Contact message updated");
        Ok(updated)
    }

    /// Fetch shop inquiries.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn list_shop_inquiries(&self) -> Result<Vec<ShopInquiry>, ModerationError> {
        let token = self.token()?;
        let inquiries: Vec<ShopInquiry> =
            self.api.get("api/admin/shop-inquiries", Some(&token)).await?;
        debug!(count = inquiries.len(), "Fetched shop inquiries");
        Ok(inquiries)
    }

    /// Fetch registered users.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ModerationError> {
        let token = self.token()?;
        let users: Vec<UserRecord> = self.api.get("api/admin/users", Some(&token)).await?;
        debug!(count = users.len(), "Fetched users");
        Ok(users)
    }

    fn token(&self) -> Result<SecretString, ModerationError> {
        self.session.token().ok_or(ModerationError::NoSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn test_no_session_short_circuits() {
        // Unroutable base URL: any request that did go out would fail as
        // Transport, not NoSession.
        let config = ClientConfig::new("http://192.0.2.1:9", "unused.json").unwrap();
        let client = ModerationClient::new(
            ApiClient::new(&config).unwrap(),
            SessionStore::in_memory(),
        );

        assert_eq!(client.get_stats().await, Err(ModerationError::NoSession));
        assert_eq!(
            client.set_testimonial_status(TestimonialId::new(5), true).await,
            Err(ModerationError::NoSession)
        );
        assert_eq!(
            client.delete_testimonial(TestimonialId::new(5)).await,
            Err(ModerationError::NoSession)
        );
        assert_eq!(client.list_users().await, Err(ModerationError::NoSession));
    }
}
