//! One-stop construction of every client component from configuration.

use std::time::Duration;

use crate::auth::AuthFlow;
use crate::config::ClientConfig;
use crate::forms::{ContactForm, PublicTestimonials, TestimonialForm};
use crate::http::{ApiClient, ApiError};
use crate::moderation::ModerationClient;
use crate::panel::AdminPanel;
use crate::session::SessionStore;

/// Shared handles for one backend and one persisted session.
#[derive(Debug, Clone)]
pub struct PortfolioClient {
    api: ApiClient,
    session: SessionStore,
    form_reset_delay: Duration,
}

impl PortfolioClient {
    /// Build the HTTP client and session store described by `config` and
    /// restore any persisted session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let session = SessionStore::file(&config.session_path);
        session.restore();
        Ok(Self::with_session(ApiClient::new(config)?, session, config.form_reset_delay))
    }

    /// Assemble from existing parts.
    #[must_use]
    pub const fn with_session(
        api: ApiClient,
        session: SessionStore,
        form_reset_delay: Duration,
    ) -> Self {
        Self {
            api,
            session,
            form_reset_delay,
        }
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn auth(&self) -> AuthFlow {
        AuthFlow::new(self.api.clone(), self.session.clone())
    }

    #[must_use]
    pub fn moderation(&self) -> ModerationClient {
        ModerationClient::new(self.api.clone(), self.session.clone())
    }

    #[must_use]
    pub fn admin_panel(&self) -> AdminPanel {
        AdminPanel::new(self.moderation(), self.session.clone())
    }

    #[must_use]
    pub fn contact_form(&self) -> ContactForm {
        ContactForm::new(self.api.clone(), self.form_reset_delay)
    }

    #[must_use]
    pub fn testimonial_form(&self) -> TestimonialForm {
        TestimonialForm::new(self.api.clone(), self.form_reset_delay)
    }

    #[must_use]
    pub fn public_testimonials(&self) -> PublicTestimonials {
        PublicTestimonials::new(self.api.clone())
    }
}
