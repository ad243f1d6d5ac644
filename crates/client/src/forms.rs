//! Public submission forms and the public testimonial list.
//!
//! None of these use the session. Each form sends at most one request at a
//! time and, after a success, clears itself once the confirmation has been
//! shown for the configured delay.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use portfolio_core::{
    ContactSubmission, Testimonial, TestimonialSubmission, ValidationError, public_only,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::SubmissionError;
use crate::http::{ApiClient, ApiError};

/// A payload one of the public forms can send.
pub trait Submission: Serialize + Default + Clone + Send + 'static {
    /// Endpoint the payload is POSTed to.
    const PATH: &'static str;

    /// Trimmed, defaulted and validated copy of the payload.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    fn prepared(&self) -> Result<Self, ValidationError>;
}

impl Submission for ContactSubmission {
    const PATH: &'static str = "api/contact";

    fn prepared(&self) -> Result<Self, ValidationError> {
        Self::prepared(self)
    }
}

impl Submission for TestimonialSubmission {
    const PATH: &'static str = "api/testimonials";

    fn prepared(&self) -> Result<Self, ValidationError> {
        Self::prepared(self)
    }
}

/// Form lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    /// Shown until the reset delay elapses.
    Succeeded,
    /// Carries the message to show.
    Failed(String),
}

#[derive(Debug, Default)]
struct FormState<S> {
    fields: S,
    status: FormStatus,
    /// Bumped by every submit so a pending reset never clears a newer one.
    attempt: u64,
}

/// A public submission form.
#[derive(Debug, Clone)]
pub struct SubmissionForm<S> {
    api: ApiClient,
    reset_delay: Duration,
    state: Arc<Mutex<FormState<S>>>,
}

/// The contact form.
pub type ContactForm = SubmissionForm<ContactSubmission>;

/// The testimonial submission form.
pub type TestimonialForm = SubmissionForm<TestimonialSubmission>;

impl<S: Submission + std::fmt::Debug> SubmissionForm<S> {
    /// Create an empty, idle form.
    #[must_use]
    pub fn new(api: ApiClient, reset_delay: Duration) -> Self {
        Self {
            api,
            reset_delay,
            state: Arc::new(Mutex::new(FormState {
                fields: S::default(),
                status: FormStatus::Idle,
                attempt: 0,
            })),
        }
    }

    /// Current field values.
    #[must_use]
    pub fn fields(&self) -> S {
        self.lock().fields.clone()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> FormStatus {
        self.lock().status.clone()
    }

    /// Edit the fields. A shown failure goes back to idle.
    ///
    /// Ignored while a submit is in flight.
    pub fn edit(&self, update: impl FnOnce(&mut S)) {
        let mut state = self.lock();
        if state.status == FormStatus::Submitting {
            debug!("Ignoring edit while submitting");
            return;
        }
        update(&mut state.fields);
        if matches!(state.status, FormStatus::Failed(_)) {
            state.status = FormStatus::Idle;
        }
    }

    /// Validate and send the form.
    ///
    /// On success the form shows [`FormStatus::Succeeded`] and a background
    /// task clears the fields and returns to idle after the reset delay.
    ///
    /// # Errors
    ///
    /// - `SubmissionError::InFlight` while a previous submit is pending (no
    ///   request sent)
    /// - `SubmissionError::Validation` for invalid fields (no request sent)
    /// - transport, rejection or decode errors from the backend
    #[instrument(skip(self), fields(path = S::PATH))]
    pub async fn submit(&self) -> Result<(), SubmissionError> {
        let (payload, attempt) = {
            let mut state = self.lock();
            if state.status == FormStatus::Submitting {
                debug!("Ignoring submit while a submission is in flight");
                return Err(SubmissionError::InFlight);
            }
            match state.fields.prepared() {
                Ok(payload) => {
                    state.status = FormStatus::Submitting;
                    state.attempt += 1;
                    (payload, state.attempt)
                }
                Err(e) => {
                    state.status = FormStatus::Failed(e.to_string());
                    return Err(e.into());
                }
            }
        };

        match self.api.submit(S::PATH, &payload).await {
            Ok(()) => {
                self.lock().status = FormStatus::Succeeded;
                info!("Submission accepted");
                self.schedule_reset(attempt);
                Ok(())
            }
            Err(e) => {
                let error = SubmissionError::from(e);
                warn!(error = %error, "Submission failed");
                self.lock().status = FormStatus::Failed(error.to_string());
                Err(error)
            }
        }
    }

    fn schedule_reset(&self, attempt: u64) {
        let state = Arc::clone(&self.state);
        let delay = self.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.attempt == attempt && state.status == FormStatus::Succeeded {
                state.fields = S::default();
                state.status = FormStatus::Idle;
                debug!("Form reset after successful submission");
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, FormState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The public testimonial list.
#[derive(Debug, Clone)]
pub struct PublicTestimonials {
    api: ApiClient,
}

impl PublicTestimonials {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch testimonials for public display. Anything not approved is
    /// dropped here, whatever the backend returned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Vec<Testimonial>, ApiError> {
        let testimonials: Vec<Testimonial> = self.api.get("api/testimonials", None).await?;
        let received = testimonials.len();
        let public = public_only(testimonials);
        if public.len() < received {
            debug!(
                dropped = received - public.len(),
                "Dropped non-approved testimonials from public list"
            );
        }
        Ok(public)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn contact_form() -> ContactForm {
        let config = ClientConfig::new("http://192.0.2.1:9", "unused.json").unwrap();
        ContactForm::new(ApiClient::new(&config).unwrap(), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_invalid_fields_fail_without_request() {
        let form = contact_form();
        form.edit(|fields| {
            fields.name = "Ada".to_string();
            fields.email = "ada".to_string();
            fields.message = "Hello".to_string();
        });

        let result = form.submit().await;
        assert!(matches!(
            result,
            Err(SubmissionError::Validation(ValidationError::InvalidEmail(_)))
        ));
        assert!(matches!(form.status(), FormStatus::Failed(_)));

        form.edit(|fields| fields.email = "ada@example.com".to_string());
        assert_eq!(form.status(), FormStatus::Idle);
    }

    #[tokio::test]
    async fn test_submit_while_submitting_is_in_flight() {
        let form = contact_form();
        form.lock().status = FormStatus::Submitting;

        assert_eq!(form.submit().await, Err(SubmissionError::InFlight));
        assert_eq!(form.status(), FormStatus::Submitting);
    }

    #[test]
    fn test_edit_ignored_while_submitting() {
        let form = contact_form();
        form.edit(|fields| fields.name = "Ada".to_string());
        form.lock().status = FormStatus::Submitting;

        form.edit(|fields| fields.name = "Grace".to_string());
        assert_eq!(form.fields().name, "Ada");
        assert_eq!(form.status(), FormStatus::Submitting);
    }

    #[tokio::test]
    async fn test_reset_clears_fields_after_delay() {
        let form = contact_form();
        form.edit(|fields| fields.name = "Ada".to_string());
        {
            let mut state = form.lock();
            state.status = FormStatus::Succeeded;
            state.attempt = 1;
        }

        form.schedule_reset(1);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(form.status(), FormStatus::Idle);
        assert_eq!(form.fields(), ContactSubmission::default());
    }

    #[tokio::test]
    async fn test_stale_reset_is_ignored() {
        let form = contact_form();
        form.edit(|fields| fields.name = "Ada".to_string());
        {
            let mut state = form.lock();
            state.status = FormStatus::Succeeded;
            state.attempt = 2;
        }

        form.schedule_reset(1);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(form.status(), FormStatus::Succeeded);
        assert_eq!(form.fields().name, "Ada");
    }
}
