//! Public site commands: contact form and testimonials.

use portfolio_client::{ApiError, PortfolioClient, SubmissionError};
use portfolio_core::{ContactSubmission, Rating, TestimonialSubmission};

/// Testimonial fields as given on the command line.
#[derive(Debug)]
pub struct TestimonialDraft {
    pub name: String,
    pub email: String,
    pub company: String,
    pub position: String,
    pub message: String,
    pub rating: i64,
}

/// Send a contact message.
pub async fn contact(
    client: &PortfolioClient,
    name: String,
    email: String,
    subject: String,
    message: String,
) -> Result<(), SubmissionError> {
    let form = client.contact_form();
    form.edit(|fields| {
        *fields = ContactSubmission {
            name,
            email,
            subject,
            message,
        };
    });
    form.submit().await?;
    tracing::info!("Message sent. Thanks for getting in touch!");
    Ok(())
}

/// Submit a testimonial for review.
pub async fn submit_testimonial(
    client: &PortfolioClient,
    draft: TestimonialDraft,
) -> Result<(), SubmissionError> {
    let rating = Rating::new(draft.rating)?;

    let form = client.testimonial_form();
    form.edit(|fields| {
        *fields = TestimonialSubmission {
            name: draft.name,
            email: draft.email,
            company: draft.company,
            position: draft.position,
            message: draft.message,
            rating,
        };
    });
    form.submit().await?;
    tracing::info!("Testimonial submitted. It will appear once approved.");
    Ok(())
}

/// List approved testimonials.
pub async fn list_testimonials(client: &PortfolioClient) -> Result<(), ApiError> {
    let testimonials = client.public_testimonials().fetch().await?;
    if testimonials.is_empty() {
        tracing::info!("No testimonials yet");
    }
    for testimonial in &testimonials {
        let company = testimonial
            .company
            .as_deref()
            .map(|company| format!(", {company}"))
            .unwrap_or_default();
        tracing::info!(
            "[{}] {} - {}{company}: \"{}\"",
            testimonial.rating,
            testimonial.name,
            testimonial.position,
            testimonial.message
        );
    }
    Ok(())
}
