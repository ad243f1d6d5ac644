//! Admin moderation commands.
//!
//! Every command opens the admin panel first, which loads all sections; the
//! requested action then runs against that state.
//!
//! # Usage
//!
//! ```bash
//! portfolio admin dashboard
//! portfolio admin testimonials --filter pending
//! portfolio admin approve 5
//! portfolio admin replied 12
//! ```

use portfolio_client::{AdminPanel, PanelAccess, PanelError, PanelSection, PortfolioClient};
use portfolio_core::{ContactMessageId, TestimonialFilter, TestimonialId};
use thiserror::Error;

/// Errors that can occur during admin commands.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The saved session is missing or not an admin's.
    #[error("Admin access required. Log in with an admin account first.")]
    AccessDenied,

    /// The section the command shows failed to load.
    #[error("Could not load {0}: {1}")]
    SectionUnavailable(PanelSection, String),

    /// A moderation action failed.
    #[error(transparent)]
    Panel(#[from] PanelError),
}

/// Open the panel, failing unless the session is an admin's.
pub async fn open_panel(client: &PortfolioClient) -> Result<AdminPanel, AdminError> {
    let panel = client.admin_panel();
    match panel.open().await {
        PanelAccess::Granted => Ok(panel),
        PanelAccess::Denied => Err(AdminError::AccessDenied),
    }
}

fn ensure_loaded(panel: &AdminPanel, section: PanelSection) -> Result<(), AdminError> {
    match panel.view().failures.get(&section) {
        Some(message) => Err(AdminError::SectionUnavailable(section, message.clone())),
        None => Ok(()),
    }
}

/// Show dashboard statistics and recent activity.
pub fn dashboard(panel: &AdminPanel) -> Result<(), AdminError> {
    ensure_loaded(panel, PanelSection::Stats)?;
    let stats = panel.view().stats.unwrap_or_default();

    tracing::info!("Users:        {}", stats.total_users);
    tracing::info!(
        "Testimonials: {} ({} approved, {} pending)",
        stats.total_testimonials,
        stats.approved_testimonials(),
        stats.pending_testimonials
    );
    tracing::info!(
        "Messages:     {} ({} unread, {} replied)",
        stats.message_total(),
        stats.unread_messages,
        stats.contact_messages.replied
    );
    tracing::info!(
        "Inquiries:    {} ({} completed)",
        stats.shop_inquiries.total,
        stats.shop_inquiries.completed
    );
    for activity in &stats.recent_activity {
        tracing::info!("  new {} from {}", activity.kind, activity.name);
    }
    Ok(())
}

/// List testimonials passing `filter`.
pub fn testimonials(panel: &AdminPanel, filter: TestimonialFilter) -> Result<(), AdminError> {
    ensure_loaded(panel, PanelSection::Testimonials)?;
    panel.set_filter(filter);
    let view = panel.view();
    let counts = view.filter_counts();

    tracing::info!(
        "{} testimonials: {} approved, {} pending",
        counts.all,
        counts.approved,
        counts.pending
    );
    for testimonial in view.visible_testimonials() {
        tracing::info!(
            "#{} [{}] {} <{}> ({}): {}",
            testimonial.id,
            testimonial.status,
            testimonial.name,
            testimonial.email,
            testimonial.rating,
            testimonial.message
        );
    }
    Ok(())
}

/// Approve a testimonial, or send it back to pending.
pub async fn set_approval(
    panel: &AdminPanel,
    id: TestimonialId,
    approved: bool,
) -> Result<(), AdminError> {
    let updated = panel.set_testimonial_status(id, approved).await?;
    tracing::info!("Testimonial #{id} is now {}", updated.status);
    Ok(())
}

/// Delete a testimonial.
pub async fn delete(panel: &AdminPanel, id: TestimonialId) -> Result<(), AdminError> {
    panel.delete_testimonial(id).await?;
    tracing::info!("Testimonial #{id} deleted");
    Ok(())
}

/// List contact messages.
pub fn messages(panel: &AdminPanel) -> Result<(), AdminError> {
    ensure_loaded(panel, PanelSection::Messages)?;
    let view = panel.view();
    if view.messages.is_empty() {
        tracing::info!("No contact messages");
    }
    for message in &view.messages {
        let replied = if message.replied { ", replied" } else { "" };
        tracing::info!(
            "#{} [{}{replied}] {} <{}> - {}: {}",
            message.id,
            message.status,
            message.name,
            message.email,
            message.subject.as_deref().unwrap_or("(no subject)"),
            message.message
        );
    }
    Ok(())
}

/// Mark a contact message as in progress.
pub async fn mark_in_progress(panel: &AdminPanel, id: ContactMessageId) -> Result<(), AdminError> {
    let updated = panel.mark_in_progress(id).await?;
    tracing::info!("Message #{id} is now {}", updated.status);
    Ok(())
}

/// Mark a contact message as replied.
pub async fn mark_replied(panel: &AdminPanel, id: ContactMessageId) -> Result<(), AdminError> {
    let updated = panel.mark_replied(id).await?;
    tracing::info!("Message #{id} is now {} and replied", updated.status);
    Ok(())
}

/// List shop inquiries.
pub fn inquiries(panel: &AdminPanel) -> Result<(), AdminError> {
    ensure_loaded(panel, PanelSection::Inquiries)?;
    let view = panel.view();
    if view.inquiries.is_empty() {
        tracing::info!("No shop inquiries");
    }
    for inquiry in &view.inquiries {
        tracing::info!(
            "#{} [{}] {} <{}> - {} ({}, {}): {}",
            inquiry.id,
            inquiry.status,
            inquiry.name,
            inquiry.email,
            inquiry.service_type,
            inquiry.budget_range.as_deref().unwrap_or("no budget given"),
            inquiry.timeline.as_deref().unwrap_or("no timeline given"),
            inquiry.project_description
        );
    }
    Ok(())
}

/// List registered users.
pub fn users(panel: &AdminPanel) -> Result<(), AdminError> {
    ensure_loaded(panel, PanelSection::Users)?;
    for user in &panel.view().users {
        tracing::info!("#{} {} <{}> - {}", user.id, user.username, user.email, user.role);
    }
    Ok(())
}
