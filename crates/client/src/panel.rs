//! Admin panel state.
//!
//! [`AdminPanel`] composes [`ModerationClient`] calls into the view state an
//! admin UI renders: four mutually exclusive tabs over the dashboard stats,
//! testimonials, contact messages and shop inquiries.
//!
//! # Gate
//!
//! Nothing is fetched or mutated unless the current session belongs to an
//! admin. The gate is advisory; the backend enforces roles on its own. It is
//! checked on every read too: once the session stops being an admin's, an
//! open panel closes and its data is dropped.
//!
//! # Updates
//!
//! Opening the panel fetches every section concurrently. A section that
//! fails is recorded in [`PanelView::failures`] and the others still load.
//! After a confirmed mutation the affected record is replaced in (or removed
//! from) its [`Listing`] and the stats are refetched; a failed mutation
//! leaves the lists alone and sets [`PanelView::notice`]. A status change the
//! backend accepts without echoing the record is applied to the cached entry.
//!
//! Results that arrive after [`close`](AdminPanel::close) (or after a newer
//! [`open`](AdminPanel::open)) are dropped.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use portfolio_core::{
    ContactMessage, ContactMessageId, DashboardStats, ProgressStatus, ShopInquiry, Testimonial,
    TestimonialFilter, TestimonialId, TestimonialStatus, UserRecord,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ModerationError, PanelError};
use crate::listing::Listing;
use crate::moderation::ModerationClient;
use crate::session::SessionStore;

/// Outcome of [`AdminPanel::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAccess {
    /// The panel loaded (some sections may have failed).
    Granted,
    /// Not an admin session; no requests were made.
    Denied,
}

/// Panel tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Testimonials,
    Messages,
    Shop,
}

/// Independently loaded parts of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PanelSection {
    Stats,
    Testimonials,
    Messages,
    Users,
    Inquiries,
}

impl std::fmt::Display for PanelSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stats => write!(f, "dashboard stats"),
            Self::Testimonials => write!(f, "testimonials"),
            Self::Messages => write!(f, "contact messages"),
            Self::Users => write!(f, "users"),
            Self::Inquiries => write!(f, "shop inquiries"),
        }
    }
}

/// Testimonial counts per filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCounts {
    pub all: usize,
    pub approved: usize,
    pub pending: usize,
}

/// Everything the panel shows.
#[derive(Debug, Clone, Default)]
pub struct PanelView {
    pub tab: Tab,
    pub filter: TestimonialFilter,
    /// `None` until the stats have loaded once.
    pub stats: Option<DashboardStats>,
    pub testimonials: Listing<Testimonial>,
    pub messages: Listing<ContactMessage>,
    pub inquiries: Listing<ShopInquiry>,
    pub users: Listing<UserRecord>,
    /// Sections whose last fetch failed, with the error message.
    pub failures: BTreeMap<PanelSection, String>,
    /// Result of the last action, for a status line.
    pub notice: Option<String>,
}

impl PanelView {
    /// Testimonials passing the current filter.
    #[must_use]
    pub fn visible_testimonials(&self) -> Vec<&Testimonial> {
        self.testimonials
            .iter()
            .filter(|testimonial| self.filter.matches(testimonial))
            .collect()
    }

    /// How many testimonials each filter would show.
    #[must_use]
    pub fn filter_counts(&self) -> FilterCounts {
        let all = self.testimonials.len();
        let approved = self
            .testimonials
            .iter()
            .filter(|testimonial| testimonial.is_public())
            .count();
        FilterCounts {
            all,
            approved,
            pending: all - approved,
        }
    }
}

#[derive(Debug, Default)]
struct PanelInner {
    /// Bumped by every open and close; results tagged with an older value
    /// are dropped.
    generation: u64,
    open: bool,
    view: PanelView,
}

/// Role-gated admin panel controller.
#[derive(Debug)]
pub struct AdminPanel {
    moderation: ModerationClient,
    session: SessionStore,
    inner: Mutex<PanelInner>,
}

impl AdminPanel {
    /// Create a closed panel.
    #[must_use]
    pub fn new(moderation: ModerationClient, session: SessionStore) -> Self {
        Self {
            moderation,
            session,
            inner: Mutex::new(PanelInner::default()),
        }
    }

    /// Open the panel and load every section.
    ///
    /// Returns [`PanelAccess::Denied`] without any request unless the
    /// current session is an admin's.
    #[instrument(skip(self))]
    pub async fn open(&self) -> PanelAccess {
        if !self.is_admin() {
            info!("Admin panel requires an admin session");
            return PanelAccess::Denied;
        }

        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.open = true;
            inner.view = PanelView {
                tab: inner.view.tab,
                filter: inner.view.filter,
                ..PanelView::default()
            };
            inner.generation
        };

        let (stats, testimonials, messages, users, inquiries) = tokio::join!(
            self.moderation.get_stats(),
            self.moderation.list_testimonials(),
            self.moderation.list_contact_messages(),
            self.moderation.list_users(),
            self.moderation.list_shop_inquiries(),
        );

        let mut failures = BTreeMap::new();
        let stats = settle(&mut failures, PanelSection::Stats, stats);
        let testimonials = settle(&mut failures, PanelSection::Testimonials, testimonials);
        let messages = settle(&mut failures, PanelSection::Messages, messages);
        let users = settle(&mut failures, PanelSection::Users, users);
        let inquiries = settle(&mut failures, PanelSection::Inquiries, inquiries);

        self.apply(generation, move |view| {
            view.stats = stats;
            view.testimonials = testimonials.unwrap_or_default().into();
            view.messages = messages.unwrap_or_default().into();
            view.users = users.unwrap_or_default().into();
            view.inquiries = inquiries.unwrap_or_default().into();
            view.failures = failures;
        });

        PanelAccess::Granted
    }

    /// Close the panel and drop its data. In-flight results are discarded.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.open = false;
        inner.view = PanelView::default();
        debug!("Admin panel closed");
    }

    /// Whether the panel is open. Always `false` without an admin session.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.gated().open
    }

    /// A snapshot of the current view. Empty without an admin session.
    #[must_use]
    pub fn view(&self) -> PanelView {
        self.gated().view.clone()
    }

    /// Switch tabs. No requests are made.
    pub fn select_tab(&self, tab: Tab) {
        self.lock().view.tab = tab;
    }

    /// Change the testimonial filter. No requests are made.
    pub fn set_filter(&self, filter: TestimonialFilter) {
        self.lock().view.filter = filter;
    }

    /// Approve or un-approve a testimonial.
    ///
    /// # Errors
    ///
    /// Returns `PanelError` if the gate refuses or the backend call fails.
    #[instrument(skip(self))]
    pub async fn set_testimonial_status(
        &self,
        id: TestimonialId,
        approved: bool,
    ) -> Result<Testimonial, PanelError> {
        let generation = self.check_access()?;
        let updated = match self.moderation.set_testimonial_status(id, approved).await {
            Ok(updated) => updated,
            Err(ModerationError::Decode(detail)) => {
                let cached = self.lock().view.testimonials.get(id).cloned();
                let Some(mut cached) = cached else {
                    return Err(self.record_failure(generation, ModerationError::Decode(detail)));
                };
                warn!(%id, "Status change accepted without a record ({detail}); patching cache");
                cached.status = TestimonialStatus::from_approval(approved);
                cached
            }
            Err(e) => return Err(self.record_failure(generation, e)),
        };

        let replacement = updated.clone();
        self.apply(generation, |view| {
            view.testimonials = view.testimonials.with_replaced(replacement);
            view.notice = Some(format!("Testimonial {id} is now {}", updated.status));
        });
        self.refresh_stats(generation).await;
        Ok(updated)
    }

    /// Approve a testimonial that is not approved, or send an approved one
    /// back to pending.
    ///
    /// # Errors
    ///
    /// Returns `PanelError::NotLoaded` if the testimonial is not in the
    /// panel, otherwise as [`set_testimonial_status`](Self::set_testimonial_status).
    pub async fn toggle_testimonial(&self, id: TestimonialId) -> Result<Testimonial, PanelError> {
        self.check_access()?;
        let is_public = self
            .lock()
            .view
            .testimonials
            .get(id)
            .map(Testimonial::is_public)
            .ok_or(PanelError::NotLoaded {
                kind: "Testimonial",
                id: id.as_i64(),
            })?;
        self.set_testimonial_status(id, !is_public).await
    }

    /// Delete a testimonial.
    ///
    /// # Errors
    ///
    /// Returns `PanelError` if the gate refuses or the backend call fails.
    #[instrument(skip(self))]
    pub async fn delete_testimonial(&self, id: TestimonialId) -> Result<(), PanelError> {
        let generation = self.check_access()?;
        if let Err(e) = self.moderation.delete_testimonial(id).await {
            return Err(self.record_failure(generation, e));
        }

        self.apply(generation, |view| {
            view.testimonials = view.testimonials.without(id);
            view.notice = Some(format!("Testimonial {id} deleted"));
        });
        self.refresh_stats(generation).await;
        Ok(())
    }

    /// Set a contact message's status and replied flag.
    ///
    /// # Errors
    ///
    /// Returns `PanelError` if the gate refuses or the backend call fails.
    #[instrument(skip(self))]
    pub async fn update_contact_message(
        &self,
        id: ContactMessageId,
        status: ProgressStatus,
        replied: bool,
    ) -> Result<ContactMessage, PanelError> {
        let generation = self.check_access()?;
        let updated = match self
            .moderation
            .update_contact_message(id, status, replied)
            .await
        {
            Ok(updated) => updated,
            Err(ModerationError::Decode(detail)) => {
                let cached = self.lock().view.messages.get(id).cloned();
                let Some(mut cached) = cached else {
                    return Err(self.record_failure(generation, ModerationError::Decode(detail)));
                };
                warn!(%id, "Message update accepted without a record ({detail}); patching cache");
                cached.status = status;
                cached.replied = replied;
                cached
            }
            Err(e) => return Err(self.record_failure(generation, e)),
        };

        let replacement = updated.clone();
        self.apply(generation, |view| {
            view.messages = view.messages.with_replaced(replacement);
            view.notice = Some(format!("Message {id} marked {}", updated.status));
        });
        self.refresh_stats(generation).await;
        Ok(updated)
    }

    /// Mark a message as being worked on, keeping its replied flag.
    ///
    /// # Errors
    ///
    /// Returns `PanelError::NotLoaded` if the message is not in the panel,
    /// otherwise as [`update_contact_message`](Self::update_contact_message).
    pub async fn mark_in_progress(&self, id: ContactMessageId) -> Result<ContactMessage, PanelError> {
        self.check_access()?;
        let replied = self
            .lock()
            .view
            .messages
            .get(id)
            .map(|message| message.replied)
            .ok_or(PanelError::NotLoaded {
                kind: "Message",
                id: id.as_i64(),
            })?;
        self.update_contact_message(id, ProgressStatus::InProgress, replied)
            .await
    }

    /// Mark a message as answered: completed and replied.
    ///
    /// # Errors
    ///
    /// As [`update_contact_message`](Self::update_contact_message).
    pub async fn mark_replied(&self, id: ContactMessageId) -> Result<ContactMessage, PanelError> {
        self.update_contact_message(id, ProgressStatus::Completed, true)
            .await
    }

    async fn refresh_stats(&self, generation: u64) {
        match self.moderation.get_stats().await {
            Ok(stats) => {
                self.apply(generation, |view| {
                    view.stats = Some(stats);
                    view.failures.remove(&PanelSection::Stats);
                });
            }
            Err(e) => {
                error!("Failed to refresh dashboard stats: {e}");
                self.apply(generation, |view| {
                    view.failures.insert(PanelSection::Stats, e.to_string());
                });
            }
        }
    }

    fn record_failure(&self, generation: u64, e: ModerationError) -> PanelError {
        error!("Admin action failed: {e}");
        let notice = e.to_string();
        self.apply(generation, |view| view.notice = Some(notice));
        e.into()
    }

    fn check_access(&self) -> Result<u64, PanelError> {
        if !self.is_admin() {
            return Err(PanelError::Denied);
        }
        let inner = self.lock();
        if !inner.open {
            return Err(PanelError::Closed);
        }
        Ok(inner.generation)
    }

    fn is_admin(&self) -> bool {
        self.session.user().is_some_and(|user| user.is_admin())
    }

    /// Lock the panel state, closing it first if the session is no longer an
    /// admin's.
    fn gated(&self) -> MutexGuard<'_, PanelInner> {
        let admin = self.is_admin();
        let mut inner = self.lock();
        if !admin && inner.open {
            inner.generation += 1;
            inner.open = false;
            inner.view = PanelView::default();
            info!("Session is no longer an admin's; admin panel closed");
        }
        inner
    }

    /// Run `update` against the view if `generation` is still current.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut PanelView)) {
        let mut inner = self.gated();
        if inner.open && inner.generation == generation {
            update(&mut inner.view);
        } else {
            debug!(generation, current = inner.generation, "Dropping stale panel result");
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Unwrap a section fetch, recording and logging its failure.
fn settle<T>(
    failures: &mut BTreeMap<PanelSection, String>,
    section: PanelSection,
    result: Result<T, ModerationError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Failed to fetch {section}: {e}");
            failures.insert(section, e.to_string());
            None
        }
    }
}
