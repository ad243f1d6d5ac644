//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! portfolio login -e admin@example.com -p admin123
//! portfolio register -u ada -e ada@example.com -p correct-horse
//! portfolio whoami
//! portfolio logout
//! ```
//!
//! # Environment Variables
//!
//! - `PORTFOLIO_PASSWORD` - Password for `login`/`register` when `-p` is omitted
//! - `PORTFOLIO_SESSION_PATH` - Where the session is saved

use portfolio_client::{AuthError, PortfolioClient, Session, StorageError};

fn report(session: &Session) {
    let user = session.user();
    tracing::info!("Logged in as {} ({})", user.username, user.role);
}

/// Log in and save the session.
pub async fn login(
    client: &PortfolioClient,
    identifier: &str,
    password: &str,
) -> Result<(), AuthError> {
    let session = client.auth().login(identifier, password).await?;
    report(&session);
    Ok(())
}

/// Register, then save the new session.
pub async fn register(
    client: &PortfolioClient,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), AuthError> {
    let session = client.auth().register(username, email, password).await?;
    report(&session);
    Ok(())
}

/// Forget the saved session.
pub fn logout(client: &PortfolioClient) -> Result<(), StorageError> {
    client.auth().logout()
}

/// Print the saved identity.
pub fn whoami(client: &PortfolioClient) {
    match client.session().user() {
        Some(user) => {
            let email = user.email.as_deref().unwrap_or("no email on record");
            tracing::info!("{} <{email}> - role: {}", user.username, user.role);
        }
        None => tracing::info!("Not logged in"),
    }
}
