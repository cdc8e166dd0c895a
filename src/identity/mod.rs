//! Session identity and credential storage
//!
//! An identity is resolved once per session: read from the credential store
//! when present, generated and stored otherwise.

pub mod store;

pub use store::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};

use crate::error::Result;
use crate::types::Identity;
use crate::utils::generate_user_id;
use store::{EMAIL_KEY, TOKEN_KEY, USER_ID_KEY};
use tracing::info;

/// Read the stored identity, if a user id has been stored
pub fn load_identity(store: &dyn CredentialStore) -> Result<Option<Identity>> {
    let user_id = match store.get(USER_ID_KEY)? {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Ok(None),
    };

    Ok(Some(Identity {
        email: store.get(EMAIL_KEY)?.unwrap_or_default(),
        auth_token: store.get(TOKEN_KEY)?.unwrap_or_default(),
        user_id,
    }))
}

/// Load the stored identity or create one for this session.
///
/// A stored identity is returned unchanged, so the hints only matter the first
/// time. A generated email has the form `guest-<8 chars of user id>@guest.local`.
pub fn load_or_create_identity(
    store: &dyn CredentialStore,
    email_hint: Option<&str>,
    token_hint: Option<&str>,
) -> Result<Identity> {
    if let Some(identity) = load_identity(store)? {
        return Ok(identity);
    }

    let user_id = generate_user_id();
    let email = match email_hint {
        Some(email) if !email.trim().is_empty() => email.trim().to_string(),
        _ => format!("guest-{}@guest.local", &user_id[..8]),
    };
    let identity = Identity {
        user_id,
        email,
        auth_token: token_hint.unwrap_or_default().to_string(),
    };

    store.set(USER_ID_KEY, &identity.user_id)?;
    store.set(EMAIL_KEY, &identity.email)?;
    store.set(TOKEN_KEY, &identity.auth_token)?;

    info!(
        "Created session identity - user_id: '{}', email: '{}'",
        identity.user_id, identity.email
    );
    Ok(identity)
}
