use chrono::Utc;

use crate::error::{Result, TrackerError};
use crate::models::{AuthTokens, User};
use crate::storage::{keys, KeyValueStore};

/// Opaque bearer-style tokens derived from the user id and the current time.
pub fn issue_tokens(user_id: i64) -> AuthTokens {
    let now = Utc::now().timestamp_millis();
    AuthTokens {
        access: format!("demo_token_{}_{}", user_id, now),
        refresh: format!("demo_refresh_{}_{}", user_id, now),
    }
}

/// Record `user` as the current session and return its fresh tokens.
pub fn establish(store: &dyn KeyValueStore, user: &User) -> Result<AuthTokens> {
    let tokens = issue_tokens(user.id);
    store.set(keys::ACCESS_TOKEN, &tokens.access)?;
    store.set(keys::REFRESH_TOKEN, &tokens.refresh)?;
    store.set(keys::CURRENT_USER, &serde_json::to_string(user)?)?;
    Ok(tokens)
}

pub fn clear(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(keys::ACCESS_TOKEN)?;
    store.remove(keys::REFRESH_TOKEN)?;
    store.remove(keys::CURRENT_USER)?;
    Ok(())
}

pub fn current_user(store: &dyn KeyValueStore) -> Result<Option<User>> {
    match store.get(keys::CURRENT_USER)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| TrackerError::Malformed {
                key: keys::CURRENT_USER.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub fn require_user(store: &dyn KeyValueStore) -> Result<User> {
    current_user(store)?.ok_or(TrackerError::AuthenticationRequired)
}

pub fn is_authenticated(store: &dyn KeyValueStore) -> Result<bool> {
    Ok(store
        .get(keys::ACCESS_TOKEN)?
        .is_some_and(|token| !token.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn demo_user() -> User {
        User {
            id: 1,
            username: "demo".to_string(),
            email: "demo@example.com".to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
        }
    }

    #[test]
    fn test_token_format() {
        let tokens = issue_tokens(42);
        assert!(tokens.access.starts_with("demo_token_42_"));
        assert!(tokens.refresh.starts_with("demo_refresh_42_"));
    }

    #[test]
    fn test_establish_writes_all_keys() {
        let store = MemoryStore::new();
        let tokens = establish(&store, &demo_user()).unwrap();

        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap(), Some(tokens.access));
        assert_eq!(store.get(keys::REFRESH_TOKEN).unwrap(), Some(tokens.refresh));
        assert_eq!(current_user(&store).unwrap(), Some(demo_user()));
        assert!(is_authenticated(&store).unwrap());
    }

    #[test]
    fn test_clear_removes_session() {
        let store = MemoryStore::new();
        establish(&store, &demo_user()).unwrap();
        clear(&store).unwrap();

        assert!(current_user(&store).unwrap().is_none());
        assert!(!is_authenticated(&store).unwrap());
        assert!(store.get(keys::REFRESH_TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_require_user_without_session() {
        let store = MemoryStore::new();
        let err = require_user(&store).unwrap_err();
        assert!(matches!(err, TrackerError::AuthenticationRequired));
    }
}
