//! Credential Resolution
//!
//! Two-tier credential precedence: a per-course, per-user override always
//! shadows the site-wide default when present and non-empty; the two are
//! never merged. Absence of both is not an error here - callers treat it
//! as a precondition failure and must not start the pipeline.

use std::collections::HashMap;

use secrecy::SecretString;

use crate::config::LlmConfig;

/// Where a resolved credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScope {
    /// Per-course, per-user override
    Course,
    /// Site-wide default
    Site,
}

/// A stored credential record: the long-lived secret plus an optional
/// model override.
#[derive(Clone)]
pub struct StoredCredential {
    pub secret: String,
    pub model: Option<String>,
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("secret", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl StoredCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn is_usable(&self) -> bool {
        !self.secret.trim().is_empty()
    }
}

/// Resolved credentials handed to the provider.
pub struct Credentials {
    pub secret: SecretString,
    pub model: Option<String>,
    pub scope: CredentialScope,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("secret", &"[REDACTED]")
            .field("model", &self.model)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Credential store with course-level overrides and a site-wide fallback.
/// Read-only during a batch.
#[derive(Debug, Default)]
pub struct CredentialStore {
    course: HashMap<(u64, u64), StoredCredential>,
    site: Option<StoredCredential>,
}

impl CredentialStore {
    pub fn new(site: Option<StoredCredential>) -> Self {
        Self {
            course: HashMap::new(),
            site,
        }
    }

    /// Build a store whose site-wide tier comes from the loaded config.
    pub fn from_config(llm: &LlmConfig) -> Self {
        let site = llm.secret.as_ref().map(|secret| StoredCredential {
            secret: secret.clone(),
            model: llm.model.clone(),
        });
        Self::new(site)
    }

    /// Register a course-level override for one acting user.
    pub fn set_course_credential(
        &mut self,
        course_id: u64,
        user_id: u64,
        credential: StoredCredential,
    ) {
        self.course.insert((course_id, user_id), credential);
    }

    /// Resolve the first non-empty credential: course-level first, then
    /// site-wide. Returns `None` when neither exists.
    pub fn resolve(&self, course_id: u64, user_id: u64) -> Option<Credentials> {
        if let Some(stored) = self.course.get(&(course_id, user_id))
            && stored.is_usable()
        {
            return Some(Credentials {
                secret: SecretString::from(stored.secret.clone()),
                model: stored.model.clone(),
                scope: CredentialScope::Course,
            });
        }

        self.site
            .as_ref()
            .filter(|stored| stored.is_usable())
            .map(|stored| Credentials {
                secret: SecretString::from(stored.secret.clone()),
                model: stored.model.clone(),
                scope: CredentialScope::Site,
            })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_course_credential_shadows_site() {
        let mut store = CredentialStore::new(Some(StoredCredential::new("site-secret")));
        store.set_course_credential(
            7,
            42,
            StoredCredential::new("course-secret").with_model("GigaChat-Pro"),
        );

        let creds = store.resolve(7, 42).unwrap();
        assert_eq!(creds.secret.expose_secret(), "course-secret");
        assert_eq!(creds.model.as_deref(), Some("GigaChat-Pro"));
        assert_eq!(creds.scope, CredentialScope::Course);
    }

    #[test]
    fn test_site_fallback() {
        let store = CredentialStore::new(Some(StoredCredential::new("site-secret")));
        let creds = store.resolve(7, 42).unwrap();
        assert_eq!(creds.secret.expose_secret(), "site-secret");
        assert_eq!(creds.scope, CredentialScope::Site);
    }

    #[test]
    fn test_other_course_does_not_leak() {
        let mut store = CredentialStore::new(None);
        store.set_course_credential(7, 42, StoredCredential::new("course-secret"));
        assert!(store.resolve(8, 42).is_none());
        assert!(store.resolve(7, 43).is_none());
    }

    #[test]
    fn test_empty_course_credential_falls_through() {
        let mut store = CredentialStore::new(Some(StoredCredential::new("site-secret")));
        store.set_course_credential(7, 42, StoredCredential::new("   "));

        let creds = store.resolve(7, 42).unwrap();
        assert_eq!(creds.scope, CredentialScope::Site);
    }

    #[test]
    fn test_neither_configured_is_absent() {
        let store = CredentialStore::new(None);
        assert!(store.resolve(1, 1).is_none());

        let store = CredentialStore::new(Some(StoredCredential::new("")));
        assert!(store.resolve(1, 1).is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let store = CredentialStore::new(Some(StoredCredential::new("site-secret")));
        let creds = store.resolve(1, 1).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("site-secret"));
    }
}
