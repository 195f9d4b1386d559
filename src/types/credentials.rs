//! OAuth key material and scope-based credential selection.

use std::fmt;

/// A key and its matching secret.
///
/// The secret never appears in `Debug` output, so credential-bearing
/// structures can be logged without leaking it.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub key: String,
    pub secret: String,
}

impl KeyPair {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        KeyPair {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A consumer and token pair used to sign requests within one scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub consumer: KeyPair,
    pub token: KeyPair,
}

impl OAuthCredentials {
    pub fn new(consumer: KeyPair, token: KeyPair) -> Self {
        OAuthCredentials { consumer, token }
    }
}

/// Credentials keyed by scope URL, selected by longest matching prefix.
///
/// A request to `https://api.typepad.com/users/@self.json` is covered by a
/// scope of `https://api.typepad.com/`; when several scopes match, the most
/// specific one wins.
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    entries: Vec<(String, OAuthCredentials)>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register credentials for a scope, replacing any previous entry for
    /// the identical scope.
    pub fn insert(&mut self, scope: impl Into<String>, credentials: OAuthCredentials) {
        let scope = scope.into();
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == scope) {
            entry.1 = credentials;
        } else {
            self.entries.push((scope, credentials));
        }
    }

    /// Find the credentials whose scope is the longest prefix of `url`.
    pub fn lookup(&self, url: &str) -> Option<&OAuthCredentials> {
        self.entries
            .iter()
            .filter(|(scope, _)| url.starts_with(scope.as_str()))
            .max_by_key(|(scope, _)| scope.len())
            .map(|(_, credentials)| credentials)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(tag: &str) -> OAuthCredentials {
        OAuthCredentials::new(
            KeyPair::new(format!("consumer-{}", tag), "cs"),
            KeyPair::new(format!("token-{}", tag), "ts"),
        )
    }

    #[test]
    fn test_debug_redacts_secret() {
        let pair = KeyPair::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let out = format!("{:?}", pair);
        assert!(out.contains("dpf43f3p2l4k3l03"));
        assert!(!out.contains("kd94hf93k423kf44"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn test_lookup_longest_prefix_wins() {
        let mut store = CredentialStore::new();
        store.insert("https://api.typepad.com/", creds("wide"));
        store.insert("https://api.typepad.com/groups/", creds("narrow"));

        let found = store
            .lookup("https://api.typepad.com/groups/1.json")
            .unwrap();
        assert_eq!(found.consumer.key, "consumer-narrow");

        let found = store.lookup("https://api.typepad.com/users/1.json").unwrap();
        assert_eq!(found.consumer.key, "consumer-wide");
    }

    #[test]
    fn test_insert_replaces_same_scope() {
        let mut store = CredentialStore::new();
        store.insert("https://api.typepad.com/", creds("old"));
        store.insert("https://api.typepad.com/", creds("new"));

        let found = store.lookup("https://api.typepad.com/x").unwrap();
        assert_eq!(found.consumer.key, "consumer-new");
    }

    #[test]
    fn test_lookup_miss() {
        let mut store = CredentialStore::new();
        store.insert("https://api.typepad.com/", creds("a"));
        assert!(store.lookup("https://elsewhere.example.com/x").is_none());
    }

    #[test]
    fn test_clear() {
        let mut store = CredentialStore::new();
        store.insert("https://api.typepad.com/", creds("a"));
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
        assert!(store.lookup("https://api.typepad.com/x").is_none());
    }
}
