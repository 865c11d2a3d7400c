// Semantic matcher API key lookup
//
// Keys come from:
// 1. System keychain (with the `keychain` feature)
// 2. Environment variables
//
// Keys are never read from the match config.

use std::env;

use rollmatch_recon::config::SemanticProvider;

/// Service name for keychain storage
#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "rollmatch";

/// Checked first for every provider.
pub const PRIMARY_ENV_VAR: &str = "ROLLMATCH_OPENAI_KEY";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Keychain,
    Environment(&'static str),
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment(name) => *name,
            KeySource::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Environment variables consulted for a provider, in order.
pub fn env_var_names(provider: SemanticProvider) -> [&'static str; 2] {
    match provider {
        SemanticProvider::OpenAI => [PRIMARY_ENV_VAR, "OPENAI_API_KEY"],
        SemanticProvider::Azure => [PRIMARY_ENV_VAR, "AZURE_OPENAI_API_KEY"],
    }
}

#[cfg(feature = "keychain")]
fn keychain_account(provider: SemanticProvider) -> String {
    format!("semantic/{}", provider.name())
}

/// Resolve the API key for `provider`: keychain first (if enabled),
/// then environment variables.
pub fn get_api_key(provider: SemanticProvider) -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider)) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    lookup_env(provider, |name| env::var(name).ok())
}

/// Environment lookup with an injectable reader. Empty values are skipped.
pub fn lookup_env(provider: SemanticProvider, read: impl Fn(&str) -> Option<String>) -> KeyLookup {
    for name in env_var_names(provider) {
        if let Some(key) = read(name).filter(|k| !k.trim().is_empty()) {
            return KeyLookup {
                key: Some(key),
                source: KeySource::Environment(name),
            };
        }
    }
    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Hint shown when no key is found.
pub fn missing_key_hint(provider: SemanticProvider) -> String {
    let [primary, conventional] = env_var_names(provider);
    format!("set {primary} (or {conventional}) to your {} API key", provider.name())
}
