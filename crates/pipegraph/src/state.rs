//! Reversible encoding of editor state into a URL fragment.
//!
//! The fragment has the form `config=<b64>[&distro=<b64>][&distroVersion=<b64>]`
//! where every value is URL-safe base64 without padding, so any text
//! (newlines, `#`, `&`, `:` and other YAML punctuation included) survives the
//! round trip.

use std::string::FromUtf8Error;

use base64::{DecodeError, Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

const CONFIG_KEY: &str = "config";
const DISTRO_KEY: &str = "distro";
const DISTRO_VERSION_KEY: &str = "distroVersion";

/// Errors raised while decoding a fragment.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("missing `config` parameter")]
    MissingConfig,

    #[error("malformed parameter `{0}`")]
    MalformedParameter(String),

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("duplicate parameter `{0}`")]
    DuplicateParameter(String),

    #[error("invalid base64 in `{key}`: {source}")]
    Base64 {
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("`{key}` is not valid UTF-8: {source}")]
    Utf8 {
        key: String,
        #[source]
        source: FromUtf8Error,
    },
}

/// Configuration text plus the selected distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub config: String,
    pub distro: Option<String>,
    pub distro_version: Option<String>,
}

impl EditorState {
    pub fn new(config: impl Into<String>) -> Self {
        Self {
            config: config.into(),
            ..Default::default()
        }
    }

    pub fn with_distro(mut self, distro: impl Into<String>, version: Option<String>) -> Self {
        self.distro = Some(distro.into());
        self.distro_version = version;
        self
    }

    /// Encodes the state as a fragment string.
    ///
    /// ```
    /// # use pipegraph::state::EditorState;
    /// let state = EditorState::new("receivers: {}\n");
    /// let fragment = state.encode();
    /// assert!(fragment.starts_with("config="));
    /// assert_eq!(EditorState::decode(&fragment).unwrap(), state);
    /// ```
    pub fn encode(&self) -> String {
        let mut params = vec![param(CONFIG_KEY, &self.config)];
        if let Some(distro) = &self.distro {
            params.push(param(DISTRO_KEY, distro));
        }
        if let Some(version) = &self.distro_version {
            params.push(param(DISTRO_VERSION_KEY, version));
        }
        params.join("&")
    }

    /// Decodes a fragment produced by [`EditorState::encode`].
    ///
    /// A leading `#` is ignored. Parameters may come in any order.
    pub fn decode(fragment: &str) -> Result<Self, StateError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let mut config = None;
        let mut distro = None;
        let mut distro_version = None;

        for pair in fragment.split('&').filter(|p| !p.is_empty()) {
            let (key, encoded) = pair
                .split_once('=')
                .ok_or_else(|| StateError::MalformedParameter(pair.to_string()))?;
            let slot = match key {
                CONFIG_KEY => &mut config,
                DISTRO_KEY => &mut distro,
                DISTRO_VERSION_KEY => &mut distro_version,
                _ => return Err(StateError::UnknownParameter(key.to_string())),
            };
            if slot.is_some() {
                return Err(StateError::DuplicateParameter(key.to_string()));
            }
            *slot = Some(decode_value(key, encoded)?);
        }

        Ok(Self {
            config: config.ok_or(StateError::MissingConfig)?,
            distro,
            distro_version,
        })
    }
}

fn param(key: &str, value: &str) -> String {
    format!("{key}={}", URL_SAFE_NO_PAD.encode(value))
}

fn decode_value(key: &str, encoded: &str) -> Result<String, StateError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|source| StateError::Base64 {
            key: key.to_string(),
            source,
        })?;
    String::from_utf8(bytes).map_err(|source| StateError::Utf8 {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let state = EditorState::new("a").with_distro("otelcol", Some("0.1".to_string()));
        let fragment = state.encode();
        let keys: Vec<_> = fragment
            .split('&')
            .filter_map(|p| p.split_once('=').map(|(k, _)| k))
            .collect();
        assert_eq!(keys, vec!["config", "distro", "distroVersion"]);
        assert!(!fragment.contains('+') && !fragment.contains('/'));
    }

    #[test]
    fn test_empty_config_round_trips() {
        let state = EditorState::new("");
        assert_eq!(state.encode(), "config=");
        assert_eq!(EditorState::decode("config=").unwrap(), state);
    }

    #[test]
    fn test_decode_accepts_hash_and_any_order() {
        let state = EditorState::new("x: 1").with_distro("contrib", None);
        let fragment = state.encode();
        let (config, distro) = fragment.split_once('&').unwrap();
        let reordered = format!("#{distro}&{config}");
        assert_eq!(EditorState::decode(&reordered).unwrap(), state);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            EditorState::decode("distro=YQ"),
            Err(StateError::MissingConfig)
        ));
        assert!(matches!(
            EditorState::decode("config"),
            Err(StateError::MalformedParameter(_))
        ));
        assert!(matches!(
            EditorState::decode("config=YQ&other=YQ"),
            Err(StateError::UnknownParameter(_))
        ));
        assert!(matches!(
            EditorState::decode("config=YQ&config=YQ"),
            Err(StateError::DuplicateParameter(_))
        ));
        assert!(matches!(
            EditorState::decode("config=***"),
            Err(StateError::Base64 { .. })
        ));
        // 0xFF is not UTF-8
        assert!(matches!(
            EditorState::decode("config=_w"),
            Err(StateError::Utf8 { .. })
        ));
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // =====================================================================
    // Strategies
    // =====================================================================

    /// Configuration-like text heavy in YAML punctuation.
    fn config_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            any::<String>(),
            "[a-z:#&=\\-\\[\\]{}|>'\"\\n\\t ,.*!%@`?/+]{0,200}",
        ]
    }

    fn state_strategy() -> impl Strategy<Value = EditorState> {
        (
            config_strategy(),
            proptest::option::of(any::<String>()),
            proptest::option::of("[0-9.]{1,8}"),
        )
            .prop_map(|(config, distro, distro_version)| EditorState {
                config,
                distro,
                distro_version,
            })
    }

    // =====================================================================
    // Property Test Functions
    // =====================================================================

    fn check_round_trip(state: &EditorState) -> Result<(), TestCaseError> {
        let fragment = state.encode();
        prop_assert!(!fragment.contains('#'));
        let decoded = EditorState::decode(&fragment)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert_eq!(&decoded, state);
        Ok(())
    }

    // =====================================================================
    // Proptest Wrappers
    // =====================================================================

    proptest! {
        #[test]
        fn round_trip(state in state_strategy()) {
            check_round_trip(&state)?;
        }
    }
}
