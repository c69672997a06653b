//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. The
//! core never reads process-wide environment variables itself: binaries hand
//! [`CoreConfig::from_lookup`] a lookup function (normally `std::env::var`) so tests can drive it
//! from a plain map.

use crate::constants::{
    CONDITIONS_FILENAME, CONVERSATIONS_DIR_NAME, DEFAULT_CHAT_ENDPOINT, DEFAULT_CHAT_MODEL,
    DEFAULT_DATA_DIR, DEFAULT_LOCATION, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PUBLIC_URL,
    DEFAULT_SEARCH_CACHE_TTL_SECS, DEFAULT_SIGNED_URL_TTL_SECS, HIGH_CONFIDENCE_THRESHOLD,
    HISTORY_DIR_NAME, IMAGES_DIR_NAME, MODERATE_CONFIDENCE_THRESHOLD,
};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Confidence cut-offs shared by relabelling, folder selection and the recommendation policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfidenceThresholds {
    /// At or above: filed under its own label, condition recommendation used.
    pub high: f64,
    /// Below: relabelled as unclassified, fixed disclaimer used.
    pub moderate: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: HIGH_CONFIDENCE_THRESHOLD,
            moderate: MODERATE_CONFIDENCE_THRESHOLD,
        }
    }
}

impl ConfidenceThresholds {
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] unless `0 <= moderate <= high <= 1`.
    pub fn new(high: f64, moderate: f64) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&high) || !(0.0..=1.0).contains(&moderate) || moderate > high {
            return Err(CoreError::Config(format!(
                "confidence thresholds must satisfy 0 <= moderate <= high <= 1 (high={}, moderate={})",
                high, moderate
            )));
        }
        Ok(Self { high, moderate })
    }
}

/// Classifier endpoint settings.
#[derive(Clone, Debug)]
pub struct ClassifierSettings {
    pub endpoint: String,
    pub api_key: String,
}

/// Search provider settings.
#[derive(Clone, Debug)]
pub struct SearchSettings {
    pub endpoint: String,
    pub api_key: String,
    pub default_location: String,
    pub cache_ttl_secs: i64,
}

/// Conversation model settings. Absent when no model key is configured.
#[derive(Clone, Debug)]
pub struct ChatSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

/// Core configuration resolved at startup.
#[derive(Clone)]
pub struct CoreConfig {
    data_dir: PathBuf,
    public_url: String,
    url_signing_key: Vec<u8>,
    signed_url_ttl_secs: i64,
    conditions_file: PathBuf,
    max_upload_bytes: usize,
    thresholds: ConfidenceThresholds,
    classifier: ClassifierSettings,
    search: SearchSettings,
    chat: Option<ChatSettings>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("data_dir", &self.data_dir)
            .field("public_url", &self.public_url)
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("conditions_file", &self.conditions_file)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("thresholds", &self.thresholds)
            .field("classifier_endpoint", &self.classifier.endpoint)
            .field("search_endpoint", &self.search.endpoint)
            .field("chat_enabled", &self.chat.is_some())
            .finish_non_exhaustive()
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig` with default TTLs, thresholds and catalog location.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the signing key is empty.
    pub fn new(
        data_dir: PathBuf,
        public_url: String,
        url_signing_key: Vec<u8>,
        classifier: ClassifierSettings,
        search: SearchSettings,
    ) -> CoreResult<Self> {
        if url_signing_key.is_empty() {
            return Err(CoreError::Config("URL signing key cannot be empty".into()));
        }
        if search.cache_ttl_secs <= 0 {
            return Err(CoreError::Config(
                "search cache TTL must be positive".into(),
            ));
        }

        Ok(Self {
            conditions_file: data_dir.join(CONDITIONS_FILENAME),
            data_dir,
            public_url,
            url_signing_key,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            thresholds: ConfidenceThresholds::default(),
            classifier,
            search,
            chat: None,
        })
    }

    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `ttl_secs` is not positive.
    pub fn with_signed_url_ttl(mut self, ttl_secs: i64) -> CoreResult<Self> {
        if ttl_secs <= 0 {
            return Err(CoreError::Config("signed URL TTL must be positive".into()));
        }
        self.signed_url_ttl_secs = ttl_secs;
        Ok(self)
    }

    pub fn with_conditions_file(mut self, path: PathBuf) -> Self {
        self.conditions_file = path;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_chat(mut self, chat: ChatSettings) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Build configuration from a key lookup, typically `|k| std::env::var(k).ok()`.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `CUTIS_URL_SIGNING_KEY` is missing or a numeric
    /// variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = PathBuf::from(get("CUTIS_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let public_url = get("CUTIS_PUBLIC_URL").unwrap_or_else(|| DEFAULT_PUBLIC_URL.into());
        let signing_key = get("CUTIS_URL_SIGNING_KEY")
            .ok_or_else(|| CoreError::Config("CUTIS_URL_SIGNING_KEY must be set".into()))?;

        let classifier = ClassifierSettings {
            endpoint: get("AI_ORIGIN").unwrap_or_default(),
            api_key: get("AI_API_KEY").unwrap_or_default(),
        };
        let search = SearchSettings {
            endpoint: get("SERPER_URL").unwrap_or_default(),
            api_key: get("SERPER_API_KEY").unwrap_or_default(),
            default_location: get("CUTIS_DEFAULT_LOCATION")
                .unwrap_or_else(|| DEFAULT_LOCATION.into()),
            cache_ttl_secs: parse_number(
                "CUTIS_SEARCH_CACHE_TTL_SECS",
                get("CUTIS_SEARCH_CACHE_TTL_SECS"),
                DEFAULT_SEARCH_CACHE_TTL_SECS,
            )?,
        };

        let mut config = Self::new(
            data_dir,
            public_url,
            signing_key.into_bytes(),
            classifier,
            search,
        )?
        .with_signed_url_ttl(parse_number(
            "CUTIS_SIGNED_URL_TTL_SECS",
            get("CUTIS_SIGNED_URL_TTL_SECS"),
            DEFAULT_SIGNED_URL_TTL_SECS,
        )?)?
        .with_max_upload_bytes(parse_number(
            "CUTIS_MAX_UPLOAD_BYTES",
            get("CUTIS_MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?);

        if let Some(path) = get("CUTIS_CONDITIONS_FILE") {
            config = config.with_conditions_file(PathBuf::from(path));
        }
        if let Some(api_key) = get("GEMINI_API_KEY") {
            config = config.with_chat(ChatSettings {
                endpoint: get("GEMINI_ENDPOINT").unwrap_or_else(|| DEFAULT_CHAT_ENDPOINT.into()),
                api_key,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
            });
        }

        Ok(config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join(IMAGES_DIR_NAME)
    }

    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join(HISTORY_DIR_NAME)
    }

    pub fn conversations_dir(&self) -> PathBuf {
        self.data_dir.join(CONVERSATIONS_DIR_NAME)
    }

    pub fn conditions_file(&self) -> &Path {
        &self.conditions_file
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub fn url_signing_key(&self) -> &[u8] {
        &self.url_signing_key
    }

    pub fn signed_url_ttl_secs(&self) -> i64 {
        self.signed_url_ttl_secs
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn thresholds(&self) -> ConfidenceThresholds {
        self.thresholds
    }

    pub fn classifier(&self) -> &ClassifierSettings {
        &self.classifier
    }

    pub fn search(&self) -> &SearchSettings {
        &self.search
    }

    pub fn chat(&self) -> Option<&ChatSettings> {
        self.chat.as_ref()
    }
}

/// Parse an optional numeric setting, falling back to `default` when unset.
fn parse_number<T>(name: &str, value: Option<String>, default: T) -> CoreResult<T>
where
    T: std::str::FromStr,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| CoreError::Config(format!("{} must be a number, got '{}'", name, raw))),
    }
}
