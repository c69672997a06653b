//! Constants used throughout the Cutis core crate.
//!
//! Thresholds, user-facing advice strings, storage layout names and search tuning live here so
//! the classification flow and its collaborators agree on them.

/// Confidence at or above which a classification is filed under its own label.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.9;

/// Confidence below which a classification is treated as unreliable.
pub const MODERATE_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Label substituted for low-confidence predictions.
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

pub const HIGH_CONFIDENCE_ADVICE: &str =
    "For the best outcome we recommend to go to the nearest dermatologist.";

pub const MODERATE_CONFIDENCE_ADVICE: &str = "The system is moderately confident about this result. We advise booking an appointment with a dermatologist for an in-person evaluation.";

pub const LOW_CONFIDENCE_DISCLAIMER: &str = "Sorry, but our system detected that this image has a low classification confidence. This means the result might not be accurate, so we cannot provide a specific recommendation. For your safety, we recommend consulting a licensed dermatologist. You can use the Cutis 'Search Derma' feature to find one near you.";

pub const NO_IMAGE_MESSAGE: &str = "No image file was uploaded";

/// Used when the classifier rejects an image without explaining why.
pub const CLASSIFIER_FAILURE_MESSAGE: &str = "Image classification failed";

pub const MESSAGE_REQUIRED: &str = "Message is required";

/// Default directory for all persisted data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "cutis_data";

/// Directory name for stored images.
pub const IMAGES_DIR_NAME: &str = "images";

/// Directory name for medical history records.
pub const HISTORY_DIR_NAME: &str = "history";

/// Directory name for conversations.
pub const CONVERSATIONS_DIR_NAME: &str = "conversations";

/// Filename for the condition catalog inside the data directory.
pub const CONDITIONS_FILENAME: &str = "conditions.yaml";

pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3002";
pub const DEFAULT_LOCATION: &str = "Philippines";
pub const DEFAULT_SIGNED_URL_TTL_SECS: i64 = 3_600;
pub const DEFAULT_SEARCH_CACHE_TTL_SECS: i64 = 86_400;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";

/// Country and language codes sent with every search.
pub const SEARCH_COUNTRY: &str = "ph";
pub const SEARCH_LANGUAGE: &str = "en";

pub const MAX_SPECIALISTS: usize = 3;
pub const MAX_CLINICS: usize = 5;
/// Cached lookups kept per kind (specialists, clinics).
pub const MAX_CACHED_SEARCHES: usize = 1024;

/// Search hits mentioning any of these are not medical providers.
pub const EXCLUDED_TERMS: [&str; 16] = [
    "wikipedia",
    "blog",
    "article",
    "news",
    "review site",
    "forum",
    "product",
    "pharmacy",
    "drugstore",
    "law",
    "lawyer",
    "attorney",
    "restaurant",
    "hotel",
    "mall",
    "shopping",
];

/// Audit module names.
pub const AUDIT_MODULE_AI: &str = "AI";
pub const AUDIT_MODULE_MEDICAL_RECORDS: &str = "Medical Records";
