//! Worker identity and capability-tag validation.
//!
//! Pure functions used by the worker harness and the in-process transport.
//! The registry itself accepts any id it is handed: heartbeat ingestion has
//! no error conditions, so malformed ids are rejected where they are
//! minted, not where they are tracked.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a worker id.
const MAX_WORKER_ID_LEN: usize = 128;

/// Maximum number of capability tags a worker may advertise.
const MAX_CAPABILITIES: usize = 32;

/// Maximum length of a single capability tag.
const MAX_CAPABILITY_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a worker id.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_WORKER_ID_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters.
pub fn validate_worker_id(worker_id: &str) -> Result<(), CoreError> {
    if worker_id.is_empty() {
        return Err(CoreError::Validation(
            "Worker id must not be empty".to_string(),
        ));
    }
    if worker_id.len() > MAX_WORKER_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Worker id must not exceed {MAX_WORKER_ID_LEN} characters"
        )));
    }
    if !worker_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(
            "Worker id may only contain alphanumeric, hyphen, underscore, or dot characters"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate a set of capability tags.
///
/// Rules:
/// - At most `MAX_CAPABILITIES` tags.
/// - Each tag must not be empty and must not exceed `MAX_CAPABILITY_LEN`
///   characters.
/// - No duplicates.
pub fn validate_capabilities(capabilities: &[String]) -> Result<(), CoreError> {
    if capabilities.len() > MAX_CAPABILITIES {
        return Err(CoreError::Validation(format!(
            "A worker may advertise at most {MAX_CAPABILITIES} capabilities"
        )));
    }
    for (i, tag) in capabilities.iter().enumerate() {
        if tag.is_empty() {
            return Err(CoreError::Validation(format!(
                "Capability at index {i} must not be empty"
            )));
        }
        if tag.len() > MAX_CAPABILITY_LEN {
            return Err(CoreError::Validation(format!(
                "Capability at index {i} exceeds {MAX_CAPABILITY_LEN} characters"
            )));
        }
    }

    let mut seen = std::collections::HashSet::with_capacity(capabilities.len());
    for tag in capabilities {
        if !seen.insert(tag.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate capability: \"{tag}\""
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Capability matching
// ---------------------------------------------------------------------------

/// Whether `advertised` satisfies every tag in `required`.
///
/// An empty `required` set matches every worker.
pub fn satisfies_capabilities(advertised: &[String], required: &[String]) -> bool {
    required
        .iter()
        .all(|req| advertised.iter().any(|tag| tag == req))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- validate_worker_id ---------------------------------------------------

    #[test]
    fn valid_worker_id() {
        assert!(validate_worker_id("worker-01.prod").is_ok());
    }

    #[test]
    fn empty_worker_id_rejected() {
        assert!(validate_worker_id("").is_err());
    }

    #[test]
    fn worker_id_with_spaces_rejected() {
        assert!(validate_worker_id("worker 01").is_err());
    }

    #[test]
    fn worker_id_too_long_rejected() {
        let id = "a".repeat(MAX_WORKER_ID_LEN + 1);
        assert!(validate_worker_id(&id).is_err());
    }

    // -- validate_capabilities ------------------------------------------------

    #[test]
    fn valid_capabilities() {
        let tags = vec!["gpu".to_string(), "edge".to_string()];
        assert!(validate_capabilities(&tags).is_ok());
    }

    #[test]
    fn empty_capability_rejected() {
        let tags = vec!["gpu".to_string(), "".to_string()];
        assert!(validate_capabilities(&tags).is_err());
    }

    #[test]
    fn duplicate_capability_rejected() {
        let tags = vec!["gpu".to_string(), "gpu".to_string()];
        assert!(validate_capabilities(&tags).is_err());
    }

    #[test]
    fn too_many_capabilities_rejected() {
        let tags: Vec<String> = (0..MAX_CAPABILITIES + 1).map(|i| format!("cap-{i}")).collect();
        assert!(validate_capabilities(&tags).is_err());
    }

    // -- satisfies_capabilities -----------------------------------------------

    #[test]
    fn all_required_present() {
        let advertised = vec!["gpu".to_string(), "fast".to_string(), "edge".to_string()];
        let required = vec!["gpu".to_string(), "edge".to_string()];
        assert!(satisfies_capabilities(&advertised, &required));
    }

    #[test]
    fn missing_requirement_fails() {
        let advertised = vec!["gpu".to_string()];
        let required = vec!["cpu".to_string()];
        assert!(!satisfies_capabilities(&advertised, &required));
    }

    #[test]
    fn empty_requirements_match_anything() {
        assert!(satisfies_capabilities(&[], &[]));
        assert!(satisfies_capabilities(&["gpu".to_string()], &[]));
    }
}
