//! Deployment constants and the origin lookup.

/// Environment variable naming the deployment an instance runs in.
pub const ORIGIN_ENV_VAR: &str = "SNAP_NAME";

/// Origin used when [`ORIGIN_ENV_VAR`] is unset or empty.
pub const DEFAULT_ORIGIN: &str = "unknownOrigin";

/// Name of an indexed slot that has no runtime name assigned.
pub const UNKNOWN_UNIT_NAME: &str = "unknown";

/// Prefix of the buffered sink name of an indexed slot.
pub const UNKNOWN_BUFFERED_UNIT_NAME: &str = "unknown buffered trace unit";

/// Longest unit name in bytes; longer names are truncated.
pub const MAXIMUM_LENGTH_UNIT_NAME: usize = 64;

/// Longest entity override in bytes; longer entities are truncated.
pub const MAXIMUM_LENGTH_ENTITY: usize = 256;

/// Reads the origin identifier from the process environment.
pub fn origin_from_env() -> String {
    match std::env::var(ORIGIN_ENV_VAR) {
        Ok(origin) if !origin.is_empty() => origin,
        _ => DEFAULT_ORIGIN.to_string(),
    }
}

fn truncate_on_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Cuts `name` down to [`MAXIMUM_LENGTH_UNIT_NAME`] bytes on a char boundary.
pub(crate) fn truncate_unit_name(name: &str) -> String {
    truncate_on_char_boundary(name, MAXIMUM_LENGTH_UNIT_NAME).to_string()
}

/// Cuts `entity` down to [`MAXIMUM_LENGTH_ENTITY`] bytes without allocating.
pub(crate) fn truncate_entity(entity: &str) -> &str {
    truncate_on_char_boundary(entity, MAXIMUM_LENGTH_ENTITY)
}
