use uuid::Uuid;

/// Generates a new entity identifier.
///
/// Identifiers are UUIDv7 values rendered as 32 lowercase hex characters. The
/// leading bits carry the creation timestamp, so sorting ids lexically sorts
/// rows by creation time.
pub fn new_id() -> String {
    Uuid::now_v7().simple().to_string()
}
