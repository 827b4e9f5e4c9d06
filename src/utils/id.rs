use uuid::Uuid;

/// Short opaque id, lowercase hex, `len` characters (max 32).
/// Used for user ids (15 chars) and the auto-generated pseudonym
/// `randname` (6 chars) that users show in place of their username.
pub fn generate_id(len: usize) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple[..len.min(simple.len())].to_string()
}
