use uuid::Uuid;

/// Random identifier in UUID v4 textual form.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
