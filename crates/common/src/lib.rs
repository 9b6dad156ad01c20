//! Shared building blocks for the admin panel crates: response types,
//! logging setup and startup directory checks.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn failure_body_serializes_with_success_false() {
        let body = types::Failure::new("boom");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
    }
}
