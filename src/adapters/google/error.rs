use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::ports::service_error::{ResourceKind, ServiceError};

static SHEET_NAME_TAKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name "(.*?)" already exists"#).expect("collision pattern should compile")
});

/// Maps the JSON error body Google returns for a 4xx onto the service taxonomy.
pub(super) fn classify_body(body: &Value, kind: ResourceKind, id: &str) -> ServiceError {
    let error = &body["error"];
    let message = error["message"].as_str().unwrap_or_default();

    if let Some(captures) = SHEET_NAME_TAKEN.captures(message) {
        return ServiceError::name_collision(&captures[1]);
    }

    match (error["code"].as_u64(), error["status"].as_str()) {
        (Some(404), _) | (_, Some("NOT_FOUND")) => ServiceError::not_found(kind, id),
        _ if message.contains("already exists") => ServiceError::name_collision(id),
        _ if message.is_empty() => ServiceError::unclassified(body.to_string()),
        _ => ServiceError::unclassified(message),
    }
}

pub(super) fn classify_status(status: u16, kind: ResourceKind, id: &str) -> ServiceError {
    match status {
        404 => ServiceError::not_found(kind, id),
        _ => ServiceError::unclassified(format!("HTTP {}", status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_by_code() {
        let body = json!({"error": {"code": 404, "message": "File not found: abc.", "status": "NOT_FOUND"}});
        assert_eq!(
            classify_body(&body, ResourceKind::Folder, "abc"),
            ServiceError::not_found(ResourceKind::Folder, "abc")
        );
    }

    #[test]
    fn test_sheet_name_collision() {
        let body = json!({"error": {
            "code": 400,
            "message": "Invalid requests[0].duplicateSheet: A sheet with the name \"AST\" already exists. Please enter another name.",
            "status": "INVALID_ARGUMENT"
        }});
        assert_eq!(
            classify_body(&body, ResourceKind::Sheet, "7"),
            ServiceError::name_collision("AST")
        );
    }

    #[test]
    fn test_other_bad_request() {
        let body = json!({"error": {"code": 400, "message": "You can't remove all the sheets in a document."}});
        assert_eq!(
            classify_body(&body, ResourceKind::Sheet, "7"),
            ServiceError::unclassified("You can't remove all the sheets in a document.")
        );
    }

    #[test]
    fn test_body_without_message() {
        let body = json!({"unexpected": true});
        assert!(matches!(
            classify_body(&body, ResourceKind::File, "x"),
            ServiceError::Unclassified { .. }
        ));
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(404, ResourceKind::File, "x").is_not_found());
        assert_eq!(
            classify_status(500, ResourceKind::File, "x"),
            ServiceError::unclassified("HTTP 500")
        );
    }
}
