use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
    #[error("invalid route permission for {method} {route}: {reason}")]
    InvalidRoute {
        method: String,
        route: String,
        reason: String,
    },
    #[error("route registered twice: {method} {route}")]
    DuplicateRoute { method: String, route: String },
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::InvalidPermission("bad".to_string()),
            AuthzError::InvalidRoute {
                method: "GET".to_string(),
                route: "/v1/applications".to_string(),
                reason: "empty".to_string(),
            },
            AuthzError::DuplicateRoute {
                method: "GET".to_string(),
                route: "/v1/applications".to_string(),
            },
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }
}
