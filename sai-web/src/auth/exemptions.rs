//! Route exemption policy: which paths skip token evaluation entirely

/// Login endpoint; always reachable without a token
pub const LOGIN_PATH: &str = "/api/v1/auth/login";
/// Registration endpoint; always reachable without a token
pub const REGISTER_PATH: &str = "/api/v1/auth/register";

/// Paths exempt from the request gate.
///
/// `exact` entries match one path; `prefixes` match the path itself and
/// everything below it on a segment boundary (`/api-docs` covers
/// `/api-docs/openapi.json` but not `/api-docsx`). Trailing slashes are
/// ignored on both sides.
#[derive(Debug, Clone)]
pub struct RouteExemptions {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl Default for RouteExemptions {
    fn default() -> Self {
        Self::empty()
            .exact(LOGIN_PATH)
            .exact(REGISTER_PATH)
            .exact("/swagger-ui.html")
            .prefix("/api-docs")
            .prefix("/swagger-ui")
    }
}

impl RouteExemptions {
    /// Policy with no exemptions
    pub fn empty() -> Self {
        Self {
            exact: Vec::new(),
            prefixes: Vec::new(),
        }
    }

    pub fn exact(mut self, path: &str) -> Self {
        self.exact.push(normalize(path).to_string());
        self
    }

    pub fn prefix(mut self, path: &str) -> Self {
        self.prefixes.push(normalize(path).to_string());
        self
    }

    /// Whether `path` bypasses token evaluation
    pub fn is_exempt(&self, path: &str) -> bool {
        let path = normalize(path);

        self.exact.iter().any(|exact| exact == path)
            || self.prefixes.iter().any(|prefix| {
                path.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exemptions() {
        let policy = RouteExemptions::default();

        assert!(policy.is_exempt("/api/v1/auth/login"));
        assert!(policy.is_exempt("/api/v1/auth/register"));
        assert!(policy.is_exempt("/swagger-ui.html"));
        assert!(policy.is_exempt("/swagger-ui"));
        assert!(policy.is_exempt("/swagger-ui/index.html"));
        assert!(policy.is_exempt("/api-docs/openapi.json"));
    }

    #[test]
    fn test_protected_paths_are_not_exempt() {
        let policy = RouteExemptions::default();

        assert!(!policy.is_exempt("/api/v1/appointments"));
        assert!(!policy.is_exempt("/api/v1/auth/me"));
        assert!(!policy.is_exempt("/api/v1/auth"));
        assert!(!policy.is_exempt("/"));
    }

    #[test]
    fn test_prefix_respects_segment_boundary() {
        let policy = RouteExemptions::default();

        assert!(!policy.is_exempt("/api-docsx"));
        assert!(!policy.is_exempt("/swagger-uiadmin/secret"));
        assert!(!policy.is_exempt("/api/v1/auth/login-history"));
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let policy = RouteExemptions::default();

        assert!(policy.is_exempt("/api/v1/auth/login/"));
        assert!(policy.is_exempt("/api-docs/"));
        assert!(!policy.is_exempt("/api/v1/appointments/"));
    }

    #[test]
    fn test_custom_policy() {
        let policy = RouteExemptions::empty().exact("/status/").prefix("/public");

        assert!(policy.is_exempt("/status"));
        assert!(policy.is_exempt("/public/logo.png"));
        assert!(!policy.is_exempt("/api/v1/auth/login"));
    }
}
