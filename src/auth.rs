/// Jenkins API token. Never printed by `Debug`.
pub struct Token(String);

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}

/// Basic-auth credentials for the Jenkins remote API (user + API token).
#[derive(Debug)]
pub struct Credentials {
    pub user: String,
    pub token: Token,
}

impl Credentials {
    /// Builds credentials only when both halves are present; Jenkins rejects a
    /// token without a user name.
    pub fn from_parts(user: Option<&str>, token: Option<&str>) -> Option<Self> {
        match (user, token) {
            (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => Some(Self {
                user: user.to_owned(),
                token: Token::from(token),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_redacts_value() {
        let token = Token::from("11a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7");
        let debug_output = format!("{token:?}");

        assert_eq!(debug_output, "<redacted>");
        assert!(!debug_output.contains("11a2b3"));
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let credentials = Credentials::from_parts(Some("ci-bot"), Some("secret-api-token")).unwrap();
        let debug_output = format!("{credentials:?}");

        assert!(debug_output.contains("ci-bot"));
        assert!(debug_output.contains("<redacted>"));
        assert!(!debug_output.contains("secret-api-token"));
    }

    #[test]
    fn test_credentials_require_user_and_token() {
        assert!(Credentials::from_parts(None, Some("token")).is_none());
        assert!(Credentials::from_parts(Some("user"), None).is_none());
        assert!(Credentials::from_parts(Some(""), Some("token")).is_none());
        assert!(Credentials::from_parts(None, None).is_none());
    }

    #[test]
    fn test_credentials_from_parts_keeps_values() {
        let credentials = Credentials::from_parts(Some("user"), Some("token")).unwrap();
        assert_eq!(credentials.user, "user");
        assert_eq!(credentials.token.as_str(), "token");
    }
}
