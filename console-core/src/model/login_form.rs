//! ``src/model/login_form.rs``
//! ============================================================================
//! # Login Form
//!
//! vCenter credential entry. Validation runs before any request leaves the
//! console: every field must be non-empty and the URL must parse as an
//! http(s) URL with a host.

use url::Url;

use crate::{AppError, model::lifecycle::Credentials};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Url,
    Username,
    Password,
}

impl LoginField {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Url => Self::Username,
            Self::Username => Self::Password,
            Self::Password => Self::Url,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Url => Self::Password,
            Self::Username => Self::Url,
            Self::Password => Self::Username,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Url => "vCenter URL",
            Self::Username => "Username",
            Self::Password => "Password",
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub url: String,
    pub username: String,
    password: String,
    pub focus: LoginField,
    /// Last validation message, cleared on edit.
    pub validation: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password_len", &self.password.chars().count())
            .field("focus", &self.focus)
            .finish()
    }
}

impl LoginForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill the URL, e.g. from a previous session.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    fn field_mut(&mut self, field: LoginField) -> &mut String {
        match field {
            LoginField::Url => &mut self.url,
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        let focus = self.focus;
        self.field_mut(focus).push(ch);
        self.validation = None;
    }

    pub fn delete_char(&mut self) -> bool {
        let focus = self.focus;
        let removed = self.field_mut(focus).pop().is_some();
        if removed {
            self.validation = None;
        }
        removed
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Field text as rendered; the password is masked.
    #[must_use]
    pub fn display_value(&self, field: LoginField) -> String {
        match field {
            LoginField::Url => self.url.clone(),
            LoginField::Username => self.username.clone(),
            LoginField::Password => "•".repeat(self.password.chars().count()),
        }
    }

    /// Drop the password once it has been handed to a request.
    pub fn clear_password(&mut self) {
        self.password.clear();
    }

    /// Validate and build credentials, keeping the failure message for display.
    pub fn submit(&mut self) -> Result<Credentials, AppError> {
        let result = self.to_credentials();
        self.validation = result.as_ref().err().map(ToString::to_string);
        result
    }

    pub fn to_credentials(&self) -> Result<Credentials, AppError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(AppError::invalid_credentials("url", "must not be empty"));
        }

        let parsed = Url::parse(url)
            .map_err(|e| AppError::invalid_credentials("url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::invalid_credentials(
                "url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(AppError::invalid_credentials("url", "missing host"));
        }

        let username = self.username.trim();
        if username.is_empty() {
            return Err(AppError::invalid_credentials("username", "must not be empty"));
        }
        if self.password.is_empty() {
            return Err(AppError::invalid_credentials("password", "must not be empty"));
        }

        Ok(Credentials {
            url: url.to_string(),
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(url: &str) -> LoginForm {
        let mut form = LoginForm::with_url(url);
        form.username = "administrator@vsphere.local".into();
        form.focus = LoginField::Password;
        for ch in "secret".chars() {
            form.insert_char(ch);
        }
        form
    }

    #[test]
    fn valid_form_builds_credentials() {
        let creds = filled(" https://vcenter.example.com/sdk ").to_credentials().unwrap();
        assert_eq!(creds.url, "https://vcenter.example.com/sdk");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn rejects_bad_urls() {
        for url in ["", "not a url", "ftp://vcenter.example.com", "file:///etc/passwd"] {
            let err = filled(url).to_credentials().unwrap_err();
            assert!(
                matches!(err, AppError::InvalidCredentials { field: "url", .. }),
                "{url:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn rejects_empty_username_and_password() {
        let mut form = filled("https://vc.local");
        form.username = "   ".into();
        assert!(matches!(
            form.to_credentials(),
            Err(AppError::InvalidCredentials { field: "username", .. })
        ));

        let mut form = filled("https://vc.local");
        form.clear_password();
        assert!(matches!(
            form.submit(),
            Err(AppError::InvalidCredentials { field: "password", .. })
        ));
        assert!(form.validation.is_some());
    }

    #[test]
    fn password_is_masked_and_not_debug_printed() {
        let form = filled("https://vc.local");
        assert_eq!(form.display_value(LoginField::Password), "••••••");
        assert!(!format!("{form:?}").contains("secret"));
    }

    #[test]
    fn focus_cycles_through_fields() {
        let mut form = LoginForm::new();
        form.focus_next();
        form.focus_next();
        assert_eq!(form.focus, LoginField::Password);
        form.focus_next();
        assert_eq!(form.focus, LoginField::Url);
        form.focus_prev();
        assert_eq!(form.focus, LoginField::Password);
    }
}
