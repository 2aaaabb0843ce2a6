/**
 * Email Templates
 *
 * Each template is an HTML body with `{{name}}` placeholders. Values are
 * HTML-escaped before substitution.
 *
 * | Template | Placeholders |
 * |---|---|
 * | `otp` | `username`, `code`, `expiry_minutes`, `year` |
 * | `welcome` | `username`, `year` |
 * | `reset_password` | `username`, `link`, `expiry_minutes`, `year` |
 */

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};

use crate::backend::email::OutgoingEmail;
use crate::shared::strings::{escape_html, render_placeholders};

const OTP_HTML: &str = r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #1f2933;">
  <h2>Verify your account</h2>
  <p>Hi {{username}},</p>
  <p>Use the code below to verify your email address:</p>
  <p style="font-size: 28px; letter-spacing: 6px; font-weight: bold;">{{code}}</p>
  <p>The code expires in {{expiry_minutes}} minutes. If you did not create an account, ignore this email.</p>
  <p style="color: #7b8794; font-size: 12px;">&copy; {{year}} TourFleet</p>
</body>
</html>"#;

const WELCOME_HTML: &str = r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #1f2933;">
  <h2>Welcome aboard, {{username}}!</h2>
  <p>Your account is verified. You can now sign in, create an organization or join one with its code.</p>
  <p style="color: #7b8794; font-size: 12px;">&copy; {{year}} TourFleet</p>
</body>
</html>"#;

const RESET_PASSWORD_HTML: &str = r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #1f2933;">
  <h2>Reset your password</h2>
  <p>Hi {{username}},</p>
  <p>We received a request to reset your password. Open the link below to choose a new one:</p>
  <p><a href="{{link}}">{{link}}</a></p>
  <p>The link expires in {{expiry_minutes}} minutes. If you did not ask for this, ignore this email.</p>
  <p style="color: #7b8794; font-size: 12px;">&copy; {{year}} TourFleet</p>
</body>
</html>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Otp,
    Welcome,
    ResetPassword,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Otp => "otp",
            Self::Welcome => "welcome",
            Self::ResetPassword => "reset_password",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Self::Otp => "Your verification code",
            Self::Welcome => "Welcome to TourFleet",
            Self::ResetPassword => "Reset your password",
        }
    }

    fn body(&self) -> &'static str {
        match self {
            Self::Otp => OTP_HTML,
            Self::Welcome => WELCOME_HTML,
            Self::ResetPassword => RESET_PASSWORD_HTML,
        }
    }

    pub fn render(&self, to: &str, context: &TemplateContext) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: self.subject().to_string(),
            html: render_placeholders(self.body(), &context.values),
        }
    }
}

/// Placeholder values; `year` is filled in automatically
#[derive(Debug, Clone)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new(username: &str) -> Self {
        let mut values = BTreeMap::new();
        values.insert("username".to_string(), escape_html(username));
        values.insert("year".to_string(), Utc::now().year().to_string());
        Self { values }
    }

    pub fn with(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        self.values.insert(key.to_string(), escape_html(&value.to_string()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_template_renders_all_placeholders() {
        let context = TemplateContext::new("alice")
            .with("code", "12345678")
            .with("expiry_minutes", 5);
        let email = Template::Otp.render("alice@example.com", &context);
        assert_eq!(email.to, "alice@example.com");
        assert_eq!(email.subject, "Your verification code");
        assert!(email.html.contains("Hi alice,"));
        assert!(email.html.contains("12345678"));
        assert!(email.html.contains("expires in 5 minutes"));
        assert!(!email.html.contains("{{"));
    }

    #[test]
    fn test_values_are_escaped() {
        let context = TemplateContext::new("<script>");
        let email = Template::Welcome.render("a@x.com", &context);
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn test_reset_link_is_rendered() {
        let context = TemplateContext::new("bob")
            .with("link", "http://localhost:3000/reset-password?token=abc")
            .with("expiry_minutes", 60);
        let email = Template::ResetPassword.render("bob@example.com", &context);
        assert!(email.html.contains("href=\"http://localhost:3000/reset-password?token=abc\""));
        assert_eq!(Template::ResetPassword.name(), "reset_password");
    }
}
