//! 事务邮件（HTTP API，Bearer 认证）

use std::time::Duration;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AppConfig, EmailConfig};
use crate::errors::{GraderError, Result};

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

pub struct EmailClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

static EMAIL_CLIENT: Lazy<Option<EmailClient>> =
    Lazy::new(|| EmailClient::from_config(&AppConfig::get().email));

impl EmailClient {
    /// 未配置 api_key 时返回 None
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        if config.api_key.trim().is_empty() {
            return None;
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .ok()?;
        Some(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }

    pub fn global() -> Option<&'static EmailClient> {
        EMAIL_CLIENT.as_ref()
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let payload = EmailPayload {
            from: &self.from,
            to: vec![to],
            subject,
            html,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GraderError::email(format!("Email request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GraderError::email(format!(
                "Email API responded with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 欢迎邮件（主题, HTML 正文）
pub fn welcome_email(
    system_name: &str,
    public_url: &str,
    full_name: &str,
    email: &str,
    password: &str,
) -> (String, String) {
    let subject = format!("Welcome to {system_name}");
    let html = format!(
        r#"<p>Hello {name},</p>
<p>An account has been created for you on {system}.</p>
<p>Email: <strong>{email}</strong><br>Temporary password: <strong>{password}</strong></p>
<p><a href="{url}">Sign in</a> and change your password after the first login.</p>"#,
        name = escape_html(full_name),
        system = escape_html(system_name),
        email = escape_html(email),
        password = escape_html(password),
        url = escape_html(public_url),
    );
    (subject, html)
}

/// 尽力发送欢迎邮件，返回是否发送成功
pub async fn send_welcome_email(full_name: &str, email: &str, password: &str) -> bool {
    let Some(client) = EmailClient::global() else {
        return false;
    };
    let config = AppConfig::get();
    let (subject, html) = welcome_email(
        &config.app.system_name,
        &config.app.public_url,
        full_name,
        email,
        password,
    );
    match client.send(email, &subject, &html).await {
        Ok(()) => {
            info!("Welcome email sent to {}", email);
            true
        }
        Err(e) => {
            warn!("Failed to send welcome email to {}: {}", email, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_key() {
        let config = EmailConfig {
            api_key: "  ".to_string(),
            endpoint: "https://mail.test/emails".to_string(),
            from: "AI Grader <no-reply@test>".to_string(),
        };
        assert!(EmailClient::from_config(&config).is_none());
    }

    #[test]
    fn test_welcome_email_escapes_input() {
        let (subject, html) = welcome_email(
            "AI Grader",
            "https://app.test",
            "<script>x</script>",
            "t@school.test",
            "Ab3&defgh",
        );
        assert_eq!(subject, "Welcome to AI Grader");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Ab3&amp;defgh"));
        assert!(html.contains("https://app.test"));
    }
}
