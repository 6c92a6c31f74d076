use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::reset::errors::MailError;
use crate::domain::reset::ports::Mailer;

const POSTMARK_ENDPOINT: &str = "https://api.postmarkapp.com/email";
const MESSAGE_STREAM: &str = "password-reset";

/// Outbound mail adapter against the Postmark REST API.
///
/// One POST per message, single attempt; any non-success status is a
/// hard failure surfaced to the reset flow.
pub struct PostmarkMailer {
    client: Client,
    server_token: String,
    sender: String,
    app_base_url: String,
}

impl PostmarkMailer {
    /// # Errors
    /// * `MailError` - the HTTP client could not be constructed
    pub fn new(
        server_token: String,
        sender: String,
        app_base_url: String,
    ) -> Result<Self, MailError> {
        let client = Client::builder()
            .user_agent(concat!("cumulus-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MailError(format!("create HTTP client: {e}")))?;
        Ok(Self {
            client,
            server_token,
            sender,
            app_base_url,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "HtmlBody")]
    html_body: String,
    #[serde(rename = "MessageStream")]
    message_stream: &'a str,
}

/// Compose the reset email. The plaintext token only ever appears here,
/// inside the reset link.
fn compose_reset_email(app_base_url: &str, recipient: &str, token: &str) -> String {
    let username = recipient.split('@').next().unwrap_or(recipient);
    let reset_url = format!("{app_base_url}/password-reset/{token}");
    format!(
        "<p>Hello {username}!</p>\
         <p>A new password was requested for your account.</p>\
         <p>If this was not you, you can delete this message.</p>\
         <p>If it was, you can <a href=\"{reset_url}\">set a new password</a>. \
         The link stays valid for one hour.</p>"
    )
}

#[async_trait]
impl Mailer for PostmarkMailer {
    async fn send_reset_token(&self, recipient: &str, token: &str) -> Result<(), MailError> {
        let payload = EmailPayload {
            from: &self.sender,
            to: recipient,
            subject: "Password Reset",
            html_body: compose_reset_email(&self.app_base_url, recipient, token),
            message_stream: MESSAGE_STREAM,
        };

        let response = self
            .client
            .post(POSTMARK_ENDPOINT)
            .header("Accept", "application/json")
            .header("X-Postmark-Server-Token", &self.server_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError(format!("send email: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError(format!("send email: status {status}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_reset_email_embeds_link_and_greeting() {
        let body = compose_reset_email("https://app.example.com", "alice@example.com", "t0k3n");

        assert!(body.contains("Hello alice!"));
        assert!(body.contains("https://app.example.com/password-reset/t0k3n"));
    }

    #[test]
    fn test_email_payload_uses_postmark_field_names() {
        let payload = EmailPayload {
            from: "noreply@example.com",
            to: "alice@example.com",
            subject: "Password Reset",
            html_body: "<p>hi</p>".to_string(),
            message_stream: MESSAGE_STREAM,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["From"], "noreply@example.com");
        assert_eq!(json["HtmlBody"], "<p>hi</p>");
        assert_eq!(json["MessageStream"], "password-reset");
    }
}
