//! reqwest-backed delivery channels: Twilio WhatsApp and the Gmail REST API.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::info;

use crate::{EmailSender, NotifyError, WhatsAppSender};

/// WhatsApp sender driving Twilio's Messages endpoint.
pub struct TwilioWhatsApp {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    /// WhatsApp-enabled sender number, e.g. `+14155238886`.
    from_number: String,
}

#[derive(Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

impl TwilioWhatsApp {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self::with_base_url("https://api.twilio.com".into(), account_sid, auth_token, from_number)
    }

    /// Override the API host (tests point this at a local server).
    pub fn with_base_url(
        base_url: String,
        account_sid: String,
        auth_token: String,
        from_number: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
            from_number,
        }
    }
}

#[async_trait]
impl WhatsAppSender for TwilioWhatsApp {
    async fn send_whatsapp(&self, to: &str, body: &str) -> Result<String, NotifyError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let form = [
            ("Body", body.to_string()),
            ("From", format!("whatsapp:{}", self.from_number)),
            ("To", format!("whatsapp:{to}")),
        ];

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let message: TwilioMessageResponse = resp
            .json()
            .await
            .map_err(|e| NotifyError::Other(format!("malformed Twilio response: {e}")))?;
        info!(sid = %message.sid, "whatsapp message sent");
        Ok(message.sid)
    }
}

/// Email sender driving the Gmail REST API with a bearer token.
pub struct GmailSender {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    sender: String,
}

impl GmailSender {
    pub fn new(access_token: String, sender: String) -> Self {
        Self::with_base_url("https://gmail.googleapis.com".into(), access_token, sender)
    }

    pub fn with_base_url(base_url: String, access_token: String, sender: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            sender,
        }
    }

    /// RFC 2822 message, URL-safe base64 as the Gmail API requires.
    fn encode_mime(&self, to: &str, subject: &str, body: &str) -> String {
        let mime = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
            self.sender, to, subject, body
        );
        URL_SAFE_NO_PAD.encode(mime.as_bytes())
    }
}

#[async_trait]
impl EmailSender for GmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/gmail/v1/users/me/messages/send", self.base_url);
        let payload = serde_json::json!({ "raw": self.encode_mime(to, subject, body) });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Server {
                status: status.as_u16(),
                body,
            });
        }

        info!(to, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twilio_base_url_trimmed() {
        let sender = TwilioWhatsApp::with_base_url(
            "https://api.twilio.com/".into(),
            "AC123".into(),
            "token".into(),
            "+14155238886".into(),
        );
        assert_eq!(sender.base_url, "https://api.twilio.com");
    }

    #[test]
    fn mime_encoding_roundtrips() {
        let sender = GmailSender::new("token".into(), "noreply@example.com".into());
        let encoded = sender.encode_mime("mona@example.com", "Hello", "Body text");

        let decoded = URL_SAFE_NO_PAD.decode(encoded).unwrap();
        let text = String::from_utf8(decoded).unwrap();
        assert!(text.starts_with("From: noreply@example.com\r\n"));
        assert!(text.contains("To: mona@example.com"));
        assert!(text.contains("Subject: Hello"));
        assert!(text.ends_with("\r\n\r\nBody text"));
    }
}
