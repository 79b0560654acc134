use crate::domain::model::BackgroundSlot;
use crate::domain::ports::ControlChannel;
use crate::utils::error::{LogoError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::sync::OnceLock;
use std::time::Duration;

pub const PARTICIPANT_LIST_PAYLOAD: &str =
    "<Command><Conference><ParticipantList><Search></Search></ParticipantList></Conference></Command>";

pub const BLUR_PAYLOAD: &str =
    "<Command><Cameras><Background><Set><Mode>BlurMonochrome</Mode></Set></Background></Cameras></Command>";

pub fn upload_payload(slot: BackgroundSlot, image_base64: &str) -> String {
    format!(
        "<Command><Cameras><Background><Upload><Image>{}</Image><body>{}</body></Upload></Background></Cameras></Command>",
        slot, image_base64
    )
}

pub fn switch_payload(slot: BackgroundSlot) -> String {
    format!(
        "<Command><Cameras><Background><Set><Image>{}</Image><Mode>Image</Mode></Set></Background></Cameras></Command>",
        slot
    )
}

/// xAPI client posting XML commands to `/putxml` on the video device.
pub struct XapiClient {
    client: Client,
    address: String,
    endpoint: String,
    token: String,
}

impl XapiClient {
    pub fn new(address: &str, token: &str, timeout: Duration) -> Result<Self> {
        // 裝置使用自簽憑證
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            address: address.to_string(),
            endpoint: Self::endpoint_url(address),
            token: token.to_string(),
        })
    }

    /// `https://<address>/putxml`, unless the address already names a scheme.
    pub fn endpoint_url(address: &str) -> String {
        let address = address.trim().trim_end_matches('/');
        if address.contains("://") {
            format!("{}/putxml", address)
        } else {
            format!("https://{}/putxml", address)
        }
    }
}

#[async_trait]
impl ControlChannel for XapiClient {
    async fn send(&self, payload: &str) -> Result<String> {
        tracing::debug!("xAPI request to {} ({} bytes)", self.endpoint, payload.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Basic {}", self.token))
            .header(CONTENT_TYPE, "text/xml")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| LogoError::network(&self.address, e.to_string()))?;

        let status = response.status();
        tracing::debug!("xAPI response status: {}", status);

        if status != StatusCode::OK {
            return Err(LogoError::network(
                &self.address,
                format!(
                    "status: {} -- reason: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown")
                ),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LogoError::network(&self.address, e.to_string()))?;
        check_response(&body)?;
        Ok(body)
    }
}

/// A 200 response can still carry an error; any mention of "error" counts.
pub fn check_response(body: &str) -> Result<()> {
    if !body.to_lowercase().contains("error") {
        return Ok(());
    }

    static STATUS: OnceLock<Regex> = OnceLock::new();
    static REASON: OnceLock<Regex> = OnceLock::new();
    let status_re = STATUS.get_or_init(|| Regex::new(r#"status="([^"]*)""#).expect("static pattern"));
    let reason_re =
        REASON.get_or_init(|| Regex::new(r"<Reason>([^<]*)</Reason>").expect("static pattern"));

    let status = status_re.captures(body).map(|c| c[1].to_string());
    let reason = reason_re.captures(body).map(|c| unescape_xml(&c[1]));

    let message = match (status, reason) {
        (Some(status), Some(reason)) => format!("status={} {}", status, reason),
        (Some(status), None) => format!("status={}", status),
        (None, Some(reason)) => reason,
        (None, None) => body.trim().to_string(),
    };
    Err(LogoError::RemoteApiError { message })
}

/// Reads the e-mail addresses of everyone in the active call.
pub async fn read_participant_emails<C: ControlChannel + ?Sized>(channel: &C) -> Result<Vec<String>> {
    let body = match channel.send(PARTICIPANT_LIST_PAYLOAD).await {
        Ok(body) => body,
        Err(LogoError::RemoteApiError { message }) if message.to_lowercase().contains("not found") => {
            return Err(LogoError::NoActiveCall)
        }
        Err(e) => return Err(e),
    };
    if body.to_lowercase().contains("not found") {
        return Err(LogoError::NoActiveCall);
    }
    Ok(extract_emails(&body))
}

/// Text of every `<Email>` element; empty elements are skipped.
pub fn extract_emails(xml: &str) -> Vec<String> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"<Email(?:\s[^>]*)?(?:/>|>([^<]*)</Email>)").expect("static pattern")
    });

    re.captures_iter(xml)
        .filter_map(|caps| {
            let email = caps.get(1).map(|m| unescape_xml(m.as_str().trim()));
            match email {
                Some(email) if !email.is_empty() => Some(email),
                _ => {
                    tracing::info!("user email: no email found. Is this a Webex meeting?");
                    None
                }
            }
        })
        .collect()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
