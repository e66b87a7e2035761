//! Baidu short-speech recognition backend.
//!
//! Two-step flow: exchange the API key pair for an OAuth access token, then
//! POST the base64-encoded PCM audio to the recognition endpoint. A non-zero
//! `err_no` in the response is a collaborator failure carrying `err_msg`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};

use super::SpeechTranscriber;

const TOKEN_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";
const ASR_URL: &str = "https://vop.baidu.com/server_api";

/// dev_pid for Mandarin with simple English.
const DEV_PID_MANDARIN: u32 = 1537;
/// dev_pid for English.
const DEV_PID_ENGLISH: u32 = 1737;

/// Speech recognition via the Baidu short-speech API.
#[derive(Debug, Clone)]
pub struct BaiduTranscriber {
    http: reqwest::Client,
    api_key: String,
    secret_key: String,
    /// Caller identifier required by the API; any stable string works.
    cuid: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AsrResponse {
    err_no: i64,
    #[serde(default)]
    err_msg: Option<String>,
    #[serde(default)]
    result: Option<Vec<String>>,
}

impl BaiduTranscriber {
    /// Build a transcriber with an explicit request timeout.
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::collaborator(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            cuid: "wayfarer".to_owned(),
        })
    }

    async fn fetch_token(&self) -> Result<String> {
        let response = self
            .http
            .post(TOKEN_URL)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.secret_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::collaborator(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::collaborator(format!(
                "token request returned status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator(format!("invalid token response: {e}")))?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl SpeechTranscriber for BaiduTranscriber {
    fn name(&self) -> &str {
        "baidu"
    }

    async fn transcribe(&self, audio: &[u8], sample_rate: u32, language: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::validation("audio payload must not be empty"));
        }

        let token = self.fetch_token().await?;

        let dev_pid = match language {
            "en" => DEV_PID_ENGLISH,
            _ => DEV_PID_MANDARIN,
        };

        debug!(len = audio.len(), sample_rate, dev_pid, "sending audio for transcription");

        let body = json!({
            "format": "pcm",
            "rate": sample_rate,
            "channel": 1,
            "cuid": self.cuid,
            "token": token,
            "dev_pid": dev_pid,
            "speech": BASE64.encode(audio),
            "len": audio.len(),
        });

        let response = self
            .http
            .post(ASR_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::collaborator(format!("transcription request failed: {e}")))?;

        let asr: AsrResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator(format!("invalid transcription response: {e}")))?;

        if asr.err_no != 0 {
            let msg = asr.err_msg.unwrap_or_else(|| "unknown error".to_owned());
            return Err(Error::collaborator(format!(
                "speech recognition failed (err_no {}): {msg}",
                asr.err_no
            )));
        }

        let pieces = asr
            .result
            .ok_or_else(|| Error::collaborator("transcription response had no result"))?;

        Ok(pieces.concat())
    }
}
