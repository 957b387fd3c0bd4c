use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::domain::repositories::ai::AiGateway;
use crate::domain::value_objects::ai::{
    AI_STATUS_COMPLETED, AI_STATUS_FAILED, AiJobRequest, AiJobSnapshot,
};
use crate::domain::value_objects::enums::generation_types::GenerationType;

const IMAGE_ENHANCE_MODEL: &str = "nano-banana-upscale";
const VIDEO_GENERATE_MODEL: &str = "kling/v1.6-image-to-video";

/// Client for the Kie AI task API. Jobs complete asynchronously; the callback
/// URL configured here is delivered to our webhook route.
pub struct KieClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    callback_url: String,
}

#[derive(Debug, Deserialize)]
struct KieEnvelope<T> {
    code: i64,
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KieCreateTaskData {
    task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KieRecordInfoData {
    task_id: String,
    state: String,
    result_json: Option<String>,
    fail_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KieResultJson {
    #[serde(default)]
    result_urls: Vec<String>,
}

impl KieClient {
    pub fn new(api_key: String, base_url: String, callback_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            callback_url,
        }
    }

    fn model_for(task_type: GenerationType) -> &'static str {
        match task_type {
            GenerationType::ImageEnhance => IMAGE_ENHANCE_MODEL,
            GenerationType::VideoGenerate => VIDEO_GENERATE_MODEL,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "kie api request failed"
        );

        anyhow::bail!("Kie API request failed: {} (status {})", context, status);
    }

    fn unwrap_envelope<T>(envelope: KieEnvelope<T>, context: &str) -> Result<T> {
        if envelope.code != 200 {
            anyhow::bail!(
                "Kie API rejected {}: code {} ({})",
                context,
                envelope.code,
                envelope.msg.unwrap_or_default()
            );
        }

        envelope
            .data
            .ok_or_else(|| anyhow::anyhow!("Kie API response for {} is missing data", context))
    }
}

#[async_trait]
impl AiGateway for KieClient {
    async fn submit_job(&self, request: AiJobRequest) -> Result<String> {
        let mut input = request.settings.unwrap_or_else(|| json!({}));
        if let Some(object) = input.as_object_mut() {
            if let Some(image_url) = &request.image_url {
                object.insert("image_url".to_string(), json!(image_url));
            }
            if let Some(prompt) = &request.prompt {
                object.insert("prompt".to_string(), json!(prompt));
            }
        }

        let body = json!({
            "model": Self::model_for(request.task_type),
            "callBackUrl": self.callback_url,
            "input": input,
        });

        let resp = self
            .http
            .post(format!("{}/api/v1/jobs/createTask", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create task").await?;

        let envelope: KieEnvelope<KieCreateTaskData> = resp.json().await?;
        let data = Self::unwrap_envelope(envelope, "create task")?;

        Ok(data.task_id)
    }

    async fn fetch_job(&self, job_id: &str) -> Result<AiJobSnapshot> {
        let resp = self
            .http
            .get(format!("{}/api/v1/jobs/recordInfo", self.base_url))
            .query(&[("taskId", job_id)])
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "record info").await?;

        let envelope: KieEnvelope<KieRecordInfoData> = resp.json().await?;
        let data = Self::unwrap_envelope(envelope, "record info")?;

        let status = match data.state.as_str() {
            "success" => AI_STATUS_COMPLETED.to_string(),
            "fail" => AI_STATUS_FAILED.to_string(),
            other => other.to_string(),
        };

        let result_url = data
            .result_json
            .as_deref()
            .and_then(|raw| serde_json::from_str::<KieResultJson>(raw).ok())
            .and_then(|parsed| parsed.result_urls.into_iter().next());

        Ok(AiJobSnapshot {
            job_id: data.task_id,
            status,
            result_url,
            error: data.fail_msg,
        })
    }
}
