use async_trait::async_trait;
use common::{
    env_config::FaceSwapConfig,
    error::{AppError, Res},
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapJob {
    #[serde(alias = "id")]
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub result_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct SwapJobRequest<'a> {
    source_image_url: &'a str,
    target_image_url: &'a str,
}

/// Remote service that performs the face swap.
#[async_trait]
pub trait FaceSwapProvider: Send + Sync {
    async fn create_swap(&self, source_url: &str, target_url: &str) -> Res<SwapJob>;

    async fn get_swap(&self, job_id: &str) -> Res<SwapJob>;
}

pub struct HttpFaceSwapProvider {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpFaceSwapProvider {
    pub fn new(config: &FaceSwapConfig) -> Self {
        HttpFaceSwapProvider {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn ensure_configured(&self) -> Res<()> {
        if self.api_url.is_empty() || self.api_key.is_empty() {
            return Err(AppError::Upstream(
                "Face-swap provider is not configured".to_string(),
            ));
        }
        Ok(())
    }

    async fn read_job(response: reqwest::Response) -> Res<SwapJob> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Swap job not found".to_string()));
        }
        if !status.is_success() {
            let error_response = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or(serde_json::json!({ "message": "Unknown error" }));
            let message = error_response["message"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string();
            log::warn!("Face-swap provider returned {}: {}", status, message);
            return Err(AppError::Upstream(format!(
                "Face-swap provider returned {}: {}",
                status, message
            )));
        }
        response
            .json::<SwapJob>()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed face-swap response: {}", e)))
    }
}

#[async_trait]
impl FaceSwapProvider for HttpFaceSwapProvider {
    async fn create_swap(&self, source_url: &str, target_url: &str) -> Res<SwapJob> {
        self.ensure_configured()?;
        log::info!("Sending swap request to {}", self.api_url);
        let response = self
            .client
            .post(format!("{}/v1/swap", self.api_url))
            .header("X-API-Key", &self.api_key)
            .json(&SwapJobRequest {
                source_image_url: source_url,
                target_image_url: target_url,
            })
            .send()
            .await?;

        let job = Self::read_job(response).await?;
        log::info!("Swap job {} accepted with status {}", job.job_id, job.status);
        Ok(job)
    }

    async fn get_swap(&self, job_id: &str) -> Res<SwapJob> {
        self.ensure_configured()?;
        let response = self
            .client
            .get(format!("{}/v1/swap/{}", self.api_url, job_id))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        Self::read_job(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_provider_fails_without_network() {
        let provider = HttpFaceSwapProvider::new(&FaceSwapConfig::default());
        assert!(matches!(
            provider.create_swap("https://a", "https://b").await,
            Err(AppError::Upstream(_))
        ));
    }

    #[test]
    fn job_accepts_id_alias() {
        let job: SwapJob =
            serde_json::from_str(r#"{"id":"job_42","status":"queued"}"#).unwrap();
        assert_eq!(job.job_id, "job_42");
        assert_eq!(job.result_url, None);
    }
}
