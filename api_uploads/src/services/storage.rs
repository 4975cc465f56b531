use async_trait::async_trait;
use common::{
    env_config::StorageConfig,
    error::{AppError, Res},
};
use reqwest::Client;
use serde_json::json;

/// Where an object ended up. Both values come from the storage provider.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Bucket operations needed by uploads and swaps.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, content_type: &str, data: Vec<u8>) -> Res<StoredObject>;

    async fn remove(&self, key: &str) -> Res<()>;

    fn public_url(&self, key: &str) -> String;
}

/// Supabase storage REST client.
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(config: &StorageConfig) -> Self {
        SupabaseStorage {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(json!({ "message": "Unknown error" }));
        format!(
            "{} {}",
            status,
            body["message"]
                .as_str()
                .or_else(|| body["error"].as_str())
                .unwrap_or("Unknown error")
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, key: &str, content_type: &str, data: Vec<u8>) -> Res<StoredObject> {
        log::info!("Uploading {} ({} bytes) to bucket {}", key, data.len(), self.bucket);
        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            log::warn!("Storage upload of {} failed: {}", key, message);
            return Err(AppError::Upstream(format!("Storage upload failed: {}", message)));
        }

        // Supabase answers with `{ "Key": "<bucket>/<key>" }`
        let body = response.json::<serde_json::Value>().await?;
        let stored_key = body["Key"]
            .as_str()
            .and_then(|full| full.strip_prefix(&format!("{}/", self.bucket)))
            .unwrap_or(key)
            .to_string();

        Ok(StoredObject {
            url: self.public_url(&stored_key),
            key: stored_key,
        })
    }

    async fn remove(&self, key: &str) -> Res<()> {
        let response = self
            .client
            .delete(format!(
                "{}/storage/v1/object/{}",
                self.base_url, self.bucket
            ))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({ "prefixes": [key] }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            log::warn!("Storage removal of {} failed: {}", key, message);
            return Err(AppError::Upstream(format!("Storage removal failed: {}", message)));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_points_at_the_bucket() {
        let storage = SupabaseStorage::new(&StorageConfig {
            url: "https://xyz.supabase.co/".to_string(),
            service_key: "service".to_string(),
            bucket: "uploads".to_string(),
        });
        assert_eq!(
            storage.public_url("u1/source/a.png"),
            "https://xyz.supabase.co/storage/v1/object/public/uploads/u1/source/a.png"
        );
    }
}
