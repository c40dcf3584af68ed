use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

pub const UNIQUE_VIOLATION: &str = "23505";
pub const EXCLUSION_VIOLATION: &str = "23P01";

/// A non-2xx answer from PostgREST or Storage.
#[derive(Debug, Error)]
#[error("API error ({status}): {body}")]
pub struct ApiError {
    pub status: u16,
    pub body: String,
}

#[derive(Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl ApiError {
    /// The Postgres SQLSTATE reported by PostgREST, when the body carries one.
    pub fn pg_code(&self) -> Option<String> {
        serde_json::from_str::<PostgrestErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.code)
    }

    pub fn is_pg_code(err: &anyhow::Error, code: &str) -> bool {
        err.downcast_ref::<ApiError>()
            .and_then(ApiError::pg_code)
            .is_some_and(|c| c == code)
    }

    /// True iff the PostgREST `message` or `details` field names `constraint`.
    pub fn names_constraint(&self, constraint: &str) -> bool {
        serde_json::from_str::<PostgrestErrorBody>(&self.body)
            .map(|b| {
                [b.message, b.details]
                    .iter()
                    .flatten()
                    .any(|text| text.contains(constraint))
            })
            .unwrap_or(false)
    }

    pub fn is_constraint_violation(err: &anyhow::Error, constraint: &str) -> bool {
        err.downcast_ref::<ApiError>()
            .is_some_and(|api| api.names_constraint(constraint))
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.service_key).context("Invalid Supabase key")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key))
                .context("Invalid Supabase key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = Self::check_status(req.send().await?).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Exact row count for a filtered table path, read from `Content-Range`.
    pub async fn count(&self, path: &str) -> Result<u64> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Counting rows at {}", url);

        let mut headers = self.get_headers()?;
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.client.head(&url).headers(headers).send().await?;
        let response = Self::check_status(response).await?;

        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .ok_or_else(|| anyhow!("Missing Content-Range header in count response"))?
            .to_str()
            .context("Content-Range header is not valid text")?;

        parse_content_range_total(range)
    }

    /// Stores raw bytes in a Storage bucket and returns the object's public URL.
    pub async fn upload_object(
        &self,
        bucket: &str,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object_path);
        debug!("Uploading {} bytes to {}", bytes.len(), url);

        let mut headers = self.get_headers()?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type).context("Invalid content type")?,
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .body(bytes)
            .send()
            .await?;
        Self::check_status(response).await?;

        Ok(self.public_object_url(bucket, object_path))
    }

    pub fn public_object_url(&self, bucket: &str, object_path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, object_path)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("API error ({}): {}", status, body);

        Err(ApiError {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

fn parse_content_range_total(range: &str) -> Result<u64> {
    let total = range
        .rsplit('/')
        .next()
        .ok_or_else(|| anyhow!("Malformed Content-Range: {}", range))?;

    total
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Content-Range has no exact total: {}", range))
}
