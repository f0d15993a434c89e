// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::domain::constants;
use crate::domain::error::AppError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, header};
use serde::Deserialize;

/// The remote endpoints one wallet loop consumes. A trait so the controller
/// and cycle executor can run against a scripted in-memory service in tests.
#[async_trait]
pub trait PointsApi: Send + Sync + 'static {
    /// `GET /api/nonce`, unauthenticated.
    async fn nonce(&self) -> Result<String, AppError>;

    /// `POST /api/verify` with the signed challenge; yields the bearer token.
    async fn verify(&self, message: &str, signature: &str) -> Result<String, AppError>;

    /// `GET /api/points`.
    async fn points(&self, token: &str) -> Result<u64, AppError>;

    /// `POST /api/upload`, multipart file.
    async fn upload(&self, token: &str, filename: &str, payload: Vec<u8>) -> Result<(), AppError>;

    /// `POST /api/compare`, multipart file.
    async fn compare(&self, token: &str, filename: &str, payload: Vec<u8>)
    -> Result<(), AppError>;

    /// `GET /api/images`; server-side paths of previously uploaded images.
    async fn list_images(&self, token: &str) -> Result<Vec<String>, AppError>;

    /// `DELETE /api/images/{id}`.
    async fn delete_image(&self, token: &str, image_id: &str) -> Result<(), AppError>;

    /// Fetch payload bytes from an external image source.
    async fn fetch_external_image(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

#[derive(Debug, Deserialize)]
struct NonceResponse {
    nonce: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    points: u64,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    status: String,
    #[serde(default)]
    images: Vec<String>,
}

/// reqwest-backed implementation against the fixed service API.
pub struct HttpPointsApi {
    client: Client,
    base_url: String,
    origin: String,
    referer: String,
}

impl HttpPointsApi {
    pub fn new(client: Client, base_url: &str, web_domain: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            origin: format!("https://{web_domain}"),
            referer: format!("https://{web_domain}/"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Origin/Referer headers matching the service's own web front end.
    fn browser_headers(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(header::ORIGIN, &self.origin)
            .header(header::REFERER, &self.referer)
    }

    fn check(endpoint: &str, resp: Response) -> Result<Response, AppError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(AppError::from_status(endpoint, status.as_u16()))
        }
    }

    async fn send_multipart(
        &self,
        endpoint: &str,
        token: &str,
        filename: &str,
        payload: Vec<u8>,
    ) -> Result<(), AppError> {
        let part = Part::bytes(payload)
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| AppError::Connection(format!("multipart build failed: {e}")))?;
        let form = Form::new().part("file", part);

        let resp = self
            .browser_headers(self.client.post(self.url(endpoint)))
            .bearer_auth(token)
            .header(header::USER_AGENT, constants::BROWSER_USER_AGENT)
            .multipart(form)
            .send()
            .await?;
        Self::check(endpoint, resp)?;
        Ok(())
    }
}

#[async_trait]
impl PointsApi for HttpPointsApi {
    async fn nonce(&self) -> Result<String, AppError> {
        let resp = self
            .browser_headers(self.client.get(self.url("/api/nonce")))
            .send()
            .await?;
        let body: NonceResponse = Self::check("/api/nonce", resp)?.json().await?;
        Ok(body.nonce)
    }

    async fn verify(&self, message: &str, signature: &str) -> Result<String, AppError> {
        let resp = self
            .browser_headers(self.client.post(self.url("/api/verify")))
            .json(&serde_json::json!({ "message": message, "signature": signature }))
            .send()
            .await?;
        let body: VerifyResponse = Self::check("/api/verify", resp)?.json().await?;
        body.token
            .ok_or_else(|| AppError::Auth("no token in verify response".to_string()))
    }

    async fn points(&self, token: &str) -> Result<u64, AppError> {
        let resp = self
            .browser_headers(self.client.get(self.url("/api/points")))
            .bearer_auth(token)
            .send()
            .await?;
        let body: PointsResponse = Self::check("/api/points", resp)?.json().await?;
        Ok(body.points)
    }

    async fn upload(&self, token: &str, filename: &str, payload: Vec<u8>) -> Result<(), AppError> {
        self.send_multipart("/api/upload", token, filename, payload)
            .await
    }

    async fn compare(
        &self,
        token: &str,
        filename: &str,
        payload: Vec<u8>,
    ) -> Result<(), AppError> {
        self.send_multipart("/api/compare", token, filename, payload)
            .await
    }

    async fn list_images(&self, token: &str) -> Result<Vec<String>, AppError> {
        let resp = self
            .browser_headers(self.client.get(self.url("/api/images")))
            .bearer_auth(token)
            .header(header::USER_AGENT, constants::BROWSER_USER_AGENT)
            .send()
            .await?;
        let body: ImagesResponse = Self::check("/api/images", resp)?.json().await?;
        if body.status == "success" {
            Ok(body.images)
        } else {
            Ok(Vec::new())
        }
    }

    async fn delete_image(&self, token: &str, image_id: &str) -> Result<(), AppError> {
        let endpoint = format!("/api/images/{image_id}");
        let resp = self
            .browser_headers(self.client.delete(self.url(&endpoint)))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(&endpoint, resp)?;
        Ok(())
    }

    async fn fetch_external_image(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let resp = self.client.get(url).send().await?;
        let resp = Self::check(url, resp)?;
        Ok(resp.bytes().await?.to_vec())
    }
}
