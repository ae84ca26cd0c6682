//! Cloudflare HTTP request methods

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::{CF_API_BASE, CloudflareProvider, CloudflareResponse};

impl CloudflareProvider {
    /// Send a request and unwrap the Cloudflare envelope.
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        ctx: ErrorContext,
    ) -> Result<CloudflareResponse<T>> {
        let url = format!("{CF_API_BASE}{path}");
        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.api_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            method.as_str(),
            &url,
            self.max_retries,
        )
        .await?;

        let envelope: CloudflareResponse<T> =
            HttpUtils::parse_json(&response.body, self.provider_name())?;

        if !envelope.success || !response.is_success() {
            let (code, message) = envelope
                .errors
                .as_ref()
                .and_then(|errors| errors.first())
                .map(|e| (e.code.to_string(), e.message.clone()))
                .unwrap_or_else(|| (String::new(), format!("HTTP {}", response.status)));
            log::warn!("[cloudflare] API error {code}: {message}");
            return Err(self.map_error(RawApiError::with_code(code, message), ctx));
        }

        Ok(envelope)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, ctx: ErrorContext) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, None, ctx)
            .await?
            .result
            .ok_or_else(|| self.parse_error("missing result field"))
    }

    /// GET every page of a list endpoint. `path` may already carry a query.
    pub(crate) async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        per_page: u32,
        ctx: ErrorContext,
    ) -> Result<Vec<T>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let paged = format!("{path}{separator}page={page}&per_page={per_page}");
            let response = self
                .request::<Vec<T>, ()>(Method::GET, &paged, None, ctx.clone())
                .await?;
            let batch = response.result.unwrap_or_default();
            let fetched = batch.len();
            items.extend(batch);

            let done = match response.result_info {
                Some(info) => match info.total_pages {
                    Some(total_pages) => page >= total_pages,
                    None => items.len() >= info.total_count as usize,
                },
                None => true,
            };
            if done || fetched == 0 {
                return Ok(items);
            }
            page += 1;
        }
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        self.request::<T, B>(Method::POST, path, Some(body), ctx)
            .await?
            .result
            .ok_or_else(|| self.parse_error("missing result field"))
    }

    pub(crate) async fn delete(&self, path: &str, ctx: ErrorContext) -> Result<()> {
        self.request::<serde_json::Value, ()>(Method::DELETE, path, None, ctx)
            .await
            .map(|_| ())
    }
}
