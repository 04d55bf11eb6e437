use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use tokio::runtime::Handle;
use url::Url;

use crate::config::Config;
use crate::csrf::CsrfInjector;
use crate::dispatch::error::DispatchError;
use crate::dispatch::regions::RegionStore;
use crate::dispatch::{RequestDispatcher, SwapRequest};
use crate::prefetch::LinkFetcher;

/// HTTP dispatcher backed by `reqwest`.
///
/// Requests carry the jar's cookies and the CSRF header. There is no
/// request timeout; a hung request simply never swaps.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: Client,
    base_url: Url,
    csrf: CsrfInjector,
    regions: RegionStore,
    runtime: Handle,
}

impl HttpDispatcher {
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &Config, regions: RegionStore) -> Result<Self, DispatchError> {
        let base_url =
            Url::parse(&config.sync.endpoint).map_err(|e| DispatchError::InvalidEndpoint {
                url: config.sync.endpoint.clone(),
                source: e,
            })?;
        let csrf = CsrfInjector::new(&config.csrf).map_err(|_| DispatchError::InvalidHeaderName {
            name: config.csrf.header_name.clone(),
        })?;
        let client = Client::builder().build().map_err(DispatchError::Client)?;
        let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;

        Ok(Self {
            client,
            base_url,
            csrf,
            regions,
            runtime,
        })
    }

    pub fn regions(&self) -> &RegionStore {
        &self.regions
    }

    pub fn csrf(&self) -> &CsrfInjector {
        &self.csrf
    }

    /// Load a page once so the server can set its cookies.
    pub async fn prime(&self, path: &str) -> Result<(), DispatchError> {
        self.send(Method::GET, path, &[]).await.map(|_| ())
    }

    /// Perform `request` and swap the response into its target region.
    pub async fn execute(&self, request: &SwapRequest) -> Result<String, DispatchError> {
        let body = self
            .send(request.method.clone(), &request.path, &request.payload)
            .await?;
        self.regions.apply(&request.target, request.swap, body.clone());
        Ok(body)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: &[(String, String)],
    ) -> Result<String, DispatchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| DispatchError::InvalidPath {
                path: path.to_string(),
                source: e,
            })?;

        let carries_body = !matches!(method, Method::GET | Method::HEAD);
        if !carries_body && !payload.is_empty() {
            url.query_pairs_mut().extend_pairs(payload);
        }

        let mut headers = HeaderMap::new();
        self.csrf.configure(&mut headers);

        let mut builder = self.client.request(method, url.clone()).headers(headers);
        if carries_body {
            builder = builder.form(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DispatchError::Transport {
                url: url.to_string(),
                source: e,
            })?;

        self.csrf.observe(response.headers());

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| DispatchError::Transport {
            url: url.to_string(),
            source: e,
        })
    }
}

impl RequestDispatcher for HttpDispatcher {
    fn dispatch(&self, request: SwapRequest) {
        let this = self.clone();
        self.runtime.spawn(async move {
            match this.execute(&request).await {
                Ok(body) => tracing::debug!(
                    path = %request.path,
                    target = %request.target,
                    bytes = body.len(),
                    "Swapped response"
                ),
                Err(err) => tracing::debug!(path = %request.path, error = %err, "Request dropped"),
            }
        });
    }
}

impl LinkFetcher for HttpDispatcher {
    fn head(&self, url: Url) {
        let client = self.client.clone();
        let mut headers = HeaderMap::new();
        self.csrf.attach_cookies(&mut headers);
        self.runtime.spawn(async move {
            if let Err(err) = client.head(url.clone()).headers(headers).send().await {
                tracing::debug!(url = %url, error = %err, "Prefetch failed");
            }
        });
    }
}
