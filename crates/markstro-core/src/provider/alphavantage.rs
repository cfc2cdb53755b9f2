use std::sync::Arc;

use serde_json::Value;

use super::{ProviderFunction, ProviderFuture, QuoteProvider};
use crate::config::{ProviderConfig, ProviderEndpoint};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{QuoteError, Symbol};

/// Alpha Vantage `/query` transport, either direct or through a backend proxy.
#[derive(Clone)]
pub struct AlphaVantageProvider {
    http_client: Arc<dyn HttpClient>,
    config: ProviderConfig,
}

impl AlphaVantageProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::default()), config)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: ProviderConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn build_request(&self, function: ProviderFunction, param: (&str, &str)) -> HttpRequest {
        let (name, value) = param;
        let base = self.config.endpoint.base_url().trim_end_matches('/');
        let mut url = format!(
            "{base}/query?function={}&{name}={}",
            function.as_str(),
            urlencoding::encode(value)
        );

        let auth = match &self.config.endpoint {
            ProviderEndpoint::Direct { api_key, .. } => {
                url.push_str("&apikey=");
                url.push_str(&urlencoding::encode(api_key));
                HttpAuth::None
            }
            ProviderEndpoint::Proxy { token, .. } => HttpAuth::BearerToken(token.clone()),
        };

        HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_auth(&auth)
            .with_timeout(self.config.timeout)
    }

    async fn call(&self, function: ProviderFunction, param: (&str, &str)) -> Result<Value, QuoteError> {
        let request = self.build_request(function, param);
        tracing::debug!(function = %function, "calling provider");

        let response = self.http_client.execute(request).await?;

        if response.status == 429 {
            return Err(QuoteError::ProviderThrottled {
                retry_after: self.config.throttle_cooldown,
                notice: String::from("provider returned HTTP 429"),
            });
        }
        if !response.is_success() {
            return Err(QuoteError::NetworkFailure {
                message: format!("provider returned status {}", response.status),
                timed_out: false,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| {
            QuoteError::malformed(format!("{function} response is not valid JSON: {e}"))
        })
    }
}

impl QuoteProvider for AlphaVantageProvider {
    fn global_quote<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a> {
        Box::pin(self.call(ProviderFunction::GlobalQuote, ("symbol", symbol.as_str())))
    }

    fn daily_series<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a> {
        Box::pin(self.call(ProviderFunction::TimeSeriesDaily, ("symbol", symbol.as_str())))
    }

    fn symbol_search<'a>(&'a self, keywords: &'a str) -> ProviderFuture<'a> {
        Box::pin(self.call(ProviderFunction::SymbolSearch, ("keywords", keywords)))
    }
}
