use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::error::FetchError;
use crate::settings::Settings;

/// A downloaded page, still undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    /// `charset` parameter of the response `Content-Type`, if any.
    pub charset: Option<String>,
    pub body: Vec<u8>,
}

impl Document {
    pub fn new(url: impl Into<String>, charset: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Document {
            url: url.into(),
            charset,
            body: body.into(),
        }
    }
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Fetcher { client })
    }

    /// Single GET, no retries. Any non-2xx status is an error.
    pub async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        info!("Fetching {}", url);
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(parsed).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_param);
        let body = response.bytes().await.map_err(transport)?.to_vec();
        debug!("Fetched {} bytes from {} (charset: {:?})", body.len(), url, charset);

        Ok(Document::new(url, charset, body))
    }
}

/// `text/html; charset=ISO-8859-1` -> `ISO-8859-1`
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}
