//! OEIS b-file download.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::data::TermStore;
use crate::domain::Sequence;
use crate::error::AppError;
use crate::io::bfile::{bfile_name, parse_bfile};

const DEFAULT_BASE_URL: &str = "https://oeis.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OeisClient {
    client: Client,
    base_url: String,
}

impl OeisClient {
    /// Build a client from `OEIS_BASE_URL` / `OEIS_USER_AGENT` (both optional, `.env` honoured).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("OEIS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let user_agent = std::env::var("OEIS_USER_AGENT")
            .unwrap_or_else(|_| concat!("seq-conjecture/", env!("CARGO_PKG_VERSION")).to_string());
        Self::new(base_url, &user_agent)
    }

    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn bfile_url(&self, id: &str) -> Result<String, AppError> {
        Ok(format!(
            "{}/{id}/{}",
            self.base_url.trim_end_matches('/'),
            bfile_name(id)?
        ))
    }
}

impl TermStore for OeisClient {
    fn fetch(&self, id: &str) -> Result<Sequence, AppError> {
        let url = self.bfile_url(id)?;
        debug!(%url, "fetching b-file");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AppError::new(4, format!("OEIS request for {id} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("OEIS request for {id} failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read OEIS response for {id}: {e}")))?;
        parse_bfile(id, &body)
    }
}
