// server/src/mirror/rest_mirror.rs
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use super::record_mirror::{MirrorError, MirrorRow, RecordMirror};

pub const DEFAULT_MIRROR_TABLE: &str = "data_items";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Mirror backed by a hosted PostgREST-style table.
///
/// Rows are inserted with `POST {base}/rest/v1/{table}` and read back with
/// `GET {base}/rest/v1/{table}?select=*`. The api key goes in both the
/// `apikey` header and as a bearer token.
pub struct RestMirror {
    client: Client,
    table_url: Url,
    api_key: String,
    table: String,
}

impl RestMirror {
    pub fn new(base_url: &str, api_key: String, table: String) -> Result<Self, MirrorError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let table_url = base.join("rest/v1/")?.join(&table)?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        debug!("Creating RestMirror for table '{}' at {}", table, table_url);
        Ok(Self {
            client,
            table_url,
            api_key,
            table,
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl RecordMirror for RestMirror {
    async fn insert_row(&self, row: &MirrorRow) -> Result<(), MirrorError> {
        let start = Instant::now();
        let response = self
            .authorize(self.client.post(self.table_url.clone()))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        debug!(
            "Mirrored row {} into '{}' in {:?} (status {})",
            row.id,
            self.table,
            start.elapsed(),
            response.status()
        );
        Ok(())
    }

    async fn fetch_rows(&self) -> Result<Vec<MirrorRow>, MirrorError> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut().append_pair("select", "*");
        let response = self.authorize(self.client.get(url)).send().await?;
        let rows = ensure_success(response).await?.json::<Vec<MirrorRow>>().await?;
        debug!("Fetched {} rows from '{}'", rows.len(), self.table);
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("rest table '{}'", self.table)
    }
}

// Turns a non-2xx response into `MirrorError::Status`, keeping the body text.
async fn ensure_success(response: Response) -> Result<Response, MirrorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MirrorError::Status {
        status: status.as_u16(),
        body,
    })
}
