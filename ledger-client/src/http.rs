//! HTTP implementation of [`Ledger`] against a ledger gateway
//!
//! The gateway is a thin JSON front for the chain node: reads are GETs,
//! estimate/submit are POSTs, and events are exposed as a sequenced feed
//! that we poll into a local broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::client::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountId, LedgerEvent, LedgerTx, OrderRecord, ProductRecord, Receipt};

/// Default per-call deadline; a hung node must not hang the caller
const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

/// How often the event poller asks the gateway for new events
const EVENT_POLL_INTERVAL_MS: u64 = 1_000;

/// Capacity of the local event fan-out channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Serialize)]
struct EstimateBody<'a> {
    tx: &'a LedgerTx,
    from: &'a str,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    gas: u64,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    tx: &'a LedgerTx,
    from: &'a str,
    gas_limit: u64,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// One entry in the gateway's sequenced event feed
#[derive(Debug, Deserialize)]
struct FeedEntry {
    seq: u64,
    #[serde(flatten)]
    event: LedgerEvent,
}

/// HTTP-backed ledger client
#[derive(Debug, Clone)]
pub struct HttpLedger {
    client: Client,
    base_url: String,
    call_timeout: Duration,
    events_tx: Arc<broadcast::Sender<LedgerEvent>>,
}

impl HttpLedger {
    /// Create a client for the given gateway URL and start the event
    /// poller in the background.
    pub fn connect(base_url: impl Into<String>) -> Self {
        Self::connect_with_timeout(base_url, Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS))
    }

    /// Create a client with an explicit per-call deadline
    pub fn connect_with_timeout(base_url: impl Into<String>, call_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(call_timeout)
            .build()
            .unwrap_or_default();

        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let ledger = Self {
            client,
            base_url: base_url.into(),
            call_timeout,
            events_tx: Arc::new(events_tx),
        };

        ledger.spawn_event_poller();
        ledger
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Poll the gateway's event feed and fan entries out locally.
    ///
    /// The cursor restarts at the last seen sequence after a reconnect,
    /// so consumers can see replays; handlers downstream are idempotent.
    fn spawn_event_poller(&self) {
        let client = self.client.clone();
        let url = self.url("events");
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            let mut cursor: u64 = 0;
            let mut ticker =
                tokio::time::interval(Duration::from_millis(EVENT_POLL_INTERVAL_MS));
            loop {
                ticker.tick().await;

                let request = client.get(&url).query(&[("after", cursor)]);
                let entries: Vec<FeedEntry> = match request.send().await {
                    Ok(resp) if resp.status().is_success() => {
                        match resp.json().await {
                            Ok(entries) => entries,
                            Err(e) => {
                                tracing::warn!(error = %e, "Malformed event feed response");
                                continue;
                            }
                        }
                    }
                    Ok(resp) => {
                        tracing::warn!(status = %resp.status(), "Event feed request failed");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Event feed unreachable, will retry");
                        continue;
                    }
                };

                for entry in entries {
                    cursor = cursor.max(entry.seq);
                    // Send fails only when nobody is subscribed; fine to drop
                    let _ = events_tx.send(entry.event);
                }
            }
        });
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> LedgerResult<T> {
        let fut = self.client.get(self.url(path)).send();
        let response = tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| LedgerError::Unavailable(format!("GET {path} timed out")))??;
        Self::handle_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> LedgerResult<T> {
        let fut = self.client.post(self.url(path)).json(body).send();
        let response = tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| LedgerError::Unavailable(format!("POST {path} timed out")))??;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> LedgerResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::NOT_FOUND => Err(LedgerError::NotFound(text)),
                // The gateway reports reverted transactions as 422 with
                // the revert reason in the body
                StatusCode::UNPROCESSABLE_ENTITY => Err(LedgerError::Reverted(text)),
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                    Err(LedgerError::Unavailable(text))
                }
                _ => Err(LedgerError::Gateway(format!("{status}: {text}"))),
            };
        }

        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn accounts(&self) -> LedgerResult<Vec<AccountId>> {
        self.get_json("accounts").await
    }

    async fn product_count(&self) -> LedgerResult<u64> {
        let resp: CountResponse = self.get_json("products/count").await?;
        Ok(resp.count)
    }

    async fn get_product(&self, id: u64) -> LedgerResult<ProductRecord> {
        self.get_json(&format!("products/{id}")).await
    }

    async fn order_count(&self) -> LedgerResult<u64> {
        let resp: CountResponse = self.get_json("orders/count").await?;
        Ok(resp.count)
    }

    async fn get_order(&self, id: u64) -> LedgerResult<OrderRecord> {
        self.get_json(&format!("orders/{id}")).await
    }

    async fn estimate_gas(&self, tx: &LedgerTx, from: &AccountId) -> LedgerResult<u64> {
        let resp: EstimateResponse = self
            .post_json("estimate", &EstimateBody { tx, from })
            .await?;
        Ok(resp.gas)
    }

    async fn submit(
        &self,
        tx: LedgerTx,
        from: &AccountId,
        gas_limit: u64,
    ) -> LedgerResult<Receipt> {
        tracing::debug!(method = tx.method(), from = %from, gas_limit, "Submitting ledger transaction");
        self.post_json(
            "submit",
            &SubmitBody {
                tx: &tx,
                from,
                gas_limit,
            },
        )
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }
}
