use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use common::engine::SimulationSession;
use common::{log, log_warn};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::ServerError;
use crate::server_config::TriggerConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TransferResponse {
    #[serde(default)]
    success: bool,
    data: Option<Vec<TransferRecord>>,
    metadata: Option<TransferMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct TransferMetadata {
    #[serde(default)]
    tokens: HashMap<String, TokenMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenMetadata {
    token_name: Option<String>,
    token_symbol: Option<String>,
    token_icon: Option<String>,
}

/// One transfer as reported by the explorer. Time and amount are passed
/// through untouched.
#[derive(Clone, Debug, Deserialize)]
pub struct TransferRecord {
    pub trans_id: String,
    #[serde(default)]
    pub time: serde_json::Value,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub to_address: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub icon: String,
}

impl TokenInfo {
    fn from_metadata(metadata: Option<&TokenMetadata>) -> Self {
        let field = |value: Option<&String>, fallback: &str| {
            value.cloned().unwrap_or_else(|| fallback.to_string())
        };
        Self {
            name: field(metadata.and_then(|m| m.token_name.as_ref()), "Unknown"),
            symbol: field(metadata.and_then(|m| m.token_symbol.as_ref()), "Unknown"),
            icon: field(metadata.and_then(|m| m.token_icon.as_ref()), ""),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransferPage {
    pub records: Vec<TransferRecord>,
    pub token_info: TokenInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub signature: String,
    pub time: serde_json::Value,
    pub from: String,
    pub to: String,
    pub amount: serde_json::Value,
    pub is_new: bool,
}

#[derive(Clone, Debug)]
pub struct FeedReport {
    pub transactions: Vec<TransactionView>,
    pub new_count: usize,
    pub token_info: TokenInfo,
}

/// HTTP client for the block explorer's token transfer listing.
#[derive(Clone)]
pub struct ExplorerClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    page_size: u32,
}

impl ExplorerClient {
    pub fn new(config: &TriggerConfig) -> Result<Self, ServerError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            log_warn!(
                "{} is not set, explorer requests will be sent without an API key",
                config.api_key_env
            );
        }

        Ok(Self {
            http,
            url: config.explorer_url.clone(),
            api_key,
            page_size: config.page_size,
        })
    }

    /// Latest transfers first.
    pub async fn fetch_transfers(&self, address: &str) -> Result<TransferPage, ServerError> {
        let page_size = self.page_size.to_string();
        let mut request = self
            .http
            .get(&self.url)
            .query(&[
                ("address", address),
                ("page", "1"),
                ("page_size", page_size.as_str()),
                ("sort_by", "block_time"),
                ("sort_order", "desc"),
            ])
            .header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("token", key);
        }

        let response: TransferResponse = request.send().await?.error_for_status()?.json().await?;
        parse_response(response, address)
    }
}

fn parse_response(response: TransferResponse, address: &str) -> Result<TransferPage, ServerError> {
    if !response.success {
        return Err(ServerError::ExplorerResponse(
            "explorer reported an unsuccessful response".to_string(),
        ));
    }

    let metadata = response.metadata.unwrap_or_default();
    Ok(TransferPage {
        records: response.data.unwrap_or_default(),
        token_info: TokenInfo::from_metadata(metadata.tokens.get(address)),
    })
}

/// Signatures already turned into moves. Holds at most `capacity` entries;
/// the oldest are forgotten first.
#[derive(Debug)]
pub struct KnownTransactions {
    signatures: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl KnownTransactions {
    pub fn new(capacity: usize) -> Self {
        Self {
            signatures: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.signatures.contains(signature)
    }

    /// Returns true if the signature was not known yet.
    pub fn insert(&mut self, signature: &str) -> bool {
        if self.contains(signature) {
            return false;
        }
        if self.order.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.signatures.remove(&oldest);
        }
        self.signatures.insert(signature.to_string());
        self.order.push_back(signature.to_string());
        true
    }
}

/// Turns explorer transfers into pending moves, one per unseen signature.
/// Shared by the background poller and the HTTP route, so a transfer is
/// never counted twice.
#[derive(Clone)]
pub struct TransactionFeed {
    client: ExplorerClient,
    known: Arc<Mutex<KnownTransactions>>,
    session: SimulationSession,
}

impl TransactionFeed {
    pub fn new(client: ExplorerClient, session: SimulationSession, capacity: usize) -> Self {
        Self {
            client,
            known: Arc::new(Mutex::new(KnownTransactions::new(capacity))),
            session,
        }
    }

    pub async fn poll(&self, address: &str) -> Result<FeedReport, ServerError> {
        let page = self.client.fetch_transfers(address).await?;
        Ok(self.ingest(page).await)
    }

    pub async fn ingest(&self, page: TransferPage) -> FeedReport {
        let transactions: Vec<TransactionView> = {
            let mut known = self.known.lock().await;
            page.records
                .into_iter()
                .map(|record| TransactionView {
                    is_new: known.insert(&record.trans_id),
                    signature: record.trans_id,
                    time: record.time,
                    from: record.from_address,
                    to: record.to_address,
                    amount: record.value,
                })
                .collect()
        };

        let new_count = transactions.iter().filter(|tx| tx.is_new).count();
        if new_count > 0 {
            let pending = self.session.enqueue_move(new_count as u64).await;
            log!("{} new transfers, {} moves pending", new_count, pending);
        }

        FeedReport {
            transactions,
            new_count,
            token_info: page.token_info,
        }
    }
}

/// Background poll of the configured token. Failures are logged and the
/// next interval tries again.
pub async fn run_poller(feed: TransactionFeed, address: String, interval: Duration) {
    log!("Polling transfers for {} every {}ms", address, interval.as_millis());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = feed.poll(&address).await {
            log_warn!("Transfer poll failed: {}", e);
        }
    }
}

/// Grants `moves` every `interval`, independent of any transfers.
pub async fn run_timer(session: SimulationSession, interval: Duration, moves: u64) {
    log!("Timer trigger: {} moves every {}ms", moves, interval.as_millis());
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        session.enqueue_move(moves).await;
    }
}
