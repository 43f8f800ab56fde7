//! HTTP-backed collaborator clients.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::traits::{ChainOracle, ProofProvider};
use super::CollaboratorError;
use crate::types::{ProofBundle, ProofInputs};

/// Chain-conditions client against a JSON oracle service
pub struct HttpChainOracle {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct GasResponse {
    gas_price_gwei: u64,
}

#[derive(Deserialize)]
struct CongestionResponse {
    congestion_percent: u8,
}

impl HttpChainOracle {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChainOracle for HttpChainOracle {
    async fn gas_price_gwei(&self, chain: &str) -> Result<u64, CollaboratorError> {
        let url = format!("{}/v1/chains/{}/gas", self.base_url, chain);
        debug!(%url, "fetching gas price");
        let resp: GasResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.gas_price_gwei)
    }

    async fn congestion_percent(&self, chain: &str) -> Result<u8, CollaboratorError> {
        let url = format!("{}/v1/chains/{}/congestion", self.base_url, chain);
        debug!(%url, "fetching congestion");
        let resp: CongestionResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if resp.congestion_percent > 100 {
            return Err(CollaboratorError::BadResponse(format!(
                "congestion out of range: {}",
                resp.congestion_percent
            )));
        }
        Ok(resp.congestion_percent)
    }
}

/// Proof-service client. The service loads its circuit artifacts on `init`;
/// proving against an uninitialized service is rejected locally.
pub struct HttpProofProvider {
    client: reqwest::Client,
    base_url: String,
    ready: AtomicBool,
}

impl HttpProofProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            ready: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ProofProvider for HttpProofProvider {
    async fn init(&self) -> Result<(), CollaboratorError> {
        let url = format!("{}/v1/prove/init", self.base_url);
        debug!(%url, "initializing proof service");
        self.client
            .post(&url)
            .send()
            .await?
            .error_for_status()?;
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn prove(&self, inputs: &ProofInputs) -> Result<ProofBundle, CollaboratorError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(CollaboratorError::ProverNotInitialized);
        }
        let url = format!("{}/v1/prove", self.base_url);
        debug!(%url, amount = inputs.amount, tier = inputs.tier, "requesting proof");
        let bundle: ProofBundle = self
            .client
            .post(&url)
            .json(inputs)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if bundle.public_signals.is_empty() {
            return Err(CollaboratorError::BadResponse(
                "proof bundle carries no public signals".into(),
            ));
        }
        Ok(bundle)
    }
}
