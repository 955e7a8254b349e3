//! Multi-chain query engine
//!
//! Reads that span chains or are worth remembering: module metadata,
//! fungible balances and transaction lookups through block payloads. Every
//! read checks the cache first and backfills it after a fetch.

use futures::future::try_join_all;
use pact_types::{
    BlockHeader, BlockPayload, Cacheable, Command, CommandResponse, FungibleAccount,
    ModuleMetadata, FUNGIBLE_V2,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::builder::generate_nonce;
use crate::cache::{Cache, ACCOUNT_TTL};
use crate::client::PactClient;
use crate::payload::PayloadIndex;
use crate::SdkError;

/// Gas limit of the account details probe
pub const ACCOUNT_PROBE_GAS_LIMIT: u64 = 150_000;

/// Cached queries across the chains of a network
pub struct ChainwebQueryService {
    client: Arc<PactClient>,
    cache: Cache,
}

impl ChainwebQueryService {
    /// Create a service over a client and a cache handle
    pub fn new(client: Arc<PactClient>, cache: Cache) -> Self {
        Self { client, cache }
    }

    /// The underlying client
    pub fn client(&self) -> &Arc<PactClient> {
        &self.client
    }

    /// The cache handle
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    // ==================== Modules ====================

    /// Metadata of several modules on one chain, in request order.
    ///
    /// Served from the cache when every module is cached; otherwise one
    /// `describe-module` probe fetches all of them.
    pub async fn module_metadata_batch(
        &self,
        chain: &str,
        modules: &[String],
    ) -> Result<Vec<ModuleMetadata>, SdkError> {
        if modules.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = modules.iter().find(|m| !is_valid_module_name(m)) {
            return Err(SdkError::InvalidArgument(format!("module name: {:?}", bad)));
        }

        let network = self.client.cache_network();
        let keys: Vec<String> = modules
            .iter()
            .map(|m| ModuleMetadata::cache_key_for(&network, chain, m))
            .collect();
        if let Some(cached) = self.cached_all::<ModuleMetadata>(&keys).await {
            debug!("module metadata for {} modules on chain {} from cache", modules.len(), chain);
            return Ok(cached);
        }

        let code = modules
            .iter()
            .map(|m| {
                format!(
                    "{{ 'module: \"{m}\", 'metadata: (try {{}} (describe-module \"{m}\")) }}",
                    m = m
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let code = format!("[{}]", code);

        let response = self.probe(chain, &code, None, None).await?;
        if !response.is_success() {
            return Err(SdkError::Execution(Box::new(response)));
        }

        let entries = response
            .result
            .data
            .as_ref()
            .and_then(Value::as_array)
            .ok_or_else(|| SdkError::Protocol("module probe did not return a list".to_string()))?;

        let mut results = Vec::with_capacity(modules.len());
        for module in modules {
            let entry = entries
                .iter()
                .find(|e| e.get("module").and_then(Value::as_str) == Some(module.as_str()))
                .ok_or_else(|| SdkError::Protocol(format!("module probe omitted {}", module)))?;
            let description = entry.get("metadata").unwrap_or(&Value::Null);
            let metadata = ModuleMetadata::from_description(&network, chain, module, description)?;
            self.cache.set_item(&metadata, None).await?;
            results.push(metadata);
        }
        self.cache.flush().await;
        Ok(results)
    }

    /// Metadata of one module
    pub async fn module_metadata(
        &self,
        chain: &str,
        module: &str,
    ) -> Result<ModuleMetadata, SdkError> {
        let mut results = self
            .module_metadata_batch(chain, &[module.to_string()])
            .await?;
        results
            .pop()
            .ok_or_else(|| SdkError::Protocol(format!("no metadata for {}", module)))
    }

    /// Whether a module is deployed on a chain
    pub async fn module_exists(&self, chain: &str, module: &str) -> Result<bool, SdkError> {
        Ok(self.module_metadata(chain, module).await?.exists)
    }

    // ==================== Accounts ====================

    /// Details of every account in every `fungible-v2` module among
    /// `modules`. Modules that are missing or not fungible are skipped.
    /// Results are ordered by account, then module.
    pub async fn account_details_batch(
        &self,
        chain: &str,
        modules: &[String],
        accounts: &[String],
        ignore_cache: bool,
    ) -> Result<Vec<FungibleAccount>, SdkError> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }
        let fungible: Vec<String> = self
            .module_metadata_batch(chain, modules)
            .await?
            .into_iter()
            .filter(|m| m.implements(FUNGIBLE_V2))
            .map(|m| m.name)
            .collect();
        if fungible.is_empty() {
            return Ok(Vec::new());
        }

        let network = self.client.cache_network();
        if !ignore_cache {
            let keys: Vec<String> = accounts
                .iter()
                .flat_map(|a| fungible.iter().map(move |m| (m, a)))
                .map(|(m, a)| FungibleAccount::cache_key_for(&network, chain, m, a))
                .collect();
            if let Some(cached) = self.cached_all::<FungibleAccount>(&keys).await {
                debug!("{} account entries on chain {} from cache", cached.len(), chain);
                return Ok(cached);
            }
        }

        let code = account_probe_code(&generate_nonce(), &fungible);
        let response = self
            .probe(
                chain,
                &code,
                Some(json!({ "accounts": accounts })),
                Some(ACCOUNT_PROBE_GAS_LIMIT),
            )
            .await?;
        if !response.is_success() {
            warn!(
                "Account probe failed on chain {}: {:?}",
                chain,
                response.result.error.as_ref().map(|e| &e.message)
            );
            return Ok(Vec::new());
        }

        let rows = response
            .result
            .data
            .as_ref()
            .and_then(Value::as_array)
            .filter(|rows| rows.len() == accounts.len())
            .ok_or_else(|| SdkError::Protocol("account probe returned the wrong shape".to_string()))?;

        let mut results = Vec::with_capacity(accounts.len() * fungible.len());
        for (account, row) in accounts.iter().zip(rows) {
            let entries = row
                .as_array()
                .filter(|entries| entries.len() == fungible.len())
                .ok_or_else(|| SdkError::Protocol(format!("account probe row for {}", account)))?;
            for (module, entry) in fungible.iter().zip(entries) {
                let mut details = FungibleAccount::from_details(&network, chain, entry)?;
                details.module = module.clone();
                details.account = Some(account.clone());
                self.cache.set_item(&details, Some(ACCOUNT_TTL)).await?;
                results.push(details);
            }
        }
        self.cache.flush().await;
        Ok(results)
    }

    /// Details of one account in one module
    pub async fn account_details(
        &self,
        chain: &str,
        module: &str,
        account: &str,
    ) -> Result<Option<FungibleAccount>, SdkError> {
        let results = self
            .account_details_batch(chain, &[module.to_string()], &[account.to_string()], false)
            .await?;
        Ok(results.into_iter().next())
    }

    /// Details of one account on every recognized chain
    pub async fn account_details_all_chains(
        &self,
        module: &str,
        account: &str,
    ) -> Result<Vec<FungibleAccount>, SdkError> {
        self.account_details_batch_all_chains(&[module.to_string()], &[account.to_string()])
            .await
    }

    /// Batched account details on every recognized chain, concatenated.
    /// No order is guaranteed across chains.
    pub async fn account_details_batch_all_chains(
        &self,
        modules: &[String],
        accounts: &[String],
    ) -> Result<Vec<FungibleAccount>, SdkError> {
        let chains = self.client.recognized_chains()?;
        let per_chain = try_join_all(
            chains
                .iter()
                .map(|chain| self.account_details_batch(chain, modules, accounts, false)),
        )
        .await?;
        Ok(per_chain.into_iter().flatten().collect())
    }

    // ==================== Transactions ====================

    /// The command behind a finalized response
    pub async fn fetch_transaction_for_response(
        &self,
        response: &CommandResponse,
    ) -> Result<Option<Command>, SdkError> {
        let (Some(chain), Some(block_hash), Some(request_key)) =
            (response.chain_id(), response.block_hash(), response.req_key.as_deref())
        else {
            return Ok(None);
        };
        self.fetch_transaction_in_block(chain, block_hash, request_key)
            .await
    }

    /// Poll a request key and fetch its command from the including block
    pub async fn fetch_transaction(
        &self,
        chain: &str,
        request_key: &str,
    ) -> Result<Option<Command>, SdkError> {
        let Some(response) = self.client.poll_one(chain, request_key).await? else {
            return Ok(None);
        };
        let Some(block_hash) = response.block_hash() else {
            return Ok(None);
        };
        self.fetch_transaction_in_block(chain, block_hash, request_key)
            .await
    }

    /// Fetch a command from a known block
    pub async fn fetch_transaction_in_block(
        &self,
        chain: &str,
        block_hash: &str,
        request_key: &str,
    ) -> Result<Option<Command>, SdkError> {
        let Some(index) = self.payload_index(chain, block_hash).await? else {
            return Ok(None);
        };
        index.transaction(request_key).await
    }

    /// Decoded payload of a block, fetched through the cache.
    ///
    /// Each call returns a fresh index that decodes on first access. Hold
    /// on to it when looking up several keys of the same block.
    pub async fn payload_index(
        &self,
        chain: &str,
        block_hash: &str,
    ) -> Result<Option<PayloadIndex>, SdkError> {
        let header_key = BlockHeader::cache_key_for(block_hash);
        let Some(header) = self
            .fetch_and_cache(&header_key, || self.client.block_header(chain, block_hash))
            .await?
        else {
            return Ok(None);
        };

        let payload_key = BlockPayload::cache_key_for(&header.payload_hash);
        let payload = self
            .fetch_and_cache(&payload_key, || {
                self.client.block_payload(chain, &header.payload_hash)
            })
            .await?;
        Ok(payload.map(PayloadIndex::new))
    }

    /// Cache-or-fetch. The fetched item is stored only when its own key
    /// matches `key`.
    pub async fn fetch_and_cache<T, F, Fut>(&self, key: &str, fetch: F) -> Result<Option<T>, SdkError>
    where
        T: Cacheable + Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, SdkError>>,
    {
        if let Some(cached) = self.cache.get_item::<T>(key).await {
            return Ok(Some(cached));
        }
        let Some(item) = fetch().await? else {
            return Ok(None);
        };
        if item.cache_key() == key {
            self.cache.set_item(&item, None).await?;
            self.cache.flush().await;
        } else {
            warn!("Not caching {}: item reports key {}", key, item.cache_key());
        }
        Ok(Some(item))
    }

    async fn cached_all<T: DeserializeOwned>(&self, keys: &[String]) -> Option<Vec<T>> {
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            items.push(self.cache.get_item::<T>(key).await?);
        }
        Some(items)
    }

    async fn probe(
        &self,
        chain: &str,
        code: &str,
        data: Option<Value>,
        gas_limit: Option<u64>,
    ) -> Result<CommandResponse, SdkError> {
        let mut cmd = self.client.generate_exec_command(chain, code, data);
        if let Some(limit) = gas_limit {
            cmd.meta.gas_limit = limit;
        }
        let command = self.client.build_command(cmd, Vec::new())?;
        self.client.local(&command).await
    }
}

/// Whether a name can be spliced into probe code as a string literal and a
/// module reference
fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.%#+&$@<>=^?*!|/~".contains(c))
}

/// Throwaway module whose helpers read `details` for every account of every
/// token, tolerating accounts that do not exist
fn account_probe_code(module_name: &str, modules: &[String]) -> String {
    format!(
        r#"(namespace 'free)
(module {name} T
  (defcap T () true)
  (defun try-get-details (account:string token:module{{fungible-v2}})
    {{ 'module: (format "{{}}" [token]), 'account: account, 'result: (try {{}} (token::details account)) }})
  (defun fetch-accounts (token:module{{fungible-v2}} accounts:[string])
    (map (lambda (account) (try-get-details account token)) accounts))
  (defun fetch-accounts-many (tokens:[module{{fungible-v2}}] accounts:[string])
    (map (lambda (account) (map (lambda (token) (try-get-details account token)) tokens)) accounts)))
(fetch-accounts-many [{tokens}] (read-msg 'accounts))"#,
        name = module_name,
        tokens = modules.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_validation() {
        assert!(is_valid_module_name("coin"));
        assert!(is_valid_module_name("free.my-token"));
        assert!(!is_valid_module_name(""));
        assert!(!is_valid_module_name("coin\")(drop"));
        assert!(!is_valid_module_name("a b"));
    }

    #[test]
    fn test_account_probe_code() {
        let code = account_probe_code("abcXYZ", &["coin".to_string(), "free.tok".to_string()]);
        assert!(code.starts_with("(namespace 'free)\n(module abcXYZ T"));
        assert!(code.contains("(fetch-accounts-many [coin, free.tok] (read-msg 'accounts))"));
        assert!(code.contains("(format \"{}\" [token])"));
    }
}
