//! Fungible token accounts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cacheable::Cacheable;
use crate::error::{TypesError, TypesResult};
use crate::value::PactValue;

/// Name of the standard fungible token interface
pub const FUNGIBLE_V2: &str = "fungible-v2";

/// An account of a `fungible-v2` token on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FungibleAccount {
    /// Network
    pub network: String,
    /// Chain
    pub chain: String,
    /// Token module
    pub module: String,
    /// Account name
    #[serde(default)]
    pub account: Option<String>,
    /// Whether the token reported details for the account
    #[serde(default)]
    pub found: bool,
    /// Balance; absent when the account does not exist or its balance does
    /// not fit a [`Decimal`]
    #[serde(default)]
    pub balance: Option<Decimal>,
    /// Account guard
    #[serde(default)]
    pub guard: Option<Value>,
}

impl FungibleAccount {
    /// Account with no details yet
    pub fn new(network: impl Into<String>, chain: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            chain: chain.into(),
            module: module.into(),
            account: None,
            found: false,
            balance: None,
            guard: None,
        }
    }

    /// Build from one `{module, account, result}` entry of the details
    /// probe. `result` is the token's `details` object, or `{}` when the
    /// account does not exist.
    pub fn from_details(network: &str, chain: &str, entry: &Value) -> TypesResult<Self> {
        let module = entry
            .get("module")
            .and_then(Value::as_str)
            .ok_or_else(|| TypesError::MalformedValue(format!("account details: {}", entry)))?;

        let mut account = Self::new(network, chain, module);
        account.account = entry
            .get("account")
            .and_then(Value::as_str)
            .map(str::to_string);

        let Some(result) = entry.get("result") else {
            return Ok(account);
        };
        if let Some(balance) = result.get("balance") {
            account.found = true;
            account.balance = PactValue::from_json(balance).as_decimal();
            account.guard = result.get("guard").cloned();
            if let Some(name) = result.get("account").and_then(Value::as_str) {
                account.account = Some(name.to_string());
            }
        }
        Ok(account)
    }

    /// Whether the account exists on its chain
    pub fn exists(&self) -> bool {
        self.found
    }

    /// Key under which an account is cached
    pub fn cache_key_for(network: &str, chain: &str, module: &str, account: &str) -> String {
        format!("fungible-v2@{}${}${}${}", network, chain, module, account)
    }
}

impl Cacheable for FungibleAccount {
    fn cache_key(&self) -> String {
        Self::cache_key_for(
            &self.network,
            &self.chain,
            &self.module,
            self.account.as_deref().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_details_existing() {
        let account = FungibleAccount::from_details(
            "mainnet01",
            "0",
            &json!({
                "module": "coin",
                "account": "alice",
                "result": {
                    "account": "alice",
                    "balance": 12.5,
                    "guard": { "keys": ["abcd"], "pred": "keys-all" }
                }
            }),
        )
        .unwrap();
        assert!(account.exists());
        assert_eq!(account.balance, Some(Decimal::new(125, 1)));
        assert_eq!(account.guard.unwrap()["pred"], "keys-all");
    }

    #[test]
    fn test_from_details_tagged_balance() {
        let account = FungibleAccount::from_details(
            "mainnet01",
            "0",
            &json!({
                "module": "coin",
                "account": "bob",
                "result": { "account": "bob", "balance": { "decimal": "0.000000000001" } }
            }),
        )
        .unwrap();
        assert_eq!(account.balance, Some(Decimal::new(1, 12)));
    }

    #[test]
    fn test_from_details_out_of_range_balance_still_exists() {
        let account = FungibleAccount::from_details(
            "mainnet01",
            "0",
            &json!({
                "module": "coin",
                "account": "whale",
                "result": {
                    "account": "whale",
                    "balance": { "decimal": "123456789012345678901234567890.5" }
                }
            }),
        )
        .unwrap();
        assert!(account.exists());
        assert_eq!(account.balance, None);
    }

    #[test]
    fn test_from_details_missing_account() {
        let account = FungibleAccount::from_details(
            "mainnet01",
            "2",
            &json!({ "module": "coin", "account": "ghost", "result": {} }),
        )
        .unwrap();
        assert!(!account.exists());
        assert_eq!(account.account.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_from_details_without_module() {
        let result = FungibleAccount::from_details("n", "0", &json!({ "account": "a" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_key() {
        let mut account = FungibleAccount::new("mainnet01", "3", "coin");
        account.account = Some("alice".to_string());
        assert_eq!(account.cache_key(), "fungible-v2@mainnet01$3$coin$alice");
    }

    #[test]
    fn test_cache_roundtrip_preserves_balance_precision() {
        let mut account = FungibleAccount::new("n", "0", "coin");
        account.balance = Some(Decimal::new(123456789012345678, 12));
        let back: FungibleAccount =
            serde_json::from_value(serde_json::to_value(&account).unwrap()).unwrap();
        assert_eq!(back.balance, account.balance);
    }
}
