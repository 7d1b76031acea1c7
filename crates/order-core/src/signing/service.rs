//! Account-keyed signing services.
//!
//! The pipeline never holds private keys itself. It asks a [`SigningService`]
//! to sign an order digest on behalf of an account, and the service decides
//! whether it can (and will) do so.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, Signature, B256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::debug;

use crate::api::ChainClient;
use crate::{Error, Result};

/// Environment variable holding comma-separated hex private keys.
pub const PRIVATE_KEYS_ENV: &str = "ORDER_SIGNER_PRIVATE_KEYS";

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 "unauthorized".
const UNAUTHORIZED_CODE: i64 = 4100;

/// A signing capability addressable by account.
///
/// `sign_digest` signs the 32-byte digest as an EIP-191 personal message,
/// which is what the exchange contract recovers against.
#[async_trait]
pub trait SigningService: Send + Sync {
    /// Accounts this service can sign for.
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Sign `digest` with the key of `account`.
    ///
    /// Fails with [`Error::SigningUnavailable`] if the account is unknown or
    /// unreachable and [`Error::SigningRejected`] if the service declines.
    async fn sign_digest(&self, account: Address, digest: B256) -> Result<Signature>;
}

#[async_trait]
impl<T: SigningService + ?Sized> SigningService for Arc<T> {
    async fn accounts(&self) -> Result<Vec<Address>> {
        (**self).accounts().await
    }

    async fn sign_digest(&self, account: Address, digest: B256) -> Result<Signature> {
        (**self).sign_digest(account, digest).await
    }
}

/// In-process keys, indexed by address.
#[derive(Clone, Default)]
pub struct LocalKeyring {
    signers: HashMap<Address, PrivateKeySigner>,
}

impl LocalKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load keys from the `ORDER_SIGNER_PRIVATE_KEYS` environment variable.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let keys = std::env::var(PRIVATE_KEYS_ENV).map_err(|_| Error::Config {
            message: format!("{} environment variable not set", PRIVATE_KEYS_ENV),
        })?;

        Self::from_private_keys(keys.split(',').map(str::trim).filter(|k| !k.is_empty()))
    }

    /// Build a keyring from hex private keys, with or without `0x` prefix.
    pub fn from_private_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut keyring = Self::new();
        for (index, key) in keys.into_iter().enumerate() {
            let key_clean = key.trim().trim_start_matches("0x");
            let signer = PrivateKeySigner::from_str(key_clean).map_err(|_| Error::Config {
                message: format!(
                    "Invalid private key #{} - expected 64 hex characters",
                    index
                ),
            })?;
            keyring.insert(signer);
        }
        Ok(keyring)
    }

    /// Add a signer, replacing any previous key for the same address.
    pub fn insert(&mut self, signer: PrivateKeySigner) -> Address {
        let address = signer.address();
        self.signers.insert(address, signer);
        address
    }

    pub fn contains(&self, account: &Address) -> bool {
        self.signers.contains_key(account)
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

#[async_trait]
impl SigningService for LocalKeyring {
    async fn accounts(&self) -> Result<Vec<Address>> {
        let mut accounts: Vec<Address> = self.signers.keys().copied().collect();
        accounts.sort();
        Ok(accounts)
    }

    async fn sign_digest(&self, account: Address, digest: B256) -> Result<Signature> {
        let signer = self
            .signers
            .get(&account)
            .ok_or_else(|| Error::SigningUnavailable {
                account,
                reason: "no key for account in local keyring".to_string(),
            })?;

        signer
            .sign_message(digest.as_slice())
            .await
            .map_err(|e| Error::SigningRejected {
                account,
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for LocalKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose private keys in debug output
        let addresses: Vec<String> = self.signers.keys().map(|a| a.to_string()).collect();
        f.debug_struct("LocalKeyring")
            .field("accounts", &addresses)
            .finish()
    }
}

/// Node-custodied keys, signed through `eth_sign`.
#[derive(Debug, Clone)]
pub struct RpcSigner {
    client: ChainClient,
}

impl RpcSigner {
    pub fn new(client: ChainClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ChainClient {
        &self.client
    }
}

#[async_trait]
impl SigningService for RpcSigner {
    async fn accounts(&self) -> Result<Vec<Address>> {
        self.client.accounts().await
    }

    async fn sign_digest(&self, account: Address, digest: B256) -> Result<Signature> {
        debug!(%account, %digest, "Requesting eth_sign from node");

        let raw = self
            .client
            .sign(account, digest.as_slice())
            .await
            .map_err(|e| classify_rpc_failure(account, e))?;

        Signature::from_raw(&raw).map_err(|e| Error::SigningRejected {
            account,
            reason: format!("node returned a malformed signature: {}", e),
        })
    }
}

/// Map a failed `eth_sign` call onto the signing error taxonomy.
fn classify_rpc_failure(account: Address, err: Error) -> Error {
    match err {
        Error::Http(e) => Error::SigningUnavailable {
            account,
            reason: e.to_string(),
        },
        Error::Rpc { message, code } => {
            let lower = message.to_lowercase();
            let rejected = code == Some(USER_REJECTED_CODE)
                || ["denied", "rejected", "locked", "unlock"]
                    .iter()
                    .any(|needle| lower.contains(needle));
            let unavailable = code == Some(UNAUTHORIZED_CODE)
                || ["unknown account", "no key", "not found", "failed to request"]
                    .iter()
                    .any(|needle| lower.contains(needle));

            if rejected {
                Error::SigningRejected {
                    account,
                    reason: message,
                }
            } else if unavailable || code.is_none() {
                Error::SigningUnavailable {
                    account,
                    reason: message,
                }
            } else {
                Error::SigningRejected {
                    account,
                    reason: message,
                }
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::digest::{eth_signed_message_hash, hash_order};
    use crate::signing::OrderSigner;
    use crate::types::{Order, OrderSide, DEFAULT_ORDER_LIFETIME};
    use alloy_primitives::address;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    // Well-known development keys (DO NOT USE IN PRODUCTION)
    const KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const ADDRESS_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn keyring() -> LocalKeyring {
        LocalKeyring::from_private_keys([KEY_0, KEY_1]).unwrap()
    }

    #[test]
    fn test_keyring_from_keys() {
        let keyring = keyring();
        assert_eq!(keyring.len(), 2);
        assert!(keyring.contains(&ADDRESS_0.parse().unwrap()));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let result = LocalKeyring::from_private_keys(["0x1234"]);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_debug_does_not_expose_key() {
        let debug_str = format!("{:?}", keyring());

        assert!(debug_str.contains("LocalKeyring"));
        assert!(!debug_str.contains("ac0974bec39a17e36ba4a6b4d238ff944bacb478"));
        assert!(!debug_str.contains("59c6995e998f97a5a0044966f0945389dc9e86da"));
    }

    #[tokio::test]
    async fn test_keyring_accounts_sorted() {
        let accounts = keyring().accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts[0] < accounts[1]);
    }

    #[tokio::test]
    async fn test_keyring_signature_recovers_account() {
        let keyring = keyring();
        let account: Address = ADDRESS_0.parse().unwrap();
        let digest = B256::repeat_byte(0x42);

        let signature = keyring.sign_digest(account, digest).await.unwrap();

        let recovered = signature
            .recover_address_from_prehash(&eth_signed_message_hash(digest))
            .unwrap();
        assert_eq!(recovered, account);
        assert_eq!(signature.as_bytes().len(), 65);
    }

    #[tokio::test]
    async fn test_keyring_unknown_account() {
        let err = keyring()
            .sign_digest(Address::repeat_byte(0x11), B256::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SigningUnavailable { .. }));
    }

    #[test]
    fn test_arc_service_delegates() {
        let shared: Arc<dyn SigningService> = Arc::new(keyring());
        let accounts = tokio_test::block_on(shared.accounts()).unwrap();
        assert_eq!(accounts.len(), 2);
    }

    #[test]
    fn test_classify_user_rejection() {
        let err = classify_rpc_failure(
            Address::ZERO,
            Error::Rpc {
                message: "MetaMask Message Signature: User denied message signature.".to_string(),
                code: Some(4001),
            },
        );
        assert!(matches!(err, Error::SigningRejected { .. }));
    }

    #[test]
    fn test_classify_locked_account() {
        let err = classify_rpc_failure(
            Address::ZERO,
            Error::Rpc {
                message: "authentication needed: password or unlock".to_string(),
                code: Some(-32000),
            },
        );
        assert!(matches!(err, Error::SigningRejected { .. }));
    }

    #[test]
    fn test_classify_unknown_account() {
        let err = classify_rpc_failure(
            Address::ZERO,
            Error::Rpc {
                message: "unknown account".to_string(),
                code: Some(-32000),
            },
        );
        assert!(matches!(err, Error::SigningUnavailable { .. }));

        let err = classify_rpc_failure(
            Address::ZERO,
            Error::Rpc {
                message: "The requested account has not been authorized".to_string(),
                code: Some(4100),
            },
        );
        assert!(matches!(err, Error::SigningUnavailable { .. }));
    }

    #[test]
    fn test_classify_http_status_failure() {
        let err = classify_rpc_failure(
            Address::ZERO,
            Error::Rpc {
                message: "RPC request failed: 502 Bad Gateway".to_string(),
                code: None,
            },
        );
        assert!(err.is_recoverable());
    }

    /// Local JSON-RPC node that answers exactly one request with `result`.
    /// The handle yields the raw HTTP request it received.
    async fn single_response_node(result: serde_json::Value) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_http_request(&mut socket).await;

            let body = serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    async fn read_http_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Signature bytes as a node would return them, with v = 27/28.
    async fn node_signature(key: &str, digest: B256) -> (Address, Vec<u8>) {
        let signer = PrivateKeySigner::from_str(key).unwrap();
        let signature = signer.sign_message(digest.as_slice()).await.unwrap();
        (signer.address(), signature.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_rpc_signer_decodes_node_signature() {
        let digest = B256::repeat_byte(0x42);
        let (account, raw) = node_signature(KEY_1, digest).await;
        assert!(matches!(raw[64], 27 | 28));

        let (url, node) = single_response_node(format!("0x{}", hex::encode(&raw)).into()).await;
        let signature = RpcSigner::new(ChainClient::new(url))
            .sign_digest(account, digest)
            .await
            .unwrap();

        let request = node.await.unwrap().to_lowercase();
        assert!(request.contains("eth_sign"));
        assert!(request.contains(&hex::encode(digest)));
        assert!(request.contains(&hex::encode(account)));

        let recovered = signature
            .recover_address_from_prehash(&eth_signed_message_hash(digest))
            .unwrap();
        assert_eq!(recovered, account);
    }

    #[tokio::test]
    async fn test_rpc_signer_accepts_zero_based_v() {
        let sender = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let order = Order::builder()
            .sender(sender)
            .matcher(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"))
            .pair(
                address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
                address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            )
            .matcher_fee_asset(address!("5FbDB2315678afecb367f032d93F642f64180aa3"))
            .amount(350_000_000)
            .price(2_100_000)
            .matcher_fee(350_000)
            .nonce(1_570_752_916_653)
            .expires_in(DEFAULT_ORDER_LIFETIME)
            .side(OrderSide::Buy)
            .build()
            .unwrap();
        let digest = hash_order(&order);

        let (account, mut raw) = node_signature(KEY_1, digest).await;
        assert_eq!(account, sender);
        // Ganache-style nodes report the recovery id as 0/1
        raw[64] -= 27;

        let (url, node) = single_response_node(format!("0x{}", hex::encode(&raw)).into()).await;
        let signed = OrderSigner::new(RpcSigner::new(ChainClient::new(url)))
            .sign_order(order.clone())
            .await
            .unwrap();
        node.await.unwrap();

        assert_eq!(signed.order, order);
        assert_eq!(signed.digest, digest);
        assert_eq!(signed.recover_signer().unwrap(), sender);
        assert!(matches!(signed.signature.as_bytes()[64], 27 | 28));
    }

    #[tokio::test]
    async fn test_rpc_signer_rejects_short_signature() {
        let digest = B256::repeat_byte(0x42);
        let (account, raw) = node_signature(KEY_1, digest).await;

        let (url, node) =
            single_response_node(format!("0x{}", hex::encode(&raw[..64])).into()).await;
        let err = RpcSigner::new(ChainClient::new(url))
            .sign_digest(account, digest)
            .await
            .unwrap_err();
        node.await.unwrap();

        assert!(matches!(err, Error::SigningRejected { account: a, .. } if a == account));
    }

    #[tokio::test]
    async fn test_rpc_signer_unreachable_node() {
        let signer = RpcSigner::new(ChainClient::new("http://127.0.0.1:1"));
        let err = signer
            .sign_digest(Address::ZERO, B256::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SigningUnavailable { .. }));
    }
}
