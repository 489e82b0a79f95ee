//! Legacy and EIP-155 transactions.
//!
//! A [`Transaction`] holds the unsigned fields and can be freely edited.
//! Signing produces a [`SignedTransaction`], which is immutable: its `v`
//! always agrees with its chain id and its `r`/`s` are valid scalars.

use alloy_primitives::U256;
use crypto_utils::keccak256;
use crypto_utils::secp256k1::{self, RecoverableSignature};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::chain::ChainId;
use crate::error::EthError;
use crate::rlp;
use crate::utils::{encode_hex_prefixed, to_quantity};

/// Offset added to the recovery id for pre-EIP-155 signatures.
const LEGACY_V_OFFSET: u64 = 27;

/// Offset added to `recovery_id + 2 * chain_id` for EIP-155 signatures.
const EIP155_V_OFFSET: u64 = 35;

/// How the signing hash commits to a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningMode {
    /// Replay-protected: the chain id is part of the signing hash and `v`.
    Eip155(ChainId),
    /// Pre-EIP-155; valid on every chain.
    Legacy,
}

impl SigningMode {
    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            SigningMode::Eip155(id) => Some(*id),
            SigningMode::Legacy => None,
        }
    }
}

impl From<ChainId> for SigningMode {
    fn from(id: ChainId) -> Self {
        SigningMode::Eip155(id)
    }
}

/// An unsigned legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    /// [`Address::ContractDeployment`] creates a contract from `data`.
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

/// A signed transaction, ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: Transaction,
    chain_id: Option<ChainId>,
    signature: RecoverableSignature,
}

/// The JSON transaction object taken by `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub data: String,
}

impl Transaction {
    pub fn new(
        nonce: U256,
        gas_price: U256,
        gas_limit: U256,
        to: Address,
        value: U256,
        data: Vec<u8>,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
        }
    }

    /// The six payload fields, RLP-encoded individually.
    fn field_items(&self) -> Vec<Vec<u8>> {
        let mut items = vec![Vec::new(); 6];
        rlp::encode_uint(&self.nonce, &mut items[0]);
        rlp::encode_uint(&self.gas_price, &mut items[1]);
        rlp::encode_uint(&self.gas_limit, &mut items[2]);
        rlp::encode_bytes(self.to.as_bytes(), &mut items[3]);
        rlp::encode_uint(&self.value, &mut items[4]);
        rlp::encode_bytes(&self.data, &mut items[5]);
        items
    }

    /// The signing payload: RLP `[nonce, gasPrice, gasLimit, to, value,
    /// data]`, extended with `[chainId, 0, 0]` when a chain id is given.
    pub fn encode_for_signing(&self, chain_id: Option<ChainId>) -> Vec<u8> {
        let mut items = self.field_items();
        if let Some(id) = chain_id {
            let mut chain = Vec::new();
            rlp::encode_uint(&U256::from(id.value()), &mut chain);
            items.push(chain);
            items.push(vec![alloy_rlp::EMPTY_STRING_CODE]);
            items.push(vec![alloy_rlp::EMPTY_STRING_CODE]);
        }
        rlp::encode_list(&items)
    }

    /// Keccak-256 of [`encode_for_signing`](Self::encode_for_signing).
    pub fn signing_hash(&self, chain_id: Option<ChainId>) -> [u8; 32] {
        keccak256(&self.encode_for_signing(chain_id))
    }

    /// Signs with a raw secp256k1 private key.
    ///
    /// The signature is RFC 6979 deterministic and low-S. It is checked by
    /// recovering the signer before it is returned.
    pub fn sign(&self, private_key: &[u8; 32], mode: SigningMode) -> Result<SignedTransaction, EthError> {
        let chain_id = mode.chain_id();
        if let Some(id) = chain_id {
            v_for(0, Some(id))?;
        }

        let hash = self.signing_hash(chain_id);
        let signature = secp256k1::sign_recoverable(&hash, private_key)?;
        if signature.v > 1 {
            return Err(EthError::SigningError(format!(
                "unexpected recovery id {}",
                signature.v
            )));
        }

        let expected = secp256k1::private_to_public(private_key)?;
        let recovered = secp256k1::recover_public_key(&hash, &signature)?;
        if recovered != expected {
            return Err(EthError::SigningError(
                "recovered key does not match signer".into(),
            ));
        }

        tracing::debug!(nonce = %self.nonce, chain_id = ?chain_id.map(|c| c.value()), "signed transaction");

        Ok(SignedTransaction {
            tx: self.clone(),
            chain_id,
            signature,
        })
    }

    /// The `eth_call`/`eth_estimateGas` parameter object.
    pub fn to_parameters(&self, from: Option<Address>) -> TransactionParameters {
        TransactionParameters {
            from: from.map(|a| encode_hex_prefixed(a.as_bytes())),
            to: match self.to {
                Address::Normal(raw) => Some(encode_hex_prefixed(&raw)),
                Address::ContractDeployment => None,
            },
            gas: Some(to_quantity(self.gas_limit)),
            gas_price: Some(to_quantity(self.gas_price)),
            value: Some(to_quantity(self.value)),
            data: encode_hex_prefixed(&self.data),
        }
    }
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// The chain id the signature commits to; `None` for legacy signatures.
    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id
    }

    pub fn signature(&self) -> &RecoverableSignature {
        &self.signature
    }

    /// `v` as it appears on the wire: 27/28, or `35 + 2 * chainId` + 0/1.
    pub fn v(&self) -> u64 {
        // Range checked when the transaction was built.
        v_for(self.signature.v, self.chain_id).unwrap_or_default()
    }

    pub fn r(&self) -> U256 {
        U256::from_be_bytes(self.signature.r)
    }

    pub fn s(&self) -> U256 {
        U256::from_be_bytes(self.signature.s)
    }

    /// Wire format: RLP `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut items = self.tx.field_items();
        for value in [U256::from(self.v()), self.r(), self.s()] {
            let mut item = Vec::new();
            rlp::encode_uint(&value, &mut item);
            items.push(item);
        }
        rlp::encode_list(&items)
    }

    /// The signing payload this signature was made over.
    pub fn encode_for_signing(&self) -> Vec<u8> {
        self.tx.encode_for_signing(self.chain_id)
    }

    /// Keccak-256 of the wire encoding.
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.encode())
    }

    /// `0x`-hex wire encoding for `eth_sendRawTransaction`.
    pub fn to_raw_hex(&self) -> String {
        encode_hex_prefixed(&self.encode())
    }

    /// Recovers the sender using the embedded chain id.
    pub fn recover_sender(&self) -> Result<Address, EthError> {
        let hash = self.tx.signing_hash(self.chain_id);
        let public = secp256k1::recover_public_key(&hash, &self.signature)?;
        Address::from_public_key(&public)
    }

    /// Recovers the sender assuming a caller-supplied chain id.
    ///
    /// Fails with `InvalidSignature` when `v` is not valid for that chain.
    pub fn recover_sender_for_chain(&self, chain_id: Option<ChainId>) -> Result<Address, EthError> {
        let recovery_id = recovery_id_for(self.v(), chain_id)?;
        let signature = RecoverableSignature::new(self.signature.r, self.signature.s, recovery_id)?;
        let hash = self.tx.signing_hash(chain_id);
        let public = secp256k1::recover_public_key(&hash, &signature)?;
        Address::from_public_key(&public)
    }

    /// Parses a signed legacy transaction from its wire encoding.
    ///
    /// The chain id is inferred from `v`; malformed RLP, non-canonical
    /// integers and out-of-range signatures are rejected.
    pub fn decode(raw: &[u8]) -> Result<Self, EthError> {
        let items = rlp::decode_flat_list(raw)?;
        let [nonce, gas_price, gas_limit, to, value, data, v, r, s] = items.as_slice() else {
            return Err(EthError::Decoding(format!(
                "signed transaction has {} fields, expected 9",
                items.len()
            )));
        };

        let to = match to.len() {
            0 => Address::ContractDeployment,
            20 => Address::from_slice(to)?,
            other => {
                return Err(EthError::Decoding(format!(
                    "to: expected 0 or 20 bytes, got {other}"
                )))
            }
        };

        let tx = Transaction {
            nonce: rlp::decode_uint(nonce, "nonce")?,
            gas_price: rlp::decode_uint(gas_price, "gasPrice")?,
            gas_limit: rlp::decode_uint(gas_limit, "gasLimit")?,
            to,
            value: rlp::decode_uint(value, "value")?,
            data: data.to_vec(),
        };

        let v = rlp::decode_uint(v, "v")?;
        if v.bit_len() > 64 {
            return Err(EthError::InvalidSignature(format!("v {v} out of range")));
        }
        let (recovery_id, chain_id) = split_v(v.as_limbs()[0])?;

        let signature = RecoverableSignature::new(
            scalar_bytes(r, "r")?,
            scalar_bytes(s, "s")?,
            recovery_id,
        )?;

        Ok(SignedTransaction {
            tx,
            chain_id,
            signature,
        })
    }

    /// Parses `0x`-hex wire encoding.
    pub fn decode_hex(raw: &str) -> Result<Self, EthError> {
        Self::decode(&crate::utils::decode_hex(raw)?)
    }
}

impl Transaction {
    /// Parses a signed transaction and returns it with its signature; see
    /// [`SignedTransaction::decode`].
    pub fn decode_raw(raw: &[u8]) -> Result<SignedTransaction, EthError> {
        SignedTransaction::decode(raw)
    }
}

fn v_for(recovery_id: u8, chain_id: Option<ChainId>) -> Result<u64, EthError> {
    let recovery_id = u64::from(recovery_id);
    match chain_id {
        None => Ok(LEGACY_V_OFFSET + recovery_id),
        Some(id) => id
            .value()
            .checked_mul(2)
            .and_then(|v| v.checked_add(EIP155_V_OFFSET + recovery_id))
            .ok_or_else(|| EthError::InvalidChainId(format!("{} too large for v", id.value()))),
    }
}

/// Splits a wire `v` into the recovery id and the chain id it implies.
fn split_v(v: u64) -> Result<(u8, Option<ChainId>), EthError> {
    match v {
        27 | 28 => Ok(((v - LEGACY_V_OFFSET) as u8, None)),
        v if v >= EIP155_V_OFFSET => {
            let body = v - EIP155_V_OFFSET;
            Ok(((body % 2) as u8, Some(ChainId(body / 2))))
        }
        other => Err(EthError::InvalidSignature(format!("v {other} is not 27, 28 or >= 35"))),
    }
}

fn recovery_id_for(v: u64, chain_id: Option<ChainId>) -> Result<u8, EthError> {
    let base = v_for(0, chain_id)?;
    match v.checked_sub(base) {
        Some(id @ 0..=1) => Ok(id as u8),
        _ => Err(EthError::InvalidSignature(format!(
            "v {v} is not valid for chain {}",
            chain_id.map_or_else(|| "legacy".to_string(), |c| c.value().to_string())
        ))),
    }
}

fn scalar_bytes(bytes: &[u8], field: &str) -> Result<[u8; 32], EthError> {
    let value = rlp::decode_uint(bytes, field)?;
    Ok(value.to_be_bytes::<32>())
}
