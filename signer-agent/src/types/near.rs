//! NEAR protocol primitives: account/key/signature/hash wrappers, actions,
//! transactions, and NEP-461 delegate actions. Borsh layout here is
//! load-bearing for on-chain compatibility and is kept byte-for-byte
//! compatible with nearcore's own wire format.

use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::deserializers::{serde_array_32, serde_array_64};

pub type Nonce = u64;
pub type Gas = u64;
pub type Balance = u128;

#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("Account ID cannot be empty".to_string());
        }
        Ok(AccountId(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PublicKey {
    pub key_type: u8,
    #[serde(with = "serde_array_32")]
    pub key_data: [u8; 32],
}

impl PublicKey {
    pub fn from_ed25519_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            key_type: 0,
            key_data: *bytes,
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(33);
        out.push(self.key_type);
        out.extend_from_slice(&self.key_data);
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Signature {
    pub key_type: u8,
    #[serde(with = "serde_array_64")]
    pub signature_data: [u8; 64],
}

impl Signature {
    pub fn from_ed25519_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            key_type: 0,
            signature_data: *bytes,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CryptoHash(#[serde(with = "serde_array_32")] pub [u8; 32]);

impl CryptoHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

pub(crate) mod serde_balance_as_dec_str {
    use super::Balance;
    use serde::de::{Error as DeError, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &Balance, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    struct BalanceVisitor;

    impl<'de> Visitor<'de> for BalanceVisitor {
        type Value = Balance;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a decimal-string or integer balance")
        }

        fn visit_str<E: DeError>(self, v: &str) -> Result<Balance, E> {
            v.parse::<Balance>().map_err(DeError::custom)
        }
        fn visit_string<E: DeError>(self, v: String) -> Result<Balance, E> {
            self.visit_str(&v)
        }
        fn visit_u64<E: DeError>(self, v: u64) -> Result<Balance, E> {
            Ok(v as Balance)
        }
        fn visit_u128<E: DeError>(self, v: u128) -> Result<Balance, E> {
            Ok(v)
        }
        fn visit_i64<E: DeError>(self, v: i64) -> Result<Balance, E> {
            Ok(v as Balance)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Balance, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BalanceVisitor)
    }
}

pub(crate) mod serde_option_balance_as_dec_str {
    use super::Balance;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Balance>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => super::serde_balance_as_dec_str::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Balance>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Wrapper(#[serde(with = "super::serde_balance_as_dec_str")] Balance);

        Option::<Wrapper>::deserialize(deserializer).map(|opt| opt.map(|w| w.0))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum GlobalContractDeployMode {
    CodeHash,
    AccountId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum GlobalContractIdentifier {
    CodeHash(CryptoHash),
    AccountId(AccountId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallAction {
    pub method_name: String,
    pub args: Vec<u8>,
    pub gas: Gas,
    #[serde(with = "serde_balance_as_dec_str")]
    pub deposit: Balance,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum NearAction {
    CreateAccount,
    DeployContract {
        code: Vec<u8>,
    },
    FunctionCall(Box<FunctionCallAction>),
    Transfer {
        #[serde(with = "serde_balance_as_dec_str")]
        deposit: Balance,
    },
    Stake {
        #[serde(with = "serde_balance_as_dec_str")]
        stake: Balance,
        public_key: PublicKey,
    },
    AddKey {
        public_key: PublicKey,
        access_key: AccessKey,
    },
    DeleteKey {
        public_key: PublicKey,
    },
    DeleteAccount {
        beneficiary_id: AccountId,
    },
    SignedDelegate(Box<SignedDelegate>),
    DeployGlobalContract {
        code: Vec<u8>,
        deploy_mode: GlobalContractDeployMode,
    },
    UseGlobalContract {
        contract_identifier: GlobalContractIdentifier,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessKey {
    pub nonce: Nonce,
    #[serde(deserialize_with = "deserialize_access_key_permission_compat")]
    pub permission: AccessKeyPermission,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AccessKeyPermission {
    FunctionCall(FunctionCallPermission),
    FullAccess,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallPermission {
    #[serde(default, with = "serde_option_balance_as_dec_str")]
    pub allowance: Option<Balance>,
    pub receiver_id: String,
    pub method_names: Vec<String>,
}

/// Accepts both `{"FullAccess":{}}` and `{"FunctionCall":{...}}` JSON shapes,
/// as produced by the host-side TypeScript callers.
fn deserialize_access_key_permission_compat<'de, D>(
    deserializer: D,
) -> Result<AccessKeyPermission, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Outer {
        #[serde(rename = "FullAccess")]
        full_access: Option<serde_json::Value>,
        #[serde(rename = "FunctionCall")]
        function_call: Option<FunctionCallPermission>,
    }

    let outer = Outer::deserialize(deserializer)?;
    if let Some(fc) = outer.function_call {
        return Ok(AccessKeyPermission::FunctionCall(fc));
    }
    if outer.full_access.is_some() {
        return Ok(AccessKeyPermission::FullAccess);
    }
    Err(serde::de::Error::custom(
        "AccessKey.permission must be FullAccess or FunctionCall",
    ))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub signer_id: AccountId,
    pub public_key: PublicKey,
    pub nonce: Nonce,
    pub receiver_id: AccountId,
    pub block_hash: CryptoHash,
    pub actions: Vec<NearAction>,
}

impl Transaction {
    pub fn get_hash_and_size(&self) -> (CryptoHash, u64) {
        let bytes = borsh::to_vec(self).expect("Transaction borsh serialization cannot fail");
        let hash = Sha256::digest(&bytes);
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&hash);
        (CryptoHash(arr), bytes.len() as u64)
    }

    pub fn get_signer_id(&self) -> &AccountId {
        &self.signer_id
    }

    pub fn get_receiver_id(&self) -> &AccountId {
        &self.receiver_id
    }

    pub fn get_block_hash(&self) -> &CryptoHash {
        &self.block_hash
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn new(signature: Signature, transaction: Transaction) -> Self {
        Self {
            transaction,
            signature,
        }
    }

    pub fn to_borsh_bytes(&self) -> Result<Vec<u8>, String> {
        borsh::to_vec(self).map_err(|e| format!("SignedTransaction serialization failed: {e}"))
    }

    pub fn from_borsh_bytes(bytes: &[u8]) -> Result<Self, String> {
        borsh::from_slice(bytes).map_err(|e| format!("SignedTransaction deserialization failed: {e}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateAction {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub actions: Vec<NearAction>,
    pub nonce: Nonce,
    pub max_block_height: u64,
    pub public_key: PublicKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedDelegate {
    pub delegate_action: DelegateAction,
    pub signature: Signature,
}

impl SignedDelegate {
    pub fn to_borsh_bytes(&self) -> Result<Vec<u8>, String> {
        borsh::to_vec(self).map_err(|e| format!("SignedDelegate serialization failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_hash_is_deterministic() {
        let tx = Transaction {
            signer_id: AccountId::new("alice.near"),
            public_key: PublicKey::from_ed25519_bytes(&[1u8; 32]),
            nonce: 1,
            receiver_id: AccountId::new("bob.near"),
            block_hash: CryptoHash::from_bytes([2u8; 32]),
            actions: vec![NearAction::Transfer { deposit: 1_000_000 }],
        };
        let (h1, size1) = tx.get_hash_and_size();
        let (h2, size2) = tx.get_hash_and_size();
        assert_eq!(h1, h2);
        assert_eq!(size1, size2);
    }

    #[test]
    fn access_key_permission_compat_accepts_both_shapes() {
        let full: AccessKey =
            serde_json::from_str(r#"{"nonce":0,"permission":{"FullAccess":{}}}"#).unwrap();
        assert_eq!(full.permission, AccessKeyPermission::FullAccess);

        let fc: AccessKey = serde_json::from_str(
            r#"{"nonce":0,"permission":{"FunctionCall":{"receiverId":"x.near","methodNames":["a"]}}}"#,
        )
        .unwrap();
        assert!(matches!(fc.permission, AccessKeyPermission::FunctionCall(_)));
    }

    #[test]
    fn signed_transaction_borsh_round_trips() {
        let tx = Transaction {
            signer_id: AccountId::new("alice.near"),
            public_key: PublicKey::from_ed25519_bytes(&[1u8; 32]),
            nonce: 7,
            receiver_id: AccountId::new("bob.near"),
            block_hash: CryptoHash::from_bytes([3u8; 32]),
            actions: vec![NearAction::CreateAccount],
        };
        let signed = SignedTransaction::new(Signature::from_ed25519_bytes(&[9u8; 64]), tx);
        let bytes = signed.to_borsh_bytes().unwrap();
        let back = SignedTransaction::from_borsh_bytes(&bytes).unwrap();
        assert_eq!(signed, back);
    }
}
