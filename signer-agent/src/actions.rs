//! Action parameter validation and conversion into [`NearAction`].
//!
//! Grounded on `ActionParams::to_action()`, with the
//! wasm32/native JSON-parser split dropped: this crate always runs native,
//! so `access_key` JSON is parsed directly with `serde_json` rather than the
//! original's hand-rolled non-wasm parser.

use serde::{Deserialize, Serialize};

use crate::error::{SignerAgentError, SignerResult};
use crate::types::*;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "action_type")]
pub enum ActionParams {
    CreateAccount,
    DeployContract {
        code: Vec<u8>,
    },
    FunctionCall {
        method_name: String,
        /// JSON-encoded call arguments.
        args: String,
        gas: String,
        deposit: String,
    },
    Transfer {
        deposit: String,
    },
    Stake {
        stake: String,
        public_key: String,
    },
    AddKey {
        public_key: String,
        /// JSON-encoded `AccessKey`.
        access_key: String,
    },
    DeleteKey {
        public_key: String,
    },
    DeleteAccount {
        beneficiary_id: String,
    },
    SignedDelegate {
        delegate_action: DelegateAction,
        signature: Signature,
    },
    DeployGlobalContract {
        code: Vec<u8>,
        deploy_mode: String,
    },
    UseGlobalContract {
        account_id: Option<String>,
        code_hash: Option<String>,
    },
}

fn parse_ed25519_public_key(public_key: &str) -> SignerResult<PublicKey> {
    if public_key.is_empty() {
        return Err(SignerAgentError::InvalidPublicKey(
            "public key cannot be empty".to_string(),
        ));
    }
    let key_str = public_key
        .strip_prefix("ed25519:")
        .ok_or_else(|| SignerAgentError::InvalidPublicKey("must start with ed25519:".to_string()))?;

    let key_bytes = bs58::decode(key_str)
        .into_vec()
        .map_err(|e| SignerAgentError::InvalidPublicKey(format!("bs58 decode failed: {e}")))?;

    if key_bytes.len() != 32 {
        return Err(SignerAgentError::InvalidPublicKey(
            "public key must be 32 bytes".to_string(),
        ));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&key_bytes);
    Ok(PublicKey::from_ed25519_bytes(&arr))
}

impl ActionParams {
    /// Validate the current params and convert into a concrete [`NearAction`].
    pub fn to_action(&self) -> SignerResult<NearAction> {
        match self {
            ActionParams::CreateAccount => Ok(NearAction::CreateAccount),

            ActionParams::DeployContract { code } => {
                if code.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "contract code cannot be empty".to_string(),
                    ));
                }
                Ok(NearAction::DeployContract { code: code.clone() })
            }

            ActionParams::FunctionCall {
                method_name,
                args,
                gas,
                deposit,
            } => {
                if method_name.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "method name cannot be empty".to_string(),
                    ));
                }
                let gas_amount = gas
                    .parse::<Gas>()
                    .map_err(|_| SignerAgentError::InvalidAction("invalid gas amount".to_string()))?;
                let deposit_amount = deposit
                    .parse::<Balance>()
                    .map_err(|_| SignerAgentError::InvalidAction("invalid deposit amount".to_string()))?;

                Ok(NearAction::FunctionCall(Box::new(FunctionCallAction {
                    method_name: method_name.clone(),
                    args: args.as_bytes().to_vec(),
                    gas: gas_amount,
                    deposit: deposit_amount,
                })))
            }

            ActionParams::Transfer { deposit } => {
                if deposit.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "transfer deposit cannot be empty".to_string(),
                    ));
                }
                let deposit_amount = deposit
                    .parse::<Balance>()
                    .map_err(|_| SignerAgentError::InvalidAction("invalid deposit amount".to_string()))?;
                Ok(NearAction::Transfer {
                    deposit: deposit_amount,
                })
            }

            ActionParams::Stake { stake, public_key } => {
                if stake.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "stake amount cannot be empty".to_string(),
                    ));
                }
                let stake_amount = stake
                    .parse::<Balance>()
                    .map_err(|_| SignerAgentError::InvalidAction("invalid stake amount".to_string()))?;
                let parsed_public_key = parse_ed25519_public_key(public_key)?;
                Ok(NearAction::Stake {
                    stake: stake_amount,
                    public_key: parsed_public_key,
                })
            }

            ActionParams::AddKey {
                public_key,
                access_key,
            } => {
                let parsed_public_key = parse_ed25519_public_key(public_key)?;
                let parsed_access_key: AccessKey = serde_json::from_str(access_key)?;
                Ok(NearAction::AddKey {
                    public_key: parsed_public_key,
                    access_key: parsed_access_key,
                })
            }

            ActionParams::DeleteKey { public_key } => {
                let parsed_public_key = parse_ed25519_public_key(public_key)?;
                Ok(NearAction::DeleteKey {
                    public_key: parsed_public_key,
                })
            }

            ActionParams::DeleteAccount { beneficiary_id } => {
                if beneficiary_id.is_empty() {
                    return Err(SignerAgentError::InvalidAccountId(
                        "beneficiary id cannot be empty".to_string(),
                    ));
                }
                let beneficiary = beneficiary_id
                    .parse::<AccountId>()
                    .map_err(SignerAgentError::InvalidAccountId)?;
                Ok(NearAction::DeleteAccount {
                    beneficiary_id: beneficiary,
                })
            }

            ActionParams::SignedDelegate {
                delegate_action,
                signature,
            } => {
                if delegate_action.sender_id.0.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "delegate_action.sender_id cannot be empty".to_string(),
                    ));
                }
                if delegate_action.receiver_id.0.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "delegate_action.receiver_id cannot be empty".to_string(),
                    ));
                }
                if delegate_action.actions.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "delegate_action.actions cannot be empty".to_string(),
                    ));
                }
                if delegate_action.nonce == 0 {
                    return Err(SignerAgentError::InvalidAction(
                        "delegate_action.nonce must be non-zero".to_string(),
                    ));
                }
                if signature.signature_data.len() != 64 {
                    return Err(SignerAgentError::InvalidAction(
                        "delegate signature must be 64 bytes".to_string(),
                    ));
                }
                Ok(NearAction::SignedDelegate(Box::new(SignedDelegate {
                    delegate_action: delegate_action.clone(),
                    signature: signature.clone(),
                })))
            }

            ActionParams::DeployGlobalContract { code, deploy_mode } => {
                if code.is_empty() {
                    return Err(SignerAgentError::InvalidAction(
                        "global contract code cannot be empty".to_string(),
                    ));
                }
                let mode = match deploy_mode.as_str() {
                    "CodeHash" => GlobalContractDeployMode::CodeHash,
                    "AccountId" => GlobalContractDeployMode::AccountId,
                    other => {
                        return Err(SignerAgentError::InvalidAction(format!(
                            "invalid deploy_mode: {other}"
                        )))
                    }
                };
                Ok(NearAction::DeployGlobalContract {
                    code: code.clone(),
                    deploy_mode: mode,
                })
            }

            ActionParams::UseGlobalContract {
                account_id,
                code_hash,
            } => {
                let identifier = match (account_id, code_hash) {
                    (Some(id), None) => {
                        if id.is_empty() {
                            return Err(SignerAgentError::InvalidAccountId(
                                "account_id cannot be empty".to_string(),
                            ));
                        }
                        let acc = id.parse::<AccountId>().map_err(SignerAgentError::InvalidAccountId)?;
                        GlobalContractIdentifier::AccountId(acc)
                    }
                    (None, Some(hash_str)) => {
                        if hash_str.is_empty() {
                            return Err(SignerAgentError::InvalidAction(
                                "code_hash cannot be empty".to_string(),
                            ));
                        }
                        let bytes = bs58::decode(hash_str).into_vec().map_err(|e| {
                            SignerAgentError::InvalidAction(format!("invalid code_hash: {e}"))
                        })?;
                        if bytes.len() != 32 {
                            return Err(SignerAgentError::InvalidAction(
                                "code_hash must be 32 bytes".to_string(),
                            ));
                        }
                        let mut arr = [0u8; 32];
                        arr.copy_from_slice(&bytes);
                        GlobalContractIdentifier::CodeHash(CryptoHash::from_bytes(arr))
                    }
                    _ => {
                        return Err(SignerAgentError::InvalidAction(
                            "UseGlobalContract requires exactly one of account_id or code_hash"
                                .to_string(),
                        ))
                    }
                };
                Ok(NearAction::UseGlobalContract {
                    contract_identifier: identifier,
                })
            }
        }
    }

    pub fn validate(&self) -> SignerResult<()> {
        self.to_action().map(|_| ())
    }
}
