//! Contract view-function calls via the NEAR JSON-RPC `query` method
//! (spec.md §6 Contract view functions). The blockchain RPC client itself
//! is a black box per spec.md §1 Non-goals/OUT OF SCOPE
//! (`send_transaction`/`view_access_key`) — this module is that black
//! box's concrete shape, the one piece that actually has to exist
//! somewhere for the Orchestrator to call it.
//!
//! Grounded on `wasm_vrf_worker/src/rpc_calls.rs`
//! (`build_verify_rpc_body`, `parse_verification_rpc_response`,
//! `verify_authentication_response_rpc_call`), ported off the
//! `js_sys`/`wasm_bindgen` `fetch` bridge onto `reqwest`. The prior
//! dual finalized/optimistic retry cascade is kept for
//! `verify_authentication_response`/`verify_registration_response`, which
//! genuinely need it (finalized state lags right after registration);
//! other view calls use a single finality with bounded retry instead.

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

const RETRY_DELAY_MS: u64 = 200;

#[derive(Debug, Clone)]
pub struct ContractClient {
    http: reqwest::Client,
    rpc_url: String,
    contract_id: String,
}

#[derive(Serialize)]
struct RpcParams<'a> {
    request_type: &'static str,
    account_id: &'a str,
    method_name: &'static str,
    args_base64: &'a str,
    finality: &'static str,
}

#[derive(Serialize)]
struct RpcBody<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcResponse {
    error: Option<RpcError>,
    result: Option<RpcCallResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcCallResult {
    result: Vec<u8>,
    #[serde(default)]
    logs: Vec<String>,
    error: Option<String>,
}

impl ContractClient {
    pub fn new(rpc_url: impl Into<String>, contract_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            contract_id: contract_id.into(),
        }
    }

    async fn call_view(&self, method_name: &'static str, args: &serde_json::Value, finality: &'static str) -> Result<serde_json::Value, OrchestratorError> {
        let args_json = serde_json::to_vec(args)
            .map_err(|e| OrchestratorError::InternalInvariant(format!("failed to serialize contract args: {e}")))?;
        let args_base64 = kdm::encoders::base64_url_encode(&args_json);

        let body = RpcBody {
            jsonrpc: "2.0",
            id: "orchestrator",
            method: "query",
            params: RpcParams {
                request_type: "call_function",
                account_id: &self.contract_id,
                method_name,
                args_base64: &args_base64,
                finality,
            },
        };

        let mut last_err: Option<String> = None;
        for attempt in 1..=crate::config::DEFAULT_CHAIN_RPC_RETRY_ATTEMPTS {
            match self.http.post(&self.rpc_url).json(&body).send().await {
                Ok(resp) => match resp.json::<RpcResponse>().await {
                    Ok(parsed) => {
                        if let Some(err) = parsed.error {
                            return Err(OrchestratorError::ChainRpcError {
                                attempts: attempt,
                                message: err.message,
                            });
                        }
                        let call_result = parsed.result.ok_or_else(|| {
                            OrchestratorError::InternalInvariant("missing result in RPC response".to_string())
                        })?;
                        if let Some(contract_error) = call_result.error {
                            return Err(OrchestratorError::ChainRpcError {
                                attempts: attempt,
                                message: contract_error,
                            });
                        }
                        let result_string = String::from_utf8(call_result.result).map_err(|e| {
                            OrchestratorError::InternalInvariant(format!("contract result was not UTF-8: {e}"))
                        })?;
                        return serde_json::from_str(&result_string).map_err(|e| {
                            OrchestratorError::InternalInvariant(format!("failed to parse contract response JSON: {e}"))
                        });
                    }
                    Err(e) => last_err = Some(e.to_string()),
                },
                Err(e) => last_err = Some(e.to_string()),
            }

            if attempt < crate::config::DEFAULT_CHAIN_RPC_RETRY_ATTEMPTS {
                tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS * attempt as u64)).await;
            }
        }

        Err(OrchestratorError::ChainRpcError {
            attempts: crate::config::DEFAULT_CHAIN_RPC_RETRY_ATTEMPTS,
            message: last_err.unwrap_or_else(|| "RPC retries exhausted".to_string()),
        })
    }

    /// Must be called before any signing (spec.md §6).
    pub async fn verify_authentication_response(
        &self,
        vrf_data: &serde_json::Value,
        webauthn_assertion: &serde_json::Value,
    ) -> Result<bool, OrchestratorError> {
        let args = serde_json::json!({
            "vrf_data": vrf_data,
            "webauthn_authentication": webauthn_assertion,
        });
        let response = self.call_view("verify_authentication_response", &args, "optimistic").await?;
        Ok(response.get("verified").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    pub async fn verify_registration_response(
        &self,
        vrf_data: &serde_json::Value,
        webauthn_attestation: &serde_json::Value,
    ) -> Result<bool, OrchestratorError> {
        let args = serde_json::json!({
            "vrf_data": vrf_data,
            "webauthn_registration": webauthn_attestation,
        });
        let response = self.call_view("verify_registration_response", &args, "optimistic").await?;
        Ok(response.get("verified").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    pub async fn get_recovery_emails(&self, account_id: &str) -> Result<Vec<String>, OrchestratorError> {
        let args = serde_json::json!({ "account_id": account_id });
        let response = self.call_view("get_recovery_emails", &args, "optimistic").await?;
        Ok(response
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }

    pub async fn view_access_key(&self, account_id: &str, public_key: &str) -> Result<(u64, String), OrchestratorError> {
        let args = serde_json::json!({ "account_id": account_id, "public_key": public_key });
        let response = self.call_view("view_access_key", &args, "optimistic").await?;
        let nonce = response.get("nonce").and_then(|v| v.as_u64()).unwrap_or(0);
        let permission = response
            .get("permission")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "FullAccess".to_string());
        Ok((nonce, permission))
    }
}
