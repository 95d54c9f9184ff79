//! HTTP transport to the relayer's threshold-Ed25519 endpoints.
//!
//! Ported from `transport.rs`/`relayer_http.rs` trait split,
//! trimmed to the two calls the 2-party sign flow needs: `sign_init`
//! (exchange commitments) and `sign_finalize` (exchange signature shares).
//! Session minting/authorization against the relayer lives in the
//! orchestrator's relay client, not here — this agent only runs the FROST
//! math once a signing session is already authorized.

use serde::{Deserialize, Serialize};

use crate::error::{SignerAgentError, SignerResult};
use crate::threshold::protocol::CommitmentsWire;

#[derive(Debug, Clone)]
pub struct ThresholdSignerConfig {
    pub relayer_url: String,
    pub relayer_key_id: String,
    pub bearer_token: Option<String>,
}

pub struct SignInitResponse {
    pub signing_session_id: String,
    pub relayer_commitments: CommitmentsWire,
    pub relayer_verifying_share_b64u: String,
}

pub trait ThresholdTransport {
    async fn sign_init(
        &self,
        cfg: &ThresholdSignerConfig,
        mpc_session_id: &str,
        near_account_id: &str,
        signing_digest_b64u: &str,
        client_commitments: CommitmentsWire,
    ) -> SignerResult<SignInitResponse>;

    async fn sign_finalize(
        &self,
        cfg: &ThresholdSignerConfig,
        signing_session_id: &str,
        client_signature_share_b64u: &str,
    ) -> SignerResult<String>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInitRequest<'a> {
    mpc_session_id: &'a str,
    near_account_id: &'a str,
    relayer_key_id: &'a str,
    signing_digest_b64u: &'a str,
    client_commitments: &'a CommitmentsWire,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInitOk {
    signing_session_id: String,
    relayer_commitments: CommitmentsWire,
    relayer_verifying_share_b64u: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignFinalizeRequest<'a> {
    signing_session_id: &'a str,
    client_signature_share_b64u: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignFinalizeOk {
    relayer_signature_share_b64u: String,
}

pub struct HttpThresholdTransport {
    client: reqwest::Client,
}

impl Default for HttpThresholdTransport {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl ThresholdTransport for HttpThresholdTransport {
    async fn sign_init(
        &self,
        cfg: &ThresholdSignerConfig,
        mpc_session_id: &str,
        near_account_id: &str,
        signing_digest_b64u: &str,
        client_commitments: CommitmentsWire,
    ) -> SignerResult<SignInitResponse> {
        let url = format!("{}/threshold-ed25519/sign/init", cfg.relayer_url.trim_end_matches('/'));
        let mut req = self.client.post(&url).json(&SignInitRequest {
            mpc_session_id,
            near_account_id,
            relayer_key_id: &cfg.relayer_key_id,
            signing_digest_b64u,
            client_commitments: &client_commitments,
        });
        if let Some(token) = &cfg.bearer_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| SignerAgentError::Threshold(format!("sign/init request failed: {e}")))?
            .error_for_status()
            .map_err(|e| SignerAgentError::Threshold(format!("sign/init returned error: {e}")))?
            .json::<SignInitOk>()
            .await
            .map_err(|e| SignerAgentError::Threshold(format!("sign/init response decode failed: {e}")))?;

        Ok(SignInitResponse {
            signing_session_id: resp.signing_session_id,
            relayer_commitments: resp.relayer_commitments,
            relayer_verifying_share_b64u: resp.relayer_verifying_share_b64u,
        })
    }

    async fn sign_finalize(
        &self,
        cfg: &ThresholdSignerConfig,
        signing_session_id: &str,
        client_signature_share_b64u: &str,
    ) -> SignerResult<String> {
        let url = format!(
            "{}/threshold-ed25519/sign/finalize",
            cfg.relayer_url.trim_end_matches('/')
        );
        let mut req = self.client.post(&url).json(&SignFinalizeRequest {
            signing_session_id,
            client_signature_share_b64u,
        });
        if let Some(token) = &cfg.bearer_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| SignerAgentError::Threshold(format!("sign/finalize request failed: {e}")))?
            .error_for_status()
            .map_err(|e| SignerAgentError::Threshold(format!("sign/finalize returned error: {e}")))?
            .json::<SignFinalizeOk>()
            .await
            .map_err(|e| {
                SignerAgentError::Threshold(format!("sign/finalize response decode failed: {e}"))
            })?;

        Ok(resp.relayer_signature_share_b64u)
    }
}
