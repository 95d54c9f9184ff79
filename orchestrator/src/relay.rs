//! HTTP client for the relay server routes the Orchestrator itself owns
//! (session authorization/minting, Shamir server-lock steps, delegate
//! submission, optional server-session minting). The two-party FROST
//! exchange (`/sign/init`, `/sign/finalize`) is owned by
//! `signer_agent::threshold::transport` instead — this client only gets
//! the session authorized before handing it to the Signer Agent.
//!
//! Grounded on
//! `wasm_signer_worker/src/threshold/relayer_http.rs` (`post_json`,
//! `authorize_mpc_session_id`, `mint_threshold_session`) and
//! `wasm_vrf_worker/src/http.rs` (fetch wrapper), ported from
//! `web-sys`/`js_sys` fetch onto `reqwest` since this crate runs in a
//! native process, not a wasm worker behind a `fetch` shim.

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

#[derive(Debug, Clone)]
pub struct RelayClientConfig {
    pub relay_url: String,
    pub relayer_key_id: String,
    pub delegate_action_route: String,
    pub apply_server_lock_route: String,
    pub remove_server_lock_route: String,
}

pub struct RelayClient {
    http: reqwest::Client,
    config: RelayClientConfig,
}

fn relay_error(route: &str, code: Option<String>, message: Option<String>) -> OrchestratorError {
    OrchestratorError::RelayUnavailable(format!(
        "{route} failed ({}): {}",
        code.unwrap_or_else(|| "unknown".to_string()),
        message.unwrap_or_default()
    ))
}

impl RelayClient {
    pub fn new(config: RelayClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.relay_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post<Req: Serialize + ?Sized, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
        bearer_token: Option<&str>,
    ) -> Result<Resp, OrchestratorError> {
        let mut req = self.http.post(self.url(path)).json(body);
        if let Some(token) = bearer_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| OrchestratorError::RelayUnavailable(format!("{path} request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(OrchestratorError::RelayUnavailable(format!(
                "{path} HTTP {status}: {text}"
            )));
        }

        resp.json::<Resp>()
            .await
            .map_err(|e| OrchestratorError::RelayUnavailable(format!("{path} response decode failed: {e}")))
    }

    /// `POST /threshold-ed25519/authorize`: short-lived bearer token for a
    /// signing session, keyed to the VRF challenge and the client's
    /// threshold verifying share.
    pub async fn authorize(
        &self,
        client_verifying_share_b64u: &str,
        near_account_id: &str,
        purpose: &str,
        signing_digest_b64u: &str,
    ) -> Result<String, OrchestratorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            relayer_key_id: &'a str,
            client_verifying_share_b64u: &'a str,
            near_account_id: &'a str,
            purpose: &'a str,
            signing_digest_b64u: &'a str,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Resp {
            ok: bool,
            code: Option<String>,
            message: Option<String>,
            mpc_session_id: Option<String>,
        }

        let resp: Resp = self
            .post(
                "/threshold-ed25519/authorize",
                &Body {
                    relayer_key_id: &self.config.relayer_key_id,
                    client_verifying_share_b64u,
                    near_account_id,
                    purpose,
                    signing_digest_b64u,
                },
                None,
            )
            .await?;

        if !resp.ok {
            return Err(relay_error("/authorize", resp.code, resp.message));
        }
        resp.mpc_session_id
            .ok_or_else(|| relay_error("/authorize", None, Some("missing mpcSessionId".to_string())))
    }

    /// `POST /threshold-ed25519/session`: optional JWT/cookie session for
    /// session-style signing (no per-request VRF challenge).
    pub async fn mint_session(
        &self,
        client_verifying_share_b64u: &str,
        session_policy_json: &serde_json::Value,
    ) -> Result<String, OrchestratorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            relayer_key_id: &'a str,
            client_verifying_share_b64u: &'a str,
            session_policy: &'a serde_json::Value,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Resp {
            ok: bool,
            code: Option<String>,
            message: Option<String>,
            jwt: Option<String>,
            session_id: Option<String>,
        }

        let resp: Resp = self
            .post(
                "/threshold-ed25519/session",
                &Body {
                    relayer_key_id: &self.config.relayer_key_id,
                    client_verifying_share_b64u,
                    session_policy: session_policy_json,
                },
                None,
            )
            .await?;

        if !resp.ok {
            return Err(relay_error("/session", resp.code, resp.message));
        }
        resp.jwt
            .or(resp.session_id)
            .ok_or_else(|| relay_error("/session", None, Some("missing jwt/sessionId".to_string())))
    }

    /// `POST /threshold-ed25519/keygen`: initiates threshold key generation.
    pub async fn keygen(&self, client_verifying_share_b64u: &str) -> Result<String, OrchestratorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            relayer_key_id: &'a str,
            client_verifying_share_b64u: &'a str,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Resp {
            ok: bool,
            code: Option<String>,
            message: Option<String>,
            relayer_verifying_share_b64u: Option<String>,
        }

        let resp: Resp = self
            .post(
                "/threshold-ed25519/keygen",
                &Body {
                    relayer_key_id: &self.config.relayer_key_id,
                    client_verifying_share_b64u,
                },
                None,
            )
            .await?;

        if !resp.ok {
            return Err(relay_error("/keygen", resp.code, resp.message));
        }
        resp.relayer_verifying_share_b64u.ok_or_else(|| {
            relay_error("/keygen", None, Some("missing relayerVerifyingShareB64u".to_string()))
        })
    }

    /// Shamir step 2: relay adds its server lock on top of the client's
    /// temporary lock.
    pub async fn apply_server_lock(&self, locked_value_b64u: &str) -> Result<String, OrchestratorError> {
        self.shamir_step(&self.config.apply_server_lock_route.clone(), locked_value_b64u)
            .await
    }

    /// Shamir step 4: relay removes its persisted server lock.
    pub async fn remove_server_lock(&self, locked_value_b64u: &str) -> Result<String, OrchestratorError> {
        self.shamir_step(&self.config.remove_server_lock_route.clone(), locked_value_b64u)
            .await
    }

    async fn shamir_step(&self, route: &str, locked_value_b64u: &str) -> Result<String, OrchestratorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            locked_value_b64u: &'a str,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Resp {
            ok: bool,
            code: Option<String>,
            message: Option<String>,
            locked_value_b64u: Option<String>,
        }

        let resp: Resp = self
            .post(route, &Body { locked_value_b64u }, None)
            .await?;

        if !resp.ok {
            return Err(relay_error(route, resp.code, resp.message));
        }
        resp.locked_value_b64u
            .ok_or_else(|| relay_error(route, None, Some("missing lockedValueB64u".to_string())))
    }

    /// Submits a signed `DelegateAction` to the relayer for broadcast
    /// (default route `/signed-delegate`).
    pub async fn submit_signed_delegate(&self, signed_delegate_borsh_b64u: &str) -> Result<String, OrchestratorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            signed_delegate_b64u: &'a str,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Resp {
            ok: bool,
            code: Option<String>,
            message: Option<String>,
            tx_hash: Option<String>,
        }

        let route = self.config.delegate_action_route.clone();
        let resp: Resp = self
            .post(&route, &Body { signed_delegate_b64u: signed_delegate_borsh_b64u }, None)
            .await?;

        if !resp.ok {
            return Err(relay_error(&route, resp.code, resp.message));
        }
        resp.tx_hash
            .ok_or_else(|| relay_error(&route, None, Some("missing txHash".to_string())))
    }

    /// `POST /verify-authentication-response`: optional server-side
    /// session minting after a successful contract-level verification.
    pub async fn verify_authentication_response_session(
        &self,
        account_id: &str,
        vrf_data: &serde_json::Value,
        webauthn_assertion: &serde_json::Value,
    ) -> Result<bool, OrchestratorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            account_id: &'a str,
            vrf_data: &'a serde_json::Value,
            webauthn_assertion: &'a serde_json::Value,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Resp {
            ok: bool,
            code: Option<String>,
            message: Option<String>,
        }

        let resp: Resp = self
            .post(
                "/verify-authentication-response",
                &Body {
                    account_id,
                    vrf_data,
                    webauthn_assertion,
                },
                None,
            )
            .await?;

        if !resp.ok {
            return Err(relay_error(
                "/verify-authentication-response",
                resp.code,
                resp.message,
            ));
        }
        Ok(true)
    }
}
