//! COSE_Key extraction from a WebAuthn attestation object's authenticator
//! data, for credentials whose public key must be recovered without access
//! to PRF (e.g. re-deriving the public key bound to an existing credential).

use ciborium::value::Value;

use crate::error::KdmError;

/// An Ed25519 (OKP, crv=Ed25519) or EC2 (P-256) COSE public key, extracted
/// from a CBOR-encoded `attestedCredentialData` blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CosePublicKey {
    Ed25519 { x: [u8; 32] },
    Ec2P256 { x: [u8; 32], y: [u8; 32] },
}

const COSE_KTY: i64 = 1;
const COSE_ALG: i64 = 3;
const COSE_CRV: i64 = -1;
const COSE_X: i64 = -2;
const COSE_Y: i64 = -3;

const KTY_OKP: i64 = 1;
const KTY_EC2: i64 = 2;
const CRV_ED25519: i64 = 6;
const CRV_P256: i64 = 1;

/// Parse a COSE_Key CBOR map (the tail of `attestedCredentialData`, after the
/// AAGUID/credentialId prefix has been stripped by the caller) into a
/// [`CosePublicKey`].
pub fn extract_cose_public_key(cose_key_cbor: &[u8]) -> Result<CosePublicKey, KdmError> {
    let value: Value =
        ciborium::de::from_reader(cose_key_cbor).map_err(|e| KdmError::CborError(e.to_string()))?;

    let map = value
        .as_map()
        .ok_or_else(|| KdmError::InvalidInput("COSE key is not a CBOR map".to_string()))?;

    let get_int = |key: i64| -> Option<i64> {
        map.iter().find_map(|(k, v)| {
            if cbor_int(k) == Some(key) {
                cbor_int(v)
            } else {
                None
            }
        })
    };
    let get_bytes = |key: i64| -> Option<Vec<u8>> {
        map.iter().find_map(|(k, v)| {
            if cbor_int(k) == Some(key) {
                v.as_bytes().cloned()
            } else {
                None
            }
        })
    };

    let kty = get_int(COSE_KTY).ok_or(KdmError::MissingField("kty"))?;
    let _alg = get_int(COSE_ALG);

    match kty {
        KTY_OKP => {
            let crv = get_int(COSE_CRV).ok_or(KdmError::MissingField("crv"))?;
            if crv != CRV_ED25519 {
                return Err(KdmError::InvalidInput(format!(
                    "Unsupported OKP curve: {}",
                    crv
                )));
            }
            let x = get_bytes(COSE_X).ok_or(KdmError::MissingField("x"))?;
            let x: [u8; 32] = x
                .try_into()
                .map_err(|_| KdmError::InvalidInput("COSE x coordinate must be 32 bytes".to_string()))?;
            Ok(CosePublicKey::Ed25519 { x })
        }
        KTY_EC2 => {
            let crv = get_int(COSE_CRV).ok_or(KdmError::MissingField("crv"))?;
            if crv != CRV_P256 {
                return Err(KdmError::InvalidInput(format!(
                    "Unsupported EC2 curve: {}",
                    crv
                )));
            }
            let x = get_bytes(COSE_X).ok_or(KdmError::MissingField("x"))?;
            let y = get_bytes(COSE_Y).ok_or(KdmError::MissingField("y"))?;
            let x: [u8; 32] = x
                .try_into()
                .map_err(|_| KdmError::InvalidInput("COSE x coordinate must be 32 bytes".to_string()))?;
            let y: [u8; 32] = y
                .try_into()
                .map_err(|_| KdmError::InvalidInput("COSE y coordinate must be 32 bytes".to_string()))?;
            Ok(CosePublicKey::Ec2P256 { x, y })
        }
        other => Err(KdmError::InvalidInput(format!(
            "Unsupported COSE key type: {}",
            other
        ))),
    }
}

fn cbor_int(v: &Value) -> Option<i64> {
    match v {
        Value::Integer(i) => {
            let wide: i128 = (*i).into();
            i64::try_from(wide).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cose_map(pairs: Vec<(i64, Value)>) -> Vec<u8> {
        let map: Vec<(Value, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (Value::Integer(k.into()), v))
            .collect();
        let value = Value::Map(map);
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&value, &mut buf).unwrap();
        buf
    }

    #[test]
    fn extracts_ed25519_okp_key() {
        let x = [5u8; 32];
        let buf = cose_map(vec![
            (COSE_KTY, Value::Integer(KTY_OKP.into())),
            (COSE_ALG, Value::Integer((-8i64).into())),
            (COSE_CRV, Value::Integer(CRV_ED25519.into())),
            (COSE_X, Value::Bytes(x.to_vec())),
        ]);

        let parsed = extract_cose_public_key(&buf).unwrap();
        assert_eq!(parsed, CosePublicKey::Ed25519 { x });
    }

    #[test]
    fn rejects_unsupported_curve() {
        let buf = cose_map(vec![
            (COSE_KTY, Value::Integer(KTY_OKP.into())),
            (COSE_CRV, Value::Integer(2i64.into())),
            (COSE_X, Value::Bytes(vec![0u8; 32])),
        ]);
        assert!(extract_cose_public_key(&buf).is_err());
    }

    #[test]
    fn extracts_ec2_p256_key() {
        let x = [1u8; 32];
        let y = [2u8; 32];
        let buf = cose_map(vec![
            (COSE_KTY, Value::Integer(KTY_EC2.into())),
            (COSE_ALG, Value::Integer((-7i64).into())),
            (COSE_CRV, Value::Integer(CRV_P256.into())),
            (COSE_X, Value::Bytes(x.to_vec())),
            (COSE_Y, Value::Bytes(y.to_vec())),
        ]);
        let parsed = extract_cose_public_key(&buf).unwrap();
        assert_eq!(parsed, CosePublicKey::Ec2P256 { x, y });
    }
}
