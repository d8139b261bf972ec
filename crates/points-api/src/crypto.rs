// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Signature primitives for batch ingestion and referral enrollment.

use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use k256::ecdsa::{signature::hazmat::PrehashVerifier, Signature as EcdsaSignature, VerifyingKey};
use sha2::{Digest, Sha256};

/// Canonical digest of a signed point batch. serde_json object keys are
/// BTree-ordered, so serialization is deterministic regardless of the key
/// order the submitter used on the wire.
pub fn batch_digest(data: &serde_json::Value) -> [u8; 32] {
    let canonical = serde_json::to_vec(data).unwrap_or_default();
    Sha256::digest(&canonical).into()
}

/// Check a batch digest against the trusted off-chain signer's key.
///
/// Any decoding failure of the signature or key bytes is treated as a failed
/// verification, never propagated as an error.
pub fn verify_batch_signature(digest: &[u8; 32], signature_hex: &str, public_key_hex: &str) -> bool {
    let Ok(sig_bytes) = hex::decode(signature_hex.trim_start_matches("0x")) else {
        return false;
    };
    let Ok(signature) = EcdsaSignature::from_slice(&sig_bytes) else {
        return false;
    };
    let Ok(key_bytes) = hex::decode(public_key_hex.trim_start_matches("0x")) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&key_bytes) else {
        return false;
    };

    verifying_key.verify_prehash(digest, &signature).is_ok()
}

/// Message a wallet signs to redeem a referral code.
pub fn enrollment_message(evm_address: &str, code: &str) -> String {
    format!("I'm joining the points program with address {evm_address} by referral code {code}")
}

/// Recover the signer of an EIP-191 personal-sign message.
pub fn recover_personal_signer(message: &str, signature_hex: &str) -> anyhow::Result<Address> {
    let signature = Signature::from_str(signature_hex)?;
    Ok(signature.recover_address_from_msg(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use k256::ecdsa::{signature::hazmat::PrehashSigner, SigningKey};
    use serde_json::json;

    fn test_signer() -> (SigningKey, String) {
        let signing_key = SigningKey::from_slice(&[0x42u8; 32]).unwrap();
        let public_key_hex = hex::encode(signing_key.verifying_key().to_sec1_bytes());
        (signing_key, public_key_hex)
    }

    #[test]
    fn batch_signature_roundtrip() {
        let (signing_key, public_key_hex) = test_signer();
        let data = json!([{"holder": "0xabc", "point": 10.0, "type": "stake"}]);

        let digest = batch_digest(&data);
        let signature: EcdsaSignature = signing_key.sign_prehash(&digest).unwrap();
        let signature_hex = hex::encode(signature.to_bytes());

        assert!(verify_batch_signature(&digest, &signature_hex, &public_key_hex));
    }

    #[test]
    fn batch_digest_is_key_order_independent() {
        let a = json!({"holder": "0xabc", "point": 1.0});
        let b = json!({"point": 1.0, "holder": "0xabc"});
        assert_eq!(batch_digest(&a), batch_digest(&b));
    }

    #[test]
    fn tampered_batch_is_rejected() {
        let (signing_key, public_key_hex) = test_signer();
        let digest = batch_digest(&json!([{"holder": "0xabc", "point": 10.0}]));
        let signature: EcdsaSignature = signing_key.sign_prehash(&digest).unwrap();
        let signature_hex = hex::encode(signature.to_bytes());

        let tampered = batch_digest(&json!([{"holder": "0xabc", "point": 100.0}]));
        assert!(!verify_batch_signature(&tampered, &signature_hex, &public_key_hex));
    }

    #[test]
    fn malformed_inputs_fail_closed() {
        let digest = [0u8; 32];
        assert!(!verify_batch_signature(&digest, "not-hex", "02aa"));
        assert!(!verify_batch_signature(&digest, "abcd", "not-hex"));
        // Valid hex, but not a decodable signature or key.
        assert!(!verify_batch_signature(&digest, "0102", "0304"));
    }

    #[test]
    fn personal_signer_recovery() {
        let signer = PrivateKeySigner::random();
        let message = enrollment_message("0x1111111111111111111111111111111111111111", "c0de");
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();

        let recovered =
            recover_personal_signer(&message, &hex::encode(signature.as_bytes())).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn garbage_personal_signature_is_an_error() {
        assert!(recover_personal_signer("hello", "zz").is_err());
    }
}
