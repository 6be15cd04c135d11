//! Wire records carried inside envelopes.
//!
//! All four records are RLP lists with a fixed field order. The order is the
//! wire format; reordering fields here breaks every node on the network.
//!
//! ```text
//! Transaction    = [nonce, gas_limit, note, to, data]
//! Query          = [query_key]
//! MethodCall     = [method_id, param_data]          (inside Transaction.data)
//! Ed25519SigInfo = [public_key(32), signature(64)]
//! ```

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

use crate::crypto::address::Address;
use crate::crypto::keys::{PublicKey, Signature, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

fn expect_list(rlp: &Rlp<'_>, fields: usize) -> Result<(), DecoderError> {
    if !rlp.is_list() {
        return Err(DecoderError::RlpExpectedToBeList);
    }
    if rlp.item_count()? != fields {
        return Err(DecoderError::RlpIncorrectListLen);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A ledger transaction.
///
/// Built per call, signed once, never mutated after serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Per-sender sequence number.
    pub nonce: u64,
    /// Upper bound on gas the call may consume.
    pub gas_limit: u64,
    /// Free-form note, at most 256 characters.
    pub note: String,
    /// Destination contract address.
    pub to: Address,
    /// RLP-encoded [`MethodCall`].
    pub data: Vec<u8>,
}

impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(5);
        s.append(&self.nonce);
        s.append(&self.gas_limit);
        s.append(&self.note);
        s.append(&self.to.as_str().to_string());
        s.append(&self.data);
    }
}

impl Decodable for Transaction {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        expect_list(rlp, 5)?;
        let to: String = rlp.val_at(3)?;
        Ok(Self {
            nonce: rlp.val_at(0)?,
            gas_limit: rlp.val_at(1)?,
            note: rlp.val_at(2)?,
            to: Address::new_unchecked(to),
            data: rlp.val_at(4)?,
        })
    }
}

impl Transaction {
    /// Decode `data` as a [`MethodCall`].
    pub fn method_call(&self) -> Result<MethodCall, DecoderError> {
        crate::codec::decode_exact(&self.data)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A signed read-only state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query_key: String,
}

impl Encodable for Query {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(1);
        s.append(&self.query_key);
    }
}

impl Decodable for Query {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        expect_list(rlp, 1)?;
        Ok(Self {
            query_key: rlp.val_at(0)?,
        })
    }
}

// ---------------------------------------------------------------------------
// MethodCall
// ---------------------------------------------------------------------------

/// A contract invocation: which method, and its encoded parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    /// Big-endian view of the 4-byte method selector.
    pub method_id: u32,
    /// RLP byte-string list produced by [`crate::codec::encode_items`].
    pub param_data: Vec<u8>,
}

impl MethodCall {
    pub fn new(selector: [u8; 4], param_data: Vec<u8>) -> Self {
        Self {
            method_id: u32::from_be_bytes(selector),
            param_data,
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        self.method_id.to_be_bytes()
    }

    /// The RLP bytes that go into [`Transaction::data`].
    pub fn to_bytes(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }

    /// Decode the contents of [`Transaction::data`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, crate::codec::DecodeError> {
        Ok(crate::codec::decode_exact(data)?)
    }
}

impl Encodable for MethodCall {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.method_id);
        s.append(&self.param_data);
    }
}

impl Decodable for MethodCall {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        expect_list(rlp, 2)?;
        Ok(Self {
            method_id: rlp.val_at(0)?,
            param_data: rlp.val_at(1)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Ed25519SigInfo
// ---------------------------------------------------------------------------

/// The signature segment of an envelope: who signed, and the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519SigInfo {
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl Encodable for Ed25519SigInfo {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.public_key.as_bytes().to_vec());
        s.append(&self.signature.as_bytes().to_vec());
    }
}

impl Decodable for Ed25519SigInfo {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        expect_list(rlp, 2)?;
        let pk: Vec<u8> = rlp.val_at(0)?;
        let sig: Vec<u8> = rlp.val_at(1)?;
        let pk: [u8; PUBLIC_KEY_LENGTH] = pk
            .as_slice()
            .try_into()
            .map_err(|_| DecoderError::Custom("public key must be 32 bytes"))?;
        let sig: [u8; SIGNATURE_LENGTH] = sig
            .as_slice()
            .try_into()
            .map_err(|_| DecoderError::Custom("signature must be 64 bytes"))?;
        Ok(Self {
            public_key: PublicKey::from_bytes(pk),
            signature: Signature::from_bytes(sig),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_exact;
    use crate::crypto::keys::Keypair;

    fn sample_tx() -> Transaction {
        Transaction {
            nonce: 7,
            gas_limit: 25_000,
            note: "rent".to_string(),
            to: Address::new_unchecked("bcbContract"),
            data: rlp::encode(&MethodCall::new([1, 2, 3, 4], vec![0xc0])).to_vec(),
        }
    }

    #[test]
    fn transaction_decodes_back() {
        let tx = sample_tx();
        let bytes = rlp::encode(&tx).to_vec();
        let back: Transaction = decode_exact(&bytes).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.method_call().unwrap().selector(), [1, 2, 3, 4]);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let bytes = rlp::encode(&Query {
            query_key: "k".into(),
        })
        .to_vec();
        assert!(decode_exact::<Transaction>(&bytes).is_err());
    }

    #[test]
    fn sig_info_enforces_lengths() {
        let kp = Keypair::generate();
        let info = Ed25519SigInfo {
            public_key: kp.public_key(),
            signature: kp.sign(b"x"),
        };
        let bytes = rlp::encode(&info).to_vec();
        assert_eq!(decode_exact::<Ed25519SigInfo>(&bytes).unwrap(), info);

        let mut s = RlpStream::new_list(2);
        s.append(&vec![0u8; 31]);
        s.append(&vec![0u8; 64]);
        assert!(decode_exact::<Ed25519SigInfo>(&s.out()).is_err());
    }

    #[test]
    fn method_id_is_big_endian_selector() {
        let call = MethodCall::new([0xde, 0xad, 0xbe, 0xef], vec![]);
        assert_eq!(call.method_id, 0xdead_beef);
    }
}
