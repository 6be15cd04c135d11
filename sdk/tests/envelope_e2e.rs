//! End-to-end envelope tests: build with a key manager, parse on the far
//! side, and make sure tampering never gets past verification.

use bcb_sdk::codec::decode_items;
use bcb_sdk::config::ChainContext;
use bcb_sdk::crypto::{
    address_from_public_key, derive_contract_address, method_selector, validate_address, Address,
    AddressError, Keypair,
};
use bcb_sdk::error::ErrorKind;
use bcb_sdk::keystore::{InMemoryKeyManager, SigningKeyRef};
use bcb_sdk::transaction::{
    build_query, build_transaction, build_transaction_legacy, decode_call, parse_legacy_result,
    parse_query, parse_transaction, EnvelopeError, TxParams,
};
use bcb_sdk::SdkError;

const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

struct Fixture {
    ctx: ChainContext,
    keys: InMemoryKeyManager,
    key: SigningKeyRef,
    signer: Address,
    contract: Address,
}

fn fixture(chain_id: &str) -> Fixture {
    let kp = Keypair::from_seed(&[42u8; 32]);
    let signer = address_from_public_key(chain_id, &kp.public_key());
    let contract = derive_contract_address(chain_id, &signer, "token-basic", "2.0.1");
    let mut keys = InMemoryKeyManager::new();
    keys.insert("alice", "correct horse", kp);
    Fixture {
        ctx: ChainContext::new(chain_id),
        keys,
        key: SigningKeyRef::new("alice", "correct horse"),
        signer,
        contract,
    }
}

fn params(f: &Fixture) -> TxParams {
    TxParams {
        nonce: "0x2a".into(),
        gas_limit: "989680".into(),
        note: "invoice #118".into(),
        to: f.contract.to_string(),
        method_selector: hex::encode(method_selector("Transfer(smc.Address,big.Int)smc.Error")),
        items: vec![f.signer.to_string(), "0x0de0b6b3a7640000".into()],
    }
}

/// Replace the character at `pos` with a different base58 character.
fn flip_char(text: &str, pos: usize) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let current = chars[pos];
    chars[pos] = ALPHABET.chars().find(|c| *c != current).unwrap();
    chars.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn build_then_parse_recovers_fields_and_signer() {
    for chain_id in ["bcb", "tst", "local"] {
        let f = fixture(chain_id);
        let text = build_transaction(&f.ctx, &params(&f), &f.keys, &f.key).unwrap();
        assert!(text.starts_with(&format!("{}<tx>.v1.", chain_id)));

        let (signer, tx) = parse_transaction(&f.ctx, &text).unwrap();
        assert_eq!(signer, f.signer);
        assert_eq!(tx.nonce, 42);
        assert_eq!(tx.gas_limit, 10_000_000);
        assert_eq!(tx.note, "invoice #118");
        assert_eq!(tx.to, f.contract);

        let (call, items) = decode_call(&tx).unwrap();
        assert_eq!(
            call.selector(),
            method_selector("Transfer(smc.Address,big.Int)smc.Error")
        );
        assert_eq!(items.string(0).unwrap(), f.signer.as_str());
        assert_eq!(items.big_uint(1).unwrap(), "1000000000000000000");
    }
}

#[test]
fn contract_addresses_always_validate() {
    for chain_id in ["bcb", "a", "longer-chain-id"] {
        let f = fixture(chain_id);
        validate_address(chain_id, f.contract.as_str()).unwrap();
        validate_address(chain_id, f.signer.as_str()).unwrap();
    }
}

#[test]
fn query_round_trip() {
    let f = fixture("bcb");
    let text = build_query(&f.ctx, "/token/balance", &f.keys, &f.key).unwrap();
    let (signer, query) = parse_query(&f.ctx, &text).unwrap();
    assert_eq!(signer, f.signer);
    assert_eq!(query.query_key, "/token/balance");
}

#[test]
fn empty_item_list_round_trips() {
    let f = fixture("bcb");
    let mut p = params(&f);
    p.items.clear();
    let text = build_transaction(&f.ctx, &p, &f.keys, &f.key).unwrap();
    let (_, tx) = parse_transaction(&f.ctx, &text).unwrap();
    let call = tx.method_call().unwrap();
    assert!(decode_items(&call.param_data).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Tampering
// ---------------------------------------------------------------------------

#[test]
fn any_single_character_change_is_rejected() {
    let f = fixture("bcb");
    let text = build_transaction(&f.ctx, &params(&f), &f.keys, &f.key).unwrap();
    let fields: Vec<&str> = text.split('.').collect();

    for segment in [2usize, 4] {
        let original = fields[segment];
        for pos in (0..original.len()).step_by(7) {
            let mut tampered = fields.clone();
            let flipped = flip_char(original, pos);
            tampered[segment] = &flipped;
            let text = tampered.join(".");

            let err = parse_transaction(&f.ctx, &text).unwrap_err();
            assert!(
                matches!(
                    err,
                    EnvelopeError::SignatureInvalid | EnvelopeError::BinaryDecode(_)
                ),
                "segment {} pos {}: {:?}",
                segment,
                pos,
                err
            );
        }
    }
}

#[test]
fn query_envelope_is_not_a_transaction() {
    let f = fixture("bcb");
    let text = build_query(&f.ctx, "/k", &f.keys, &f.key).unwrap();
    let err = parse_transaction(&f.ctx, &text).unwrap_err();
    assert_eq!(SdkError::from(err).kind(), ErrorKind::FrameFormat);
}

#[test]
fn checksum_flip_is_detected() {
    let f = fixture("bcb");
    let body = bs58::decode(&f.contract.as_str()[3..]).into_vec().unwrap();
    for i in body.len() - 4..body.len() {
        let mut corrupt = body.clone();
        corrupt[i] ^= 0x01;
        let text = format!("bcb{}", bs58::encode(&corrupt).into_string());
        assert_eq!(
            validate_address("bcb", &text),
            Err(AddressError::ChecksumMismatch)
        );
    }
}

// ---------------------------------------------------------------------------
// Legacy surface
// ---------------------------------------------------------------------------

#[test]
fn legacy_surface_reports_bad_hex_in_band() {
    let f = fixture("bcb");
    for (field, value) in [
        ("nonce", "xyz"),
        ("nonce", "+1a"),
        ("gas", "-1"),
        ("gas", "0x+ff"),
        ("selector", "0x1234"),
    ] {
        let mut p = params(&f);
        match field {
            "nonce" => p.nonce = value.into(),
            "gas" => p.gas_limit = value.into(),
            _ => p.method_selector = value.into(),
        }
        let out = build_transaction_legacy(&f.ctx, &p, &f.keys, &f.key).unwrap();
        let err = parse_legacy_result(&out).unwrap_err();
        assert_eq!(err.code, -32602, "{}", field);
    }
}

#[test]
fn legacy_surface_passes_envelopes_through() {
    let f = fixture("bcb");
    let out = build_transaction_legacy(&f.ctx, &params(&f), &f.keys, &f.key).unwrap();
    let text = parse_legacy_result(&out).unwrap();
    assert!(parse_transaction(&f.ctx, text).is_ok());
}
