//! # Method Tables
//!
//! A contract's callable surface, written down as data: each method is its
//! prototype text plus the ordered kinds of its parameters. The selector is
//! derived from the prototype, so the table is the only place a method's
//! wire identity is defined.

use bcb_sdk::crypto::method_selector;

/// How one call argument is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// UTF-8 text.
    Str,
    /// A single address, carried as its UTF-8 text.
    Address,
    /// Concatenated 24-byte decoded address bodies.
    AddressList,
    /// Unsigned integer up to 256 bits, minimal big-endian bytes.
    BigUint,
    /// 8 bytes big-endian.
    Uint64,
    /// 4 bytes big-endian.
    Uint32,
    /// One byte, non-zero is true.
    Bool,
    /// Opaque bytes.
    Bytes,
}

/// One callable method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    pub prototype: &'static str,
    pub params: &'static [ParamKind],
}

impl MethodSpec {
    pub const fn new(
        name: &'static str,
        prototype: &'static str,
        params: &'static [ParamKind],
    ) -> Self {
        Self {
            name,
            prototype,
            params,
        }
    }

    /// First four bytes of SHA3-256 over the prototype.
    pub fn selector(&self) -> [u8; 4] {
        method_selector(self.prototype)
    }

    pub fn method_id(&self) -> u32 {
        u32::from_be_bytes(self.selector())
    }

    /// Selector as `0x`-prefixed hex, the form `TxParams` expects.
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector()))
    }
}

/// The methods of one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractTable {
    pub name: &'static str,
    pub methods: &'static [MethodSpec],
}

impl ContractTable {
    pub fn by_name(&self, name: &str) -> Option<&'static MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn by_method_id(&self, method_id: u32) -> Option<&'static MethodSpec> {
        self.methods.iter().find(|m| m.method_id() == method_id)
    }
}

// ---------------------------------------------------------------------------
// Standard token contract
// ---------------------------------------------------------------------------

use ParamKind::*;

pub const TRANSFER: MethodSpec =
    MethodSpec::new("Transfer", "Transfer(smc.Address,big.Int)smc.Error", &[Address, BigUint]);

pub const BATCH_TRANSFER: MethodSpec = MethodSpec::new(
    "BatchTransfer",
    "BatchTransfer([]smc.Address,big.Int)smc.Error",
    &[AddressList, BigUint],
);

pub const SET_GAS_PRICE: MethodSpec =
    MethodSpec::new("SetGasPrice", "SetGasPrice(uint64)smc.Error", &[Uint64]);

pub const SET_OWNER: MethodSpec =
    MethodSpec::new("SetOwner", "SetOwner(smc.Address)smc.Error", &[Address]);

pub const ADD_SUPPLY: MethodSpec =
    MethodSpec::new("AddSupply", "AddSupply(big.Int)smc.Error", &[BigUint]);

pub const BURN: MethodSpec = MethodSpec::new("Burn", "Burn(big.Int)smc.Error", &[BigUint]);

pub const SET_GAS_PAYER: MethodSpec =
    MethodSpec::new("SetGasPayer", "SetGasPayer(smc.Address)smc.Error", &[Address]);

/// The standard fungible token contract.
pub const TOKEN: ContractTable = ContractTable {
    name: "token-basic",
    methods: &[
        TRANSFER,
        BATCH_TRANSFER,
        SET_GAS_PRICE,
        SET_OWNER,
        ADD_SUPPLY,
        BURN,
        SET_GAS_PAYER,
    ],
};
