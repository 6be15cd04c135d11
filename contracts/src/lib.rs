//! # BCB Contract Calls
//!
//! Contract methods as data. Instead of one hand-written parameter packer
//! per contract, each contract is a [`table::ContractTable`] of
//! `{prototype, parameter kinds}` entries, and a single builder/decoder
//! pair in [`call`] handles all of them.
//!
//! ```rust,no_run
//! use bcb_contracts::{call::{MethodCallBuilder, ParamValue}, table::TRANSFER};
//! use bcb_sdk::config::ChainContext;
//! # fn run(to: bcb_sdk::crypto::Address, token: bcb_sdk::crypto::Address) -> Result<(), bcb_contracts::call::CallError> {
//! let ctx = ChainContext::new("bcb");
//! let params = MethodCallBuilder::new(&ctx, &TRANSFER)
//!     .arg(to)
//!     .arg(ParamValue::big_uint("1000000000"))
//!     .build()?
//!     .into_tx_params(1, 25_000, "", &token);
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod table;

pub use call::{decode_call, CallError, DecodedCall, MethodCallBuilder, ParamValue, PreparedCall};
pub use table::{ContractTable, MethodSpec, ParamKind, TOKEN};
