//! # pact-types
//!
//! Core data types for the Pact/Chainweb client.
//!
//! This crate provides:
//! - [`Command`](command::Command) - Content-addressed commands and their payloads
//! - [`CommandResponse`](response::CommandResponse) - Execution results, events and block metadata
//! - [`BlockHeader`](chainweb::BlockHeader) / [`BlockPayload`](chainweb::BlockPayload) - Chainweb block data
//! - [`PactValue`](value::PactValue) - Typed decoding of Pact JSON values
//! - [`ModuleMetadata`](module::ModuleMetadata) / [`FungibleAccount`](account::FungibleAccount) - Cached query results

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
mod cacheable;
pub mod chainweb;
pub mod command;
mod de;
mod error;
pub mod hash;
pub mod module;
pub mod response;
pub mod value;

pub use account::{FungibleAccount, FUNGIBLE_V2};
pub use cacheable::Cacheable;
pub use chainweb::{BlockHeader, BlockPayload};
pub use command::{
    Capability, ChainwebMetadata, Command, ContPayload, ExecPayload, PactCmd, Payload, Signature,
    Signer, WireCommand,
};
pub use error::{TypesError, TypesResult};
pub use module::ModuleMetadata;
pub use response::{
    CommandResponse, CommandResult, Continuation, ContinuationCall, PactError, PactEvent,
    Provenance, ResponseMetadata, ResultStatus, Yield,
};
pub use value::{ModuleReference, PactValue, RefSpec};

// Numeric types used across the public API
pub use num_bigint::BigInt;
pub use rust_decimal::Decimal;
