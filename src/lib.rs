// src/lib.rs

//! Codepack
//!
//! Packs guest source code and its callable function names into a
//! WebAssembly-shaped container, publishes containers to content-addressed
//! storage, and resolves them back from an ordered list of gateways with a
//! local fallback.
//!
//! # Architecture
//!
//! - Container: custom sections behind the `\0asm` header, decoded leniently
//! - Identifiers: real content addresses vs local-only placeholders
//! - Resolver: one attempt per gateway, first success wins, cache on disk
//! - Dispatch: calls go through an explicit allow-list and evaluator

pub mod config;
pub mod container;
pub mod deployment;
pub mod dispatch;
mod error;
pub mod hash;
pub mod identifier;
pub mod persist;
pub mod publish;
pub mod resolver;
pub mod status;

pub use config::Config;
pub use container::{decode, encode, DecodeError, DecodedPackage, FunctionManifest, Package};
pub use deployment::DeploymentRecord;
pub use dispatch::{CommandEvaluator, DispatchError, DispatchTable, Evaluator};
pub use error::{Error, Result};
pub use identifier::{classify, IdentifierClass};
pub use publish::{FunctionSignatures, PublishReport, Publisher, UploadChain};
pub use resolver::{
    ContentResolver, EndpointList, FetchError, Fetcher, HttpFetcher, ResolutionError,
    ResolutionOutcome, ResolveRequest,
};
pub use status::DeployStatus;
