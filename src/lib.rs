//! Strict-mode tool schemas for MCP servers.
//!
//! OpenAI's strict tool mode rejects any object schema that does not set
//! `additionalProperties: false`. This crate rewrites tool input schemas so
//! they pass, and installs that rewrite in front of an existing `tools/list`
//! capability without the capability knowing about it.
//!
//! - [`schema`]: the recursive normalizer.
//! - [`lister`] and [`install`]: the listing interceptor and its installation.
//! - [`catalog`] and [`upstream`]: concrete tool sources.
//! - [`stdio`]: the MCP stdio server that serves the strict listing.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod install;
pub mod lister;
pub mod schema;
pub mod stdio;
pub mod upstream;

pub use install::{install_strict_listing, InstallError, Installation, StrictOptions, ToolService};
pub use lister::{StrictToolLister, ToolLister, ToolRoute};
pub use schema::{normalize_schema, NormalizeError, SchemaNormalizer, DEFAULT_MAX_DEPTH};
