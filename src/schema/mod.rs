//! JSON Schema rewriting for strict tool validation.
//!
//! Strict consumers (OpenAI structured outputs, strict function calling)
//! require every object schema to forbid unlisted properties. The
//! normalizer walks every nesting point of a schema tree and forces
//! `additionalProperties: false` on each object-typed node.

mod normalize;

pub use normalize::{normalize_schema, NormalizeError, SchemaNormalizer, DEFAULT_MAX_DEPTH};
