//! Schema registration and reference lookup
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

mod index;
mod resolver;

pub use index::{RegistrationScope, ResolvedSchema, SchemaRegistry, ANONYMOUS_SCHEME};
pub use resolver::{DocumentResolver, StaticResolver};
