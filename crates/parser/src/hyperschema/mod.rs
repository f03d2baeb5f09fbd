//! JSON Hyper-Schema loader
//!
//! Parses a hypermedia schema (the Heroku Platform API dialect) into an arena
//! of definitions addressed by JSON pointer.
//!
//! ## Shape of the input
//! - `definitions`: one entry per resource (`app`, `add-on`, ...)
//! - each resource carries `properties`, nested `definitions` and `links`
//! - links describe operations: `href`, `method`, `rel`, `schema`, `targetSchema`
//!
//! ## Usage
//! ```rust,ignore
//! use hyperschema_stackql_parser::hyperschema::HyperSchemaParser;
//!
//! let doc = HyperSchemaParser::from_file("schema.json")?.load()?;
//! for definition in doc.top_level() {
//!     println!("{} ({} links)", definition.key, definition.links.len());
//! }
//! ```

mod loader;
mod parser;
mod types;

pub use loader::load;
pub use parser::HyperSchemaParser;
pub use types::*;
