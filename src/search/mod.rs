//! Search engine access for the repositories
//!
//! Everything the repositories need to talk to an Elasticsearch-compatible
//! engine lives here:
//!
//! - **Filters**: field-aware predicate construction ([`build_filter`])
//! - **Provisioning**: lazy, race-tolerant index creation ([`IndexProvisioner`])
//! - **Decoding**: typed views of hit and by-query envelopes ([`decode`])
//! - **Scripts**: parameterized partial updates ([`UpdateScript`])
//! - **Engines**: the [`SearchEngine`] seam with an HTTP implementation
//!   ([`ElasticEngine`]) and an in-process one ([`InMemoryEngine`])
//!
//! # Example
//!
//! ```no_run
//! use docsys::search::{build_filter, ElasticEngine, IndexedField, SearchConfig, SearchEngine, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = ElasticEngine::connect(&SearchConfig::default()).await?;
//!
//!     let filter = build_filter(IndexedField::Email, "ada@example.com");
//!     let raw = engine.search("users_19092022", &SearchRequest::count(filter)).await?;
//!     println!("{}", raw);
//!
//!     Ok(())
//! }
//! ```

mod config;
pub mod decode;
mod elastic;
mod engine;
mod error;
mod filter;
mod memory;
mod provision;
mod script;

pub use config::{IndexSettings, RefreshPolicy, SearchConfig, SearchConfigBuilder};
pub use decode::{decode, decode_by_query, decode_total, ByQueryCounts, DecodeError, Hits};
pub use elastic::ElasticEngine;
pub use engine::{IndexDefinition, SearchEngine, SearchRequest};
pub use error::{SearchError, SearchResult};
pub use filter::{build_filter, FilterExpression, IndexedField, MatcherKind};
pub use memory::InMemoryEngine;
pub use provision::{IndexProvisioner, ProvisionError, Provisioned};
pub use script::{format_timestamp, UpdateScript, ASSIGN_FIELDS_SOURCE};
