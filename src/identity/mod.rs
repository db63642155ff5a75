//! Agent identities on the ERC-8004 identity registry.

pub mod extractor;
pub mod registry;

pub use extractor::extract_registered_id;
pub use registry::{decode_metadata, AgentRegistry, AgentVerification, MetadataItem, Registration};
