pub mod contract_codec;

pub use contract_codec::{ContractCodec, canonical_signature, event_topic, selector};
