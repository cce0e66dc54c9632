pub mod parser;

pub use parser::{DecodedEvent, EventParser};
