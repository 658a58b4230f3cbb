pub mod compile;
pub mod document;
pub mod filter;
pub mod memory;
pub mod record;
pub mod sentinel;

pub use compile::{CompiledFilter, EqClause, FilterField, compile};
pub use document::RetrievedDocument;
pub use filter::{FilterPredicates, PatternExtractor, PredicateExtractor, PredicateKey};
pub use memory::{ConversationMemory, ConversationTurn};
pub use record::PriceRecord;
