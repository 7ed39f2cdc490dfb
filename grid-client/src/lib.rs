pub mod domain;
pub mod identifier;
pub mod normalize;
pub mod source;

pub use identifier::{ChainIdentifier, IdentifierError};
pub use normalize::{summarize, BottleneckPolicy, CapacityNormalizer};
pub use source::{AddressQuery, GridDataSource, LookupQuery, SourceError};
