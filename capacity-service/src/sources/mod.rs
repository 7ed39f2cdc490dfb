pub mod lookup;
pub mod response_file;

pub use lookup::LookupSource;
pub use response_file::ResponseFileSource;
