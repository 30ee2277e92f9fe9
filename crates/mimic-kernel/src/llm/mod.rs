pub mod provider;
pub mod streaming;
pub mod types;

pub use provider::*;
pub use streaming::*;
pub use types::*;
