pub mod extractor;
pub mod frame;
pub mod probe;
pub mod source;

#[cfg(test)]
pub mod test_support;

pub use extractor::*;
pub use frame::*;
pub use probe::*;
pub use source::*;
