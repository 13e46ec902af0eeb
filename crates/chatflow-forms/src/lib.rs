//! Composable multi-step input collection.
//!
//! A [`Processor`] turns one text message at a time into a typed value.
//! Leaves parse a single value, [`Pipe`] layers validation on a processor,
//! [`ListProcessor`] repeats one, and [`Form`] sequences several into one
//! aggregate. [`Handler`] adds the business-rule commit step in front of a
//! conversational state.

pub mod form;
pub mod handler;
pub mod leaf;
pub mod list;
pub mod lookup;
pub mod outcome;
pub mod pipe;
pub mod processor;
pub mod validate;

pub use form::Form;
pub use handler::Handler;
pub use leaf::{Leaf, Leaves};
pub use list::ListProcessor;
pub use lookup::{Lookup, LookupError, LookupProcessor};
pub use outcome::Outcome;
pub use pipe::Pipe;
pub use processor::{CancelWords, Processor, Prompt};
