//! Document representation: the fragment model and the character stream
//! the parsers read it through.
//!
//! The document is an ordered sequence of fragments — text runs and line
//! breaks — kept in an arena with stable identifiers, so that untouched
//! regions keep their identity (and whatever the host hangs off them)
//! across highlight passes.

pub mod fragment;
pub mod seq;
pub mod stream;

pub use fragment::{BreakFragment, Fragment, TextFragment};
pub use seq::{FragmentId, FragmentSeq};
pub use stream::{CharStream, StreamPos};
