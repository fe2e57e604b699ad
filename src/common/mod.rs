mod tally;
mod value;

pub use tally::Skip;
pub(crate) use tally::Tally;
pub use value::{Attrs, Value};
