pub mod coerce;
pub mod path;
pub mod session;

pub use coerce::*;
pub use path::FieldPath;
pub use session::*;
