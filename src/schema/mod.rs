pub mod render;
pub mod sections;

pub use render::*;
pub use sections::*;
