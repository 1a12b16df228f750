mod access_control;
mod backend;

pub use access_control::*;
pub use backend::*;
