pub mod culture;
pub mod geojson;
pub mod key;

pub use culture::*;
pub use geojson::*;
pub use key::*;
