pub mod enums;
pub mod measurement;
pub mod medication;
pub mod profile;

pub use enums::*;
pub use measurement::*;
pub use medication::*;
pub use profile::*;
