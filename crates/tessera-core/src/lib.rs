pub mod call;
pub mod config;
pub mod constants;
pub mod epoch;
pub mod error;
pub mod token;
pub mod types;

pub use call::*;
pub use config::*;
pub use constants::*;
pub use epoch::*;
pub use error::TesseraError;
pub use token::*;
pub use types::*;
