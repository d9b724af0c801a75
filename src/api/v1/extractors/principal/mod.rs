mod core;
mod types;

pub use self::core::PrincipalExtractor;
pub use types::Principal;
