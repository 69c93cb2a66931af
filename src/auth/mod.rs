pub mod identity;
pub mod password;
pub mod policy;
pub mod token;

pub use identity::Identity;
pub use policy::{authorize, require_role, PolicyError, RequiredRole};
pub use token::{Claims, TokenError, TokenSigner};
