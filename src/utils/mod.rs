mod password;
mod token;

pub use password::{PASSWORD_HASH_COST, PasswordError, PasswordHasher};
pub use token::{Claims, TokenError, TokenService};
