mod handler;
mod model;

pub use handler::{login, signup, verify_token};
pub use model::{LoginResponse, SignupResponse, VerifyTokenResponse};
