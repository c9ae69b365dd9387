use serde::Serialize;

use crate::auth::PublicUser;

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenResponse {
    pub is_valid: bool,
    pub user_id: i32,
    pub email: String,
}
