use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegistrationDetailsRequest {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub cause: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub user_role: Option<String>,
    /// Optional NGO-cause profile captured alongside the account.
    pub registration: Option<RegistrationDetailsRequest>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
