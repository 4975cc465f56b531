pub struct UserCreateRequest {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub email_verified: bool,
}
