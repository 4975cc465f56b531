use middleware::extractor::ExtractionMiddleware;

pub mod middleware {
    pub mod extractor;
}

/// Name of the cookie-session key holding the JWT for browser clients.
pub const SESSION_TOKEN_KEY: &str = "token";

pub fn middleware() -> ExtractionMiddleware {
    ExtractionMiddleware::new()
}
