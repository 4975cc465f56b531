use actix_web::web;

pub mod routes {
    pub mod swap;
}

pub mod services {
    pub mod provider;
    pub(crate) mod swap;
}

pub mod dtos {
    pub mod swap;
}

pub use services::provider::{FaceSwapProvider, HttpFaceSwapProvider, SwapJob};

pub fn mount_swap() -> actix_web::Scope {
    web::scope("/swap")
        .service(routes::swap::post_swap)
        .service(routes::swap::get_swap)
}
