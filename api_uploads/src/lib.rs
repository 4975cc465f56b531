use actix_web::web;

pub mod routes {
    pub mod upload;
}

pub mod services {
    pub mod storage;
    pub(crate) mod upload;
}

pub mod dtos {
    pub mod upload;
}

pub use services::storage::{ObjectStorage, StoredObject, SupabaseStorage};
pub use services::upload::{object_key, sanitize_file_name};

pub fn mount_upload() -> actix_web::Scope {
    web::scope("/upload")
        .service(routes::upload::post_upload)
        .service(routes::upload::get_uploads)
        .service(routes::upload::delete_upload)
}
