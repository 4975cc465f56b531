use actix_web::web::{self};

pub mod routes {
    pub mod checkout;
    pub mod credits;
    pub mod packages;
    pub mod subscription;
    pub mod webhook;
}

mod services {
    pub(crate) mod checkout;
    pub(crate) mod credit;
    pub(crate) mod customer;
    pub(crate) mod subscription;
    pub(crate) mod webhook;
}

pub mod dtos {
    pub mod checkout;
    pub mod credit;
    pub mod subscription;
}

pub use services::credit::clamp_limit;
pub use services::webhook::{CreditGrant, WebhookAction, webhook_action};

/// Public catalog of credit packages.
pub fn mount_packages() -> actix_web::Scope {
    web::scope("/packages").service(routes::packages::get_packages)
}

pub fn mount_checkout() -> actix_web::Scope {
    web::scope("/checkout").service(routes::checkout::post_checkout)
}

pub fn mount_pay() -> actix_web::Scope {
    web::scope("/pay").service(routes::checkout::post_payment_intent)
}

pub fn mount_subscription() -> actix_web::Scope {
    web::scope("/subscription")
        .service(routes::subscription::get_status)
        .service(routes::subscription::post_subscribe)
        .service(routes::subscription::post_auto_renew)
}

pub fn mount_credits() -> actix_web::Scope {
    web::scope("/credits")
        .service(routes::credits::get_balance)
        .service(routes::credits::get_transactions)
}

// Called by Stripe, stays outside the secured scope
pub fn mount_webhook() -> actix_web::Scope {
    web::scope("/pay").service(routes::webhook::post_webhook)
}
