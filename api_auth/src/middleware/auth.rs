use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use common::{error::AppError, jwt::get_jwt_claims_or_error};
use futures::future::{Ready, ok};
use sqlx::PgPool;

/// Guards a scope: the request must carry valid claims (see the extraction
/// middleware) whose session row is still live. On success the claims are
/// inserted as plain `JwtClaims` so handlers can take `web::ReqData<JwtClaims>`.
pub struct AuthMiddleware {}

impl AuthMiddleware {
    pub fn new() -> Self {
        AuthMiddleware {}
    }
}

impl Default for AuthMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Arc::clone(&self.service);

        let claims = match get_jwt_claims_or_error(&req) {
            Ok(claims) => claims,
            Err(response) => {
                // missing or invalid token - 401
                return Box::pin(async move { Ok(req.into_response(response)) });
            }
        };

        let pool = req
            .app_data::<web::Data<Arc<PgPool>>>()
            .map(|pool| Arc::clone(pool.get_ref()));

        Box::pin(async move {
            let Some(pool) = pool else {
                let response = AppError::Internal("Database pool is not registered".to_string())
                    .to_http_response();
                return Ok(req.into_response(response));
            };

            match db::auth::is_session_active(&*pool, claims.session_id, claims.user_id).await {
                Ok(true) => {
                    req.extensions_mut().insert(claims);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Ok(false) => {
                    let response =
                        AppError::Unauthorized("Session expired or revoked".to_string())
                            .to_http_response();
                    Ok(req.into_response(response))
                }
                Err(e) => Ok(req.into_response(e.to_http_response())),
            }
        })
    }
}
