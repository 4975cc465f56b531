// HTTP-level tests for the swap scope with the provider stubbed out.
//
// Validation tests run on a lazy pool. The `sqlx::test` ones get a migrated
// database of their own and cover the credit accounting.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use actix_web::{App, HttpMessage, dev::Service, http::StatusCode, test, web};
use api_swap::{FaceSwapProvider, SwapJob};
use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::JwtClaims,
    misc::UploadKind,
};
use db::dtos::{upload::UploadCreateRequest, user::UserCreateRequest};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

#[derive(Default)]
struct StubProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl StubProvider {
    fn failing() -> Self {
        StubProvider {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl FaceSwapProvider for StubProvider {
    async fn create_swap(&self, _source_url: &str, _target_url: &str) -> Res<SwapJob> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Upstream("provider is down".to_string()));
        }
        Ok(SwapJob {
            job_id: "job_stub".to_string(),
            status: "queued".to_string(),
            result_url: None,
        })
    }

    async fn get_swap(&self, job_id: &str) -> Res<SwapJob> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SwapJob {
            job_id: job_id.to_string(),
            status: "succeeded".to_string(),
            result_url: Some("https://cdn.example.com/result.png".to_string()),
        })
    }
}

fn lazy_pool() -> Arc<PgPool> {
    Arc::new(
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/faceswap_test")
            .unwrap(),
    )
}

macro_rules! app {
    ($provider:expr) => {
        app!($provider, lazy_pool(), Uuid::new_v4())
    };
    ($provider:expr, $pool:expr, $user_id:expr) => {{
        let provider: Arc<dyn FaceSwapProvider> = $provider.clone();
        let claims = JwtClaims {
            user_id: $user_id,
            session_id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            exp: usize::MAX,
        };
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool))
                .app_data(web::Data::new(Arc::new(Config::default())))
                .app_data(web::Data::new(provider))
                .app_data(common::http::json_config())
                .wrap_fn(move |req, srv| {
                    req.extensions_mut().insert(claims.clone());
                    srv.call(req)
                })
                .service(web::scope("/api/secured").service(api_swap::mount_swap())),
        )
        .await
    }};
}

struct Fixture {
    user_id: Uuid,
    source_id: Uuid,
    target_id: Uuid,
}

async fn seed_user(pool: &PgPool, email: &str, credits: i64) -> Fixture {
    let user = db::user::insert_user(
        pool,
        UserCreateRequest {
            email: email.to_string(),
            name: "Ada".to_string(),
            image: None,
            email_verified: true,
        },
    )
    .await
    .unwrap();

    let mut ids = Vec::new();
    for kind in [UploadKind::Source, UploadKind::Target] {
        let upload = db::upload::insert_upload(
            pool,
            UploadCreateRequest {
                user_id: user.id,
                file_key: format!("{}/{}/face.png", user.id, kind),
                url: format!("https://cdn.example.com/{}/{}/face.png", user.id, kind),
                content_type: "image/png".to_string(),
                kind,
                size_bytes: 3,
            },
        )
        .await
        .unwrap();
        ids.push(upload.id);
    }

    if credits > 0 {
        db::credit::increment_balance(pool, user.id, credits)
            .await
            .unwrap();
    }

    Fixture {
        user_id: user.id,
        source_id: ids[0],
        target_id: ids[1],
    }
}

fn swap_request(fixture: &Fixture) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/secured/swap")
        .set_json(serde_json::json!({
            "source_upload_id": fixture.source_id,
            "target_upload_id": fixture.target_id
        }))
}

#[actix_web::test]
async fn swapping_an_upload_with_itself_is_bad_request() {
    let provider = Arc::new(StubProvider::default());
    let app = app!(provider);
    let id = Uuid::new_v4();
    let req = test::TestRequest::post()
        .uri("/api/secured/swap")
        .set_json(serde_json::json!({ "source_upload_id": id, "target_upload_id": id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn swap_with_malformed_ids_is_bad_request() {
    let provider = Arc::new(StubProvider::default());
    let app = app!(provider);
    let req = test::TestRequest::post()
        .uri("/api/secured/swap")
        .set_json(serde_json::json!({ "source_upload_id": "face", "target_upload_id": 7 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn swap_charges_one_credit_and_echoes_the_job(pool: PgPool) {
    let fixture = seed_user(&pool, "ada@example.com", 3).await;
    let provider = Arc::new(StubProvider::default());
    let app = app!(provider, Arc::new(pool.clone()), fixture.user_id);

    let resp = test::call_service(&app, swap_request(&fixture).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["job_id"], "job_stub");
    assert_eq!(body["status"], "queued");
    assert_eq!(body["balance"], 2);

    assert_eq!(db::credit::get_balance(&pool, fixture.user_id).await.unwrap(), 2);
    let usage = db::credit::get_user_transaction_by_reference(&pool, fixture.user_id, "job_stub")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(usage.amount, -1);
    assert_eq!(usage.kind, "usage");

    let req = test::TestRequest::get()
        .uri("/api/secured/swap/job_stub")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["job_id"], "job_stub");
    assert_eq!(body["result_url"], "https://cdn.example.com/result.png");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn swap_without_credits_is_payment_required(pool: PgPool) {
    let fixture = seed_user(&pool, "ada@example.com", 0).await;
    let provider = Arc::new(StubProvider::default());
    let app = app!(provider, Arc::new(pool.clone()), fixture.user_id);

    let resp = test::call_service(&app, swap_request(&fixture).to_request()).await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn provider_failure_leaves_balance_untouched(pool: PgPool) {
    let fixture = seed_user(&pool, "ada@example.com", 2).await;
    let provider = Arc::new(StubProvider::failing());
    let app = app!(provider, Arc::new(pool.clone()), fixture.user_id);

    let resp = test::call_service(&app, swap_request(&fixture).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    assert_eq!(db::credit::get_balance(&pool, fixture.user_id).await.unwrap(), 2);
    let history = db::credit::get_transactions_by_user_id(&pool, fixture.user_id, 10)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unrecorded_job_is_not_charged(pool: PgPool) {
    let fixture = seed_user(&pool, "ada@example.com", 5).await;
    let provider = Arc::new(StubProvider::default());
    let app = app!(provider, Arc::new(pool.clone()), fixture.user_id);

    let resp = test::call_service(&app, swap_request(&fixture).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // the stub hands out the same job id again, so the usage row cannot be written
    let resp = test::call_service(&app, swap_request(&fixture).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(db::credit::get_balance(&pool, fixture.user_id).await.unwrap(), 4);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn uploads_of_another_user_are_not_found(pool: PgPool) {
    let owner = seed_user(&pool, "ada@example.com", 5).await;
    let intruder = seed_user(&pool, "eve@example.com", 5).await;
    let provider = Arc::new(StubProvider::default());
    let app = app!(provider, Arc::new(pool.clone()), intruder.user_id);

    let resp = test::call_service(&app, swap_request(&owner).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(db::credit::get_balance(&pool, intruder.user_id).await.unwrap(), 5);
}
