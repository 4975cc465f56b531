use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{AppError, Res};

/// Wraps a serializable body into the `{ "success": true, ... }` envelope.
/// Objects get the flag merged in, anything else lands under `data`.
pub fn envelope<T: Serialize>(body: T) -> Value {
    match serde_json::to_value(body) {
        Ok(Value::Object(mut map)) => {
            map.insert("success".to_string(), Value::Bool(true));
            Value::Object(map)
        }
        Ok(Value::Null) => json!({ "success": true }),
        Ok(other) => json!({ "success": true, "data": other }),
        Err(e) => {
            log::error!("Failed to serialize response body: {}", e);
            json!({ "success": false, "error": "Internal server error" })
        }
    }
}

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(envelope(body)))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(envelope(body)))
    }
}

/// JSON extractor config that turns malformed payloads into `AppError::BadRequest`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid JSON payload: {}", err)).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query string: {}", err)).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Balance {
        balance: i64,
    }

    #[test]
    fn envelope_merges_success_flag_into_objects() {
        let value = envelope(Balance { balance: 12 });
        assert_eq!(value, json!({ "success": true, "balance": 12 }));
    }

    #[test]
    fn envelope_wraps_non_objects() {
        assert_eq!(envelope(vec![1, 2]), json!({ "success": true, "data": [1, 2] }));
        assert_eq!(envelope(()), json!({ "success": true }));
    }
}
