use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::errors::AppError;

/// The caller's identity, carried explicitly into every engine operation.
/// The fronting session layer authenticates the user and forwards the id in
/// the `x-user-id` header; nothing here keeps process-wide identity state.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub user_id: String,
}

impl FromRequest for RequestIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req
            .headers()
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| RequestIdentity {
                user_id: value.to_string(),
            })
            .ok_or_else(|| AppError::Unauthorized("missing x-user-id header".to_string()));

        ready(identity)
    }
}
