use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    identity::RequestIdentity,
    models::dto::request::{ReportTimeRequest, SeedAttemptRequest, SubmitAnswerRequest},
};

#[post("/api/assignments/{id}/attempts")]
async fn start_or_resume(
    state: web::Data<AppState>,
    id: web::Path<String>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let view = state
        .attempt_service
        .start_or_resume(&id, &identity.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Assigner pre-seeds a NotStarted attempt for one student.
#[post("/api/assignments/{id}/attempts/seed")]
async fn seed_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SeedAttemptRequest>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let view = state
        .attempt_service
        .seed_attempt(&id, &identity.user_id, &request.user_id)
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// Assigner's results view over one assignment.
#[get("/api/assignments/{id}/attempts")]
async fn list_attempts(
    state: web::Data<AppState>,
    id: web::Path<String>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let views = state
        .attempt_service
        .list_for_assignment(&id, &identity.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(views))
}

#[post("/api/attempts/{id}/answers")]
async fn submit_answer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SubmitAnswerRequest>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .attempt_service
        .submit_answer(&id, &identity.user_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(outcome))
}

#[post("/api/attempts/{id}/finish")]
async fn finish_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<ReportTimeRequest>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let result = state
        .attempt_service
        .finish(&id, &identity.user_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/attempts/{id}/leave")]
async fn leave_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<ReportTimeRequest>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let view = state
        .attempt_service
        .leave(&id, &identity.user_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[get("/api/attempts/{id}/score")]
async fn get_score(
    state: web::Data<AppState>,
    id: web::Path<String>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let result = state
        .attempt_service
        .score_of(&id, &identity.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/api/attempts/{id}/answers")]
async fn list_answers(
    state: web::Data<AppState>,
    id: web::Path<String>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let entries = state
        .attempt_service
        .answers_of(&id, &identity.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Remove one attempt together with its answer history.
#[delete("/api/attempts/{id}")]
async fn delete_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    state
        .attempt_service
        .delete_attempt(&id, &identity.user_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/health/ready")]
async fn health_check_ready(state: web::Data<AppState>) -> HttpResponse {
    let db_health = state.db.health_check().await;

    let status = if db_health.is_ok() { "ready" } else { "not_ready" };
    let response = serde_json::json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "mongodb": if db_health.is_ok() { "ok" } else { "error" }
        }
    });

    if db_health.is_ok() {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().service(health_check)).await;

        let req = test::TestRequest::get().uri("/health").to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
