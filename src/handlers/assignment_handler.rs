use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    identity::RequestIdentity,
    models::dto::request::CreateAssignmentRequest,
};

#[post("/api/assignments")]
async fn create_assignment(
    state: web::Data<AppState>,
    request: web::Json<CreateAssignmentRequest>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let assignment = state
        .assignment_service
        .create_assignment(request.into_inner(), &identity.user_id)
        .await?;
    Ok(HttpResponse::Created().json(assignment))
}

/// Assignments offered to the caller's group.
#[get("/api/assignments")]
async fn list_assignments(
    state: web::Data<AppState>,
    identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let assignments = state
        .assignment_service
        .list_for_user(&identity.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(assignments))
}

#[get("/api/assignments/by-name/{name}")]
async fn get_assignment_by_name(
    state: web::Data<AppState>,
    name: web::Path<String>,
    _identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let assignment = state.assignment_service.find_by_name(&name).await?;
    Ok(HttpResponse::Ok().json(assignment))
}

#[get("/api/assignments/{id}")]
async fn get_assignment(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    let assignment = state.assignment_service.get_assignment(&id).await?;
    Ok(HttpResponse::Ok().json(assignment))
}

#[delete("/api/assignments/{id}")]
async fn delete_assignment(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _identity: RequestIdentity,
) -> Result<HttpResponse, AppError> {
    state.assignment_service.delete_assignment(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}
