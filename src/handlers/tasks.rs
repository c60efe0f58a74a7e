use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{MessageResponse, NewTask, TaskPatch};
use crate::state::AppState;

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

pub async fn list_tasks(state: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let tasks = state.tasks.list_for_owner(&user.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthUser,
    input: web::Json<NewTask>,
) -> ApiResult<HttpResponse> {
    let input = input.into_inner().normalized();
    input.validate()?;

    let task = state.tasks.create(&user.id, input).await?;
    Ok(HttpResponse::Created().json(task))
}

pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<String>,
    patch: web::Json<TaskPatch>,
) -> ApiResult<HttpResponse> {
    let patch = patch.into_inner().normalized();
    patch.validate()?;

    match state.tasks.update(&user.id, &id, patch).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(task_not_found()),
    }
}

pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    if state.tasks.delete(&user.id, &id).await? {
        Ok(HttpResponse::Ok().json(MessageResponse::new("Task deleted")))
    } else {
        Err(task_not_found())
    }
}
