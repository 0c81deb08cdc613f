use std::sync::Arc;

use axum::{body::Bytes, extract::State as Extract, Json};
use shared::models::{CreateTodoRequest, Todo};
use tracing::info;
use uuid::Uuid;

use super::parse_valid;
use crate::{error::AppError, state::State};

pub async fn list_todos_handler(Extract(state): Extract<Arc<State>>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = sqlx::query_as::<_, Todo>("SELECT id, title, created_at FROM todos ORDER BY created_at")
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(todos))
}

pub async fn create_todo_handler(
    Extract(state): Extract<Arc<State>>,
    body: Bytes,
) -> Result<Json<Todo>, AppError> {
    let request: CreateTodoRequest = parse_valid(&body)?;

    let todo = sqlx::query_as::<_, Todo>(
        "INSERT INTO todos (id, title) VALUES ($1, $2) RETURNING id, title, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&request.title)
    .fetch_one(&state.db_pool)
    .await?;

    info!("Created todo {}", todo.id);
    Ok(Json(todo))
}
