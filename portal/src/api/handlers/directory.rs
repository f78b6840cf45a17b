use axum::{
    body::Bytes,
    extract::{Query, State},
};
use tracing::info;

use crate::{
    AppState,
    api::{
        envelope::{Action, ApiResponse, Envelope, decode_action},
        models::{
            IdResponse,
            employees::{DirectoryAction, DirectoryQuery, DirectoryRead, EmployeeResponse},
        },
    },
    auth::{current_session::CurrentSession, policy::authorize},
    config::MissingUpdateBehavior,
    db::handlers::{Employees, Repository},
    errors::Error,
    types::{EmployeeId, Operation, Resource},
};

fn employee_not_found(id: EmployeeId) -> Error {
    Error::NotFound {
        resource: "Employee".to_string(),
        id: id.to_string(),
    }
}

/// List and search employees, list departments, or fetch one employee
#[utoipa::path(
    get,
    path = "/api/directory",
    tag = "directory",
    params(DirectoryQuery),
    responses(
        (status = 200, description = "Employees, departments, or a single employee", body = Envelope),
        (status = 400, description = "Missing or invalid id", body = Envelope),
        (status = 401, description = "Directory reads require a session in this deployment", body = Envelope),
        (status = 403, description = "Guests may not read the directory in this deployment", body = Envelope),
        (status = 404, description = "Employee not found", body = Envelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn directory_query(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<DirectoryQuery>,
) -> Result<ApiResponse, Error> {
    let read = DirectoryRead::try_from(query)?;
    authorize(session.user(), Resource::Directory, Operation::Read, &state.config.access).into_result()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Employees::new(&mut conn);

    match read {
        DirectoryRead::List(filter) => {
            let employees: Vec<EmployeeResponse> = repo.list(&filter).await?.into_iter().map(Into::into).collect();
            ApiResponse::ok(format!("{} employees found", employees.len())).with_data(employees)
        }
        DirectoryRead::Departments => ApiResponse::ok("Departments retrieved").with_data(repo.list_departments().await?),
        DirectoryRead::Get(id) => {
            let employee = repo.get_by_id(id).await?.ok_or_else(|| employee_not_found(id))?;
            ApiResponse::ok("Employee retrieved").with_data(EmployeeResponse::from(employee))
        }
    }
}

/// Create, update or delete an employee (`admin_global` only)
#[utoipa::path(
    post,
    path = "/api/directory",
    tag = "directory",
    request_body = DirectoryAction,
    responses(
        (status = 200, description = "Change applied; data holds the employee id", body = Envelope),
        (status = 400, description = "Malformed body or missing fields", body = Envelope),
        (status = 401, description = "No session", body = Envelope),
        (status = 403, description = "Caller is not admin_global", body = Envelope),
        (status = 404, description = "Employee not found", body = Envelope),
        (status = 405, description = "Unrecognized action", body = Envelope),
        (status = 409, description = "Email already used by another employee", body = Envelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn directory_action(State(state): State<AppState>, session: CurrentSession, body: Bytes) -> Result<ApiResponse, Error> {
    let action: DirectoryAction = decode_action(&body)?;
    authorize(session.user(), DirectoryAction::RESOURCE, action.operation(), &state.config.access).into_result()?;

    match action {
        DirectoryAction::Create(input) => {
            let request = input.into_db_request()?;
            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            let employee = Employees::new(&mut conn).create(&request).await?;

            info!(employee_id = employee.id, "Employee created");
            ApiResponse::ok("Employee created").with_data(IdResponse { id: employee.id })
        }
        DirectoryAction::Update(input) => {
            let id = input.require_id()?;
            let request = input.into_db_request()?;
            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            let updated = Employees::new(&mut conn).update(id, &request).await?;

            let message = match (updated, state.config.access.directory_update_missing) {
                (true, _) => "Employee updated",
                (false, MissingUpdateBehavior::Succeed) => "Employee updated (no matching employee, nothing changed)",
                (false, MissingUpdateBehavior::NotFound) => return Err(employee_not_found(id)),
            };
            info!(employee_id = id, updated, "Employee update processed");
            ApiResponse::ok(message).with_data(IdResponse { id })
        }
        DirectoryAction::Delete(input) => {
            let id = input.require_id()?;
            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            if !Employees::new(&mut conn).delete(id).await? {
                return Err(employee_not_found(id));
            }

            info!(employee_id = id, "Employee deleted");
            ApiResponse::ok("Employee deleted").with_data(IdResponse { id })
        }
    }
}
