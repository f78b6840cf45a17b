use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::employees::{EmployeeDBRequest, EmployeeDBResponse, EmployeeFilter},
    },
    types::EmployeeId,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

const EMPLOYEE_COLUMNS: &str = "SELECT id, name, position, department, email, phone, location, photo_url FROM employees";

pub struct Employees<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Employees<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Distinct department names, ascending
    #[instrument(skip(self), err)]
    pub async fn list_departments(&mut self) -> Result<Vec<String>> {
        let departments = sqlx::query_scalar::<_, String>("SELECT DISTINCT department FROM employees ORDER BY department ASC")
            .fetch_all(&mut *self.db)
            .await?;
        Ok(departments)
    }
}

/// Value of the `search_text` column. SQLite's `LOWER()` only folds ASCII, so accented
/// names are lowercased here instead.
fn search_text(request: &EmployeeDBRequest) -> String {
    [&request.name, &request.position, &request.email]
        .map(|field| field.to_lowercase())
        .join("\n")
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search.to_lowercase().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait::async_trait]
impl<'c> Repository for Employees<'c> {
    type CreateRequest = EmployeeDBRequest;
    type UpdateRequest = EmployeeDBRequest;
    type Response = EmployeeDBResponse;
    type Id = EmployeeId;
    type Filter = EmployeeFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = sqlx::query(
            "INSERT INTO employees (name, position, department, email, phone, location, photo_url, search_text) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.name)
        .bind(&request.position)
        .bind(&request.department)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.location)
        .bind(&request.photo_url)
        .bind(search_text(request))
        .execute(&mut *self.db)
        .await?
        .last_insert_rowid();

        Ok(EmployeeDBResponse {
            id,
            name: request.name.clone(),
            position: request.position.clone(),
            department: request.department.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            location: request.location.clone(),
            photo_url: request.photo_url.clone(),
        })
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let employee = sqlx::query_as::<_, EmployeeDBResponse>(&format!("{EMPLOYEE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(employee)
    }

    /// Search is a case-insensitive substring match on name, position or email; the
    /// department must match exactly. Both filters combine with AND.
    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(EMPLOYEE_COLUMNS);
        query.push(" WHERE 1=1");

        if let Some(search) = &filter.search {
            query.push(" AND search_text LIKE ");
            query.push_bind(like_pattern(search));
            query.push(" ESCAPE '\\'");
        }

        if let Some(department) = &filter.department {
            query.push(" AND department = ");
            query.push_bind(department.clone());
        }

        query.push(" ORDER BY name ASC, id ASC");

        let employees = query.build_query_as::<EmployeeDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(employees)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE employees SET name = ?, position = ?, department = ?, email = ?, phone = ?, location = ?, photo_url = ?, \
             search_text = ? WHERE id = ?",
        )
        .bind(&request.name)
        .bind(&request.position)
        .bind(&request.department)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.location)
        .bind(&request.photo_url)
        .bind(search_text(request))
        .bind(id)
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
