use crate::types::EmployeeId;

/// Column values for inserting or overwriting an employee
#[derive(Debug, Clone)]
pub struct EmployeeDBRequest {
    pub name: String,
    pub position: String,
    pub department: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EmployeeDBResponse {
    pub id: EmployeeId,
    pub name: String,
    pub position: String,
    pub department: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub photo_url: Option<String>,
}

/// Department value the frontend sends to mean "no department filter"
pub const ALL_DEPARTMENTS: &str = "Todos";

/// Directory listing filter. Empty values and [`ALL_DEPARTMENTS`] are normalized away on
/// construction, so a default filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub department: Option<String>,
}

impl EmployeeFilter {
    pub fn new(search: Option<String>, department: Option<String>) -> Self {
        let search = search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let department = department
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty() && d != ALL_DEPARTMENTS);
        Self { search, department }
    }
}
