use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::envelope::{Action, RequiredFields, present},
    db::models::employees::{EmployeeDBRequest, EmployeeDBResponse, EmployeeFilter},
    errors::{Error, Result},
    types::{EmployeeId, Operation, Resource},
};

/// POST body for `/api/directory`
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DirectoryAction {
    Create(EmployeeInput),
    Update(EmployeeInput),
    Delete(EmployeeInput),
}

impl Action for DirectoryAction {
    const RESOURCE: Resource = Resource::Directory;
    const NAMES: &'static [&'static str] = &["create", "update", "delete"];

    fn operation(&self) -> Operation {
        match self {
            DirectoryAction::Create(_) => Operation::Create,
            DirectoryAction::Update(_) => Operation::Update,
            DirectoryAction::Delete(_) => Operation::Delete,
        }
    }
}

/// Employee fields as sent by clients. Everything is optional at this stage so that missing
/// fields are reported together with a 400 rather than as a decoding error.
#[serde_as]
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EmployeeInput {
    /// Number or numeric string
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<i64>)]
    pub id: Option<EmployeeId>,
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    #[serde(alias = "puesto")]
    pub position: Option<String>,
    #[serde(alias = "departamento")]
    pub department: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "telefono")]
    pub phone: Option<String>,
    #[serde(alias = "ubicacion")]
    pub location: Option<String>,
    #[serde(alias = "foto_url")]
    pub photo_url: Option<String>,
}

impl EmployeeInput {
    /// Checks the mandatory fields (name, position, department, email) and builds the row.
    /// Optional fields that are blank are stored as NULL.
    pub fn into_db_request(self) -> Result<EmployeeDBRequest> {
        let mut required = RequiredFields::default();
        let name = required.take("name", &self.name);
        let position = required.take("position", &self.position);
        let department = required.take("department", &self.department);
        let email = required.take("email", &self.email);
        required.finish()?;

        Ok(EmployeeDBRequest {
            name: name.to_string(),
            position: position.to_string(),
            department: department.to_string(),
            email: email.to_string(),
            phone: present(&self.phone).map(str::to_string),
            location: present(&self.location).map(str::to_string),
            photo_url: present(&self.photo_url).map(str::to_string),
        })
    }

    pub fn require_id(&self) -> Result<EmployeeId> {
        self.id.ok_or_else(|| Error::BadRequest {
            message: "Missing required fields: id".to_string(),
        })
    }
}

/// Query string for `GET /api/directory`
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DirectoryQuery {
    /// `departments` (or `list_departments`), `get_employee`, or absent to list
    pub action: Option<String>,
    /// Employee id for `get_employee`
    pub id: Option<String>,
    /// Case-insensitive match on name, position or email
    pub search: Option<String>,
    /// Exact department; `Todos` means all
    #[serde(alias = "departamento")]
    pub department: Option<String>,
}

/// A decoded directory read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRead {
    List(EmployeeFilter),
    Departments,
    Get(EmployeeId),
}

impl TryFrom<DirectoryQuery> for DirectoryRead {
    type Error = Error;

    fn try_from(query: DirectoryQuery) -> Result<Self> {
        match query.action.as_deref() {
            Some("departments" | "list_departments") => Ok(DirectoryRead::Departments),
            Some("get_employee") => {
                let raw = present(&query.id).ok_or_else(|| Error::BadRequest {
                    message: "Missing required fields: id".to_string(),
                })?;
                let id = raw.parse().map_err(|_| Error::BadRequest {
                    message: format!("Invalid employee id '{raw}'"),
                })?;
                Ok(DirectoryRead::Get(id))
            }
            _ => Ok(DirectoryRead::List(EmployeeFilter::new(query.search, query.department))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: EmployeeId,
    pub name: String,
    pub position: String,
    pub department: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub photo_url: Option<String>,
}

impl From<EmployeeDBResponse> for EmployeeResponse {
    fn from(db: EmployeeDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            position: db.position,
            department: db.department,
            email: db.email,
            phone: db.phone,
            location: db.location,
            photo_url: db.photo_url,
        }
    }
}
