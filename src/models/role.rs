use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Supervisor,
    FieldLead,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RolePermission {
    ReadData,
    CreateReport,
    UpdateReport,
    DeleteReport,
    ManageProjects,
    ManageFleet,
    ManagePersonnel,
    ManageCatalogs,
    ManageUsers,
}

impl UserRole {
    pub fn permits(&self, permit: RolePermission) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Supervisor => permit != RolePermission::ManageUsers,
            UserRole::FieldLead => matches!(
                permit,
                RolePermission::ReadData
                    | RolePermission::CreateReport
                    | RolePermission::UpdateReport
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_matrix() {
        assert!(UserRole::Admin.permits(RolePermission::ManageUsers));
        assert!(UserRole::Supervisor.permits(RolePermission::DeleteReport));
        assert!(!UserRole::Supervisor.permits(RolePermission::ManageUsers));
        assert!(UserRole::FieldLead.permits(RolePermission::UpdateReport));
        assert!(!UserRole::FieldLead.permits(RolePermission::DeleteReport));
        assert!(!UserRole::FieldLead.permits(RolePermission::ManageFleet));
    }
}
