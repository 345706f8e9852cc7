//! Capability checks for privileged collaborator operations.

use atelier_common::{AppError, AppResult, LocalizedText};
use atelier_db::entities::user::{self, Role};

/// A privilege an operation requires of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Caller is an administrator.
    Admin,
    /// Caller is a collaborator whose application was approved.
    ApprovedCollaborator,
    /// Either of the above.
    AdminOrCollaborator,
}

impl Capability {
    /// Check `account` against this capability.
    pub fn authorize(self, account: &user::Model) -> AppResult<()> {
        let is_admin = account.role == Role::Admin;

        match self {
            Self::Admin if is_admin => Ok(()),
            Self::Admin => Err(AppError::PermissionDenied(LocalizedText::new(
                "Chỉ có admin mới có quyền thực hiện thao tác này",
                "Only admin can perform this action",
            ))),
            Self::ApprovedCollaborator if account.is_collaborator() => Ok(()),
            Self::ApprovedCollaborator => Err(AppError::NotACollaborator),
            Self::AdminOrCollaborator if is_admin || account.is_collaborator() => Ok(()),
            Self::AdminOrCollaborator => Err(AppError::PermissionDenied(LocalizedText::new(
                "Chỉ quản trị viên hoặc cộng tác viên mới có quyền thực hiện",
                "Only admins or approved collaborators can perform this action",
            ))),
        }
    }
}
