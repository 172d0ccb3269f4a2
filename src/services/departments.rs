use uuid::Uuid;

use crate::domain::{Department, DepartmentDraft, DepartmentFilters, DepartmentStatus};
use crate::repositories::{DepartmentRepository, StorageError, StorageRepository, UserRepository};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum DepartmentError {
    #[error("Department not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("A department cannot go from {from} to {to}")]
    InvalidTransition {
        from: DepartmentStatus,
        to: DepartmentStatus,
    },
    #[error("An occupied department cannot be deleted")]
    Occupied,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for DepartmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Outcome of a status change: the stored department and how many tenants lost it.
#[derive(Debug)]
pub struct StatusChange {
    pub department: Department,
    pub released_tenants: usize,
}

#[derive(Clone)]
pub struct DepartmentService {
    departments: DepartmentRepository,
    users: UserRepository,
    storage: StorageRepository,
}

impl DepartmentService {
    pub fn new(
        departments: DepartmentRepository,
        users: UserRepository,
        storage: StorageRepository,
    ) -> Self {
        Self {
            departments,
            users,
            storage,
        }
    }

    pub async fn get_all_departments(
        &self,
        status: Option<DepartmentStatus>,
        available_only: bool,
        filters: Option<&DepartmentFilters>,
    ) -> Result<Vec<Department>, anyhow::Error> {
        let status = if available_only {
            Some(DepartmentStatus::Available)
        } else {
            status
        };
        let filters = filters.filter(|f| !f.is_empty());
        self.departments.get_all(status, filters).await
    }

    pub async fn get_department_by_id(
        &self,
        department_id: Uuid,
    ) -> Result<Option<Department>, anyhow::Error> {
        self.departments.get_by_id(department_id).await
    }

    async fn existing(&self, department_id: Uuid) -> Result<Department, DepartmentError> {
        self.departments
            .get_by_id(department_id)
            .await?
            .ok_or(DepartmentError::NotFound)
    }

    #[tracing::instrument(name = "Create department", skip(self, draft))]
    pub async fn create_department(
        &self,
        draft: DepartmentDraft,
    ) -> Result<Department, DepartmentError> {
        let draft = draft.validate().map_err(DepartmentError::Validation)?;
        Ok(self.departments.create(&draft).await?)
    }

    /// A status change through the edit form follows the rules of `change_status`.
    #[tracing::instrument(name = "Update department", skip(self, draft))]
    pub async fn update_department(
        &self,
        department_id: Uuid,
        draft: DepartmentDraft,
    ) -> Result<Department, DepartmentError> {
        let draft = draft.validate().map_err(DepartmentError::Validation)?;
        let current = self.existing(department_id).await?;
        if !current.status.can_transition_to(draft.status) {
            return Err(DepartmentError::InvalidTransition {
                from: current.status,
                to: draft.status,
            });
        }
        if current.status.releases_tenants(draft.status) {
            self.release_tenants(department_id).await?;
        }
        self.departments
            .update(department_id, &draft)
            .await?
            .ok_or(DepartmentError::NotFound)
    }

    #[tracing::instrument(name = "Delete department", skip(self))]
    pub async fn delete_department(&self, department_id: Uuid) -> Result<(), DepartmentError> {
        let department = self.existing(department_id).await?;
        if department.status == DepartmentStatus::Occupied {
            return Err(DepartmentError::Occupied);
        }
        self.departments.delete(department_id).await?;
        if let Some(image_url) = department.image_url.as_deref() {
            if !self.storage.delete_file(image_url).await {
                tracing::warn!(%department_id, "The image of a deleted department was left behind");
            }
        }
        Ok(())
    }

    /// Leaving `occupied` unassigns every tenant of the unit before the status is written.
    #[tracing::instrument(name = "Change department status", skip(self))]
    pub async fn change_status(
        &self,
        department_id: Uuid,
        next: DepartmentStatus,
    ) -> Result<StatusChange, DepartmentError> {
        let current = self.existing(department_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(DepartmentError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }
        if current.status == next {
            return Ok(StatusChange {
                department: current,
                released_tenants: 0,
            });
        }
        let released_tenants = if current.status.releases_tenants(next) {
            self.release_tenants(department_id).await?
        } else {
            0
        };
        let department = self
            .departments
            .update_status(department_id, next)
            .await?
            .ok_or(DepartmentError::NotFound)?;
        Ok(StatusChange {
            department,
            released_tenants,
        })
    }

    async fn release_tenants(&self, department_id: Uuid) -> Result<usize, anyhow::Error> {
        let tenants = self.users.get_tenants_by_department(department_id).await?;
        for tenant in &tenants {
            self.users.set_department(tenant.id, None).await?;
        }
        if !tenants.is_empty() {
            tracing::info!(%department_id, released = tenants.len(), "Tenants released from department");
        }
        Ok(tenants.len())
    }

    pub async fn mark_as_occupied(&self, department_id: Uuid) -> Result<StatusChange, DepartmentError> {
        self.change_status(department_id, DepartmentStatus::Occupied).await
    }

    pub async fn mark_as_available(&self, department_id: Uuid) -> Result<StatusChange, DepartmentError> {
        self.change_status(department_id, DepartmentStatus::Available).await
    }

    #[tracing::instrument(name = "Upload department image", skip(self, content))]
    pub async fn upload_department_image(
        &self,
        department_id: Uuid,
        content: Vec<u8>,
        file_name: &str,
    ) -> Result<Department, DepartmentError> {
        self.existing(department_id).await?;
        let image_url = self.storage.upload_file(content, file_name, None).await?;
        self.departments
            .set_image(department_id, &image_url)
            .await?
            .ok_or(DepartmentError::NotFound)
    }
}
