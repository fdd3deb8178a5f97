use crate::domain::drive::{FileEntry, FileId, Folder, FolderId, MimeType};

use super::service_error::ServiceError;

/// The cloud file store holding the folders and spreadsheets.
#[async_trait::async_trait]
pub trait FileStorage: Send + Sync {
    /// Resolves a folder id. Fails with `NotFound` when nothing (or a non-folder) is there.
    async fn folder(&self, folder_id: &FolderId) -> error_stack::Result<Folder, ServiceError>;

    /// Lists non-trashed files of `mime_type` directly inside the folder, in the service's
    /// native order.
    async fn list_files(
        &self,
        folder_id: &FolderId,
        mime_type: &MimeType,
    ) -> error_stack::Result<Vec<FileEntry>, ServiceError>;

    async fn file(&self, file_id: &FileId) -> error_stack::Result<FileEntry, ServiceError>;

    async fn parent_ids(&self, file_id: &FileId)
        -> error_stack::Result<Vec<FolderId>, ServiceError>;

    async fn root_folder_id(&self) -> error_stack::Result<FolderId, ServiceError>;

    async fn add_to_folder(
        &self,
        file_id: &FileId,
        folder_id: &FolderId,
    ) -> error_stack::Result<(), ServiceError>;

    async fn remove_from_folder(
        &self,
        file_id: &FileId,
        folder_id: &FolderId,
    ) -> error_stack::Result<(), ServiceError>;

    /// Copies a file into `folder_id` under `name`, returning the new entry.
    async fn copy_file(
        &self,
        file_id: &FileId,
        name: &str,
        folder_id: &FolderId,
    ) -> error_stack::Result<FileEntry, ServiceError>;
}
