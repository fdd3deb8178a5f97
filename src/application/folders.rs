use error_stack::{report, ResultExt};
use tracing::{info, instrument};

use crate::domain::{
    drive::{FileId, Folder, FolderId},
    spreadsheet::SpreadsheetHandle,
};
use crate::ports::{
    file_storage::FileStorage,
    service_error::{ResourceKind, ServiceError},
    spreadsheet_service::SpreadsheetService,
};

/// Creates a spreadsheet and moves it from the root folder into `folder_id`.
#[instrument(skip(storage, sheets))]
pub async fn create_spreadsheet_in_folder(
    storage: &dyn FileStorage,
    sheets: &dyn SpreadsheetService,
    name: &str,
    folder_id: &FolderId,
) -> error_stack::Result<SpreadsheetHandle, ServiceError> {
    let spreadsheet = sheets.create(name).await?;

    storage
        .add_to_folder(&spreadsheet.id, folder_id)
        .await
        .attach_printable_lazy(|| format!("Created {} but could not file it", spreadsheet.url))?;

    let root = storage.root_folder_id().await?;
    if &root != folder_id {
        storage.remove_from_folder(&spreadsheet.id, &root).await?;
    }

    info!("Created '{}' at {}", spreadsheet.name, spreadsheet.url);
    Ok(spreadsheet)
}

/// The first folder holding `file_id`.
#[instrument(skip(storage))]
pub async fn parent_folder(
    storage: &dyn FileStorage,
    file_id: &FileId,
) -> error_stack::Result<Folder, ServiceError> {
    let parents = storage.parent_ids(file_id).await?;
    let parent = parents.first().ok_or_else(|| {
        report!(ServiceError::not_found(ResourceKind::Folder, "<none>"))
            .attach_printable(format!("File {} has no parent folder", file_id))
    })?;

    storage.folder(parent).await
}
