use chrono::Utc;
use error_stack::{report, Report, ResultExt};
use google_drive3::{api::File, DriveHub};
use tracing::{debug, instrument};

use crate::domain::drive::{FileEntry, FileId, Folder, FolderId, MimeType};
use crate::ports::{
    file_storage::FileStorage,
    service_error::{ResourceKind, ServiceError},
};

use super::{
    auth::GoogleAuthenticator,
    error::{classify_body, classify_status},
    http_client::{HttpClient, HttpsConnector},
};

const ENTRY_FIELDS: &str = "id,name,mimeType,modifiedTime";

pub struct GoogleDrive {
    hub: DriveHub<HttpsConnector>,
}

impl std::fmt::Debug for GoogleDrive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GoogleDrive")
    }
}

fn service_error(error: google_drive3::Error, kind: ResourceKind, id: &str) -> Report<ServiceError> {
    let context = match &error {
        google_drive3::Error::BadRequest(body) => classify_body(body, kind, id),
        google_drive3::Error::Failure(response) => {
            classify_status(response.status().as_u16(), kind, id)
        }
        other => ServiceError::unclassified(other.to_string()),
    };
    Report::new(error).change_context(context)
}

fn file_entry(file: File) -> error_stack::Result<FileEntry, ServiceError> {
    let id = file
        .id
        .ok_or_else(|| report!(ServiceError::unclassified("Drive returned a file without id")))?;

    Ok(FileEntry {
        name: file.name.unwrap_or_default(),
        modified_time: file.modified_time.unwrap_or_else(Utc::now),
        mime_type: file
            .mime_type
            .as_deref()
            .unwrap_or_default()
            .parse()
            .unwrap_or_else(|_| MimeType::Other(String::new())),
        id: FileId::new(id),
    })
}

fn children_query(folder_id: &FolderId, mime_type: &MimeType) -> String {
    format!(
        "'{}' in parents and mimeType = '{}' and trashed = false",
        folder_id, mime_type
    )
}

impl GoogleDrive {
    pub fn new(client: HttpClient, authenticator: GoogleAuthenticator) -> Self {
        Self {
            hub: DriveHub::new(client, authenticator),
        }
    }

    async fn get(
        &self,
        file_id: &str,
        fields: &str,
        kind: ResourceKind,
    ) -> error_stack::Result<File, ServiceError> {
        self.hub
            .files()
            .get(file_id)
            .param("fields", fields)
            .supports_all_drives(true)
            .doit()
            .await
            .map(|(_, file)| file)
            .map_err(|e| service_error(e, kind, file_id))
    }
}

#[async_trait::async_trait]
impl FileStorage for GoogleDrive {
    #[instrument]
    async fn folder(&self, folder_id: &FolderId) -> error_stack::Result<Folder, ServiceError> {
        let file = self
            .get(folder_id.as_ref(), "id,name,mimeType", ResourceKind::Folder)
            .await?;

        if file.mime_type.as_deref() != Some(MimeType::Folder.to_string().as_str()) {
            return Err(report!(ServiceError::not_found(
                ResourceKind::Folder,
                folder_id.as_ref()
            )))
            .attach_printable_lazy(|| format!("{} is a {:?}", folder_id, file.mime_type));
        }

        Ok(Folder {
            id: folder_id.clone(),
            name: file.name.unwrap_or_default(),
        })
    }

    #[instrument]
    async fn list_files(
        &self,
        folder_id: &FolderId,
        mime_type: &MimeType,
    ) -> error_stack::Result<Vec<FileEntry>, ServiceError> {
        let query = children_query(folder_id, mime_type);
        let fields = format!("nextPageToken,files({})", ENTRY_FIELDS);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut call = self
                .hub
                .files()
                .list()
                .q(&query)
                .param("fields", fields.as_str())
                .supports_all_drives(true)
                .include_items_from_all_drives(true);
            if let Some(token) = &page_token {
                call = call.page_token(token);
            }

            let (_, list) = call
                .doit()
                .await
                .map_err(|e| service_error(e, ResourceKind::Folder, folder_id.as_ref()))?;

            for file in list.files.unwrap_or_default() {
                entries.push(file_entry(file)?);
            }

            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("{} entries of type {} in {}", entries.len(), mime_type, folder_id);
        Ok(entries)
    }

    #[instrument]
    async fn file(&self, file_id: &FileId) -> error_stack::Result<FileEntry, ServiceError> {
        let file = self
            .get(file_id.as_ref(), ENTRY_FIELDS, ResourceKind::File)
            .await?;
        file_entry(file)
    }

    #[instrument]
    async fn parent_ids(
        &self,
        file_id: &FileId,
    ) -> error_stack::Result<Vec<FolderId>, ServiceError> {
        let file = self
            .get(file_id.as_ref(), "parents", ResourceKind::File)
            .await?;
        Ok(file
            .parents
            .unwrap_or_default()
            .into_iter()
            .map(FolderId::new)
            .collect())
    }

    #[instrument]
    async fn root_folder_id(&self) -> error_stack::Result<FolderId, ServiceError> {
        let file = self.get("root", "id", ResourceKind::Folder).await?;
        file.id
            .map(FolderId::new)
            .ok_or_else(|| report!(ServiceError::not_found(ResourceKind::Folder, "root")))
    }

    #[instrument]
    async fn add_to_folder(
        &self,
        file_id: &FileId,
        folder_id: &FolderId,
    ) -> error_stack::Result<(), ServiceError> {
        self.hub
            .files()
            .update(File::default(), file_id.as_ref())
            .add_parents(folder_id.as_ref())
            .supports_all_drives(true)
            .doit_without_upload()
            .await
            .map(|_| ())
            .map_err(|e| service_error(e, ResourceKind::Folder, folder_id.as_ref()))
    }

    #[instrument]
    async fn remove_from_folder(
        &self,
        file_id: &FileId,
        folder_id: &FolderId,
    ) -> error_stack::Result<(), ServiceError> {
        self.hub
            .files()
            .update(File::default(), file_id.as_ref())
            .remove_parents(folder_id.as_ref())
            .supports_all_drives(true)
            .doit_without_upload()
            .await
            .map(|_| ())
            .map_err(|e| service_error(e, ResourceKind::File, file_id.as_ref()))
    }

    #[instrument]
    async fn copy_file(
        &self,
        file_id: &FileId,
        name: &str,
        folder_id: &FolderId,
    ) -> error_stack::Result<FileEntry, ServiceError> {
        let request = File {
            name: Some(name.to_string()),
            parents: Some(vec![folder_id.to_string()]),
            ..Default::default()
        };

        let (_, file) = self
            .hub
            .files()
            .copy(request, file_id.as_ref())
            .param("fields", ENTRY_FIELDS)
            .supports_all_drives(true)
            .doit()
            .await
            .map_err(|e| service_error(e, ResourceKind::File, file_id.as_ref()))?;

        file_entry(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_query() {
        assert_eq!(
            children_query(&FolderId::new("abc"), &MimeType::Spreadsheet),
            "'abc' in parents and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
    }

    #[test]
    fn test_file_entry_requires_id() {
        assert!(file_entry(File::default()).is_err());
    }

    #[test]
    fn test_file_entry_maps_fields() {
        let modified = Utc::now();
        let file = File {
            id: Some("f1".to_string()),
            name: Some("Alpha".to_string()),
            mime_type: Some("application/vnd.google-apps.spreadsheet".to_string()),
            modified_time: Some(modified),
            ..Default::default()
        };

        let entry = file_entry(file).unwrap();
        assert_eq!(entry.id, FileId::new("f1"));
        assert_eq!(entry.name, "Alpha");
        assert!(entry.is_spreadsheet());
        assert_eq!(entry.modified_time, modified);
    }
}
