//! In-process stand-in for Drive and Sheets.
//!
//! Mirrors the service behavior the batch operations depend on: sheet title uniqueness,
//! "Copy of" titles for cross-spreadsheet copies, the last sheet being undeletable, and
//! appends landing after the last row holding data.

use chrono::{DateTime, Utc};
use error_stack::report;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::domain::{
    a1_notation::{parse_cell_ref, A1Notation},
    drive::{FileEntry, FileId, Folder, FolderId, MimeType},
    spreadsheet::{DataExtent, GridSpan, Rgb, SheetProperties, SortOrder, SpreadsheetHandle},
};
use crate::ports::{
    file_storage::FileStorage,
    service_error::{ResourceKind, ServiceError},
    spreadsheet_service::SpreadsheetService,
};

const DEFAULT_ROW_COUNT: u32 = 1000;
const DEFAULT_COLUMN_COUNT: u32 = 26;

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedStyle {
    pub span: GridSpan,
    pub background: Rgb,
    pub bold: bool,
}

#[derive(Debug, Clone)]
struct MemorySheet {
    sheet_id: i32,
    title: String,
    row_count: u32,
    column_count: u32,
    cells: Vec<Vec<String>>,
    styles: Vec<AppliedStyle>,
}

impl MemorySheet {
    fn properties(&self, index: usize) -> SheetProperties {
        SheetProperties {
            sheet_id: self.sheet_id,
            title: self.title.clone(),
            index: index as u32,
            row_count: self.row_count,
            column_count: self.column_count,
        }
    }

    fn set_cell(&mut self, row: usize, column: usize, value: String) {
        if self.cells.len() <= row {
            self.cells.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.cells[row];
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value;
        self.row_count = self.row_count.max(row as u32 + 1);
        self.column_count = self.column_count.max(column as u32 + 1);
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    entry: FileEntry,
    parents: Vec<FolderId>,
    sheets: Vec<MemorySheet>,
}

#[derive(Debug)]
struct State {
    root: FolderId,
    files: Vec<MemoryFile>,
    next_file: u64,
    next_sheet: i32,
}

impl State {
    fn new_file_id(&mut self) -> FileId {
        self.next_file += 1;
        FileId::new(format!("mem-{}", self.next_file))
    }

    fn new_sheet(&mut self, title: &str) -> MemorySheet {
        self.next_sheet += 1;
        MemorySheet {
            sheet_id: self.next_sheet,
            title: title.to_string(),
            row_count: DEFAULT_ROW_COUNT,
            column_count: DEFAULT_COLUMN_COUNT,
            cells: Vec::new(),
            styles: Vec::new(),
        }
    }

    fn file(&self, id: &str) -> Option<&MemoryFile> {
        self.files.iter().find(|file| file.entry.id.as_ref() == id)
    }

    fn file_mut(&mut self, id: &str) -> Option<&mut MemoryFile> {
        self.files
            .iter_mut()
            .find(|file| file.entry.id.as_ref() == id)
    }

    fn folder(&self, id: &FolderId) -> error_stack::Result<&MemoryFile, ServiceError> {
        self.file(id.as_ref())
            .filter(|file| file.entry.mime_type == MimeType::Folder)
            .ok_or_else(|| report!(ServiceError::not_found(ResourceKind::Folder, id.as_ref())))
    }

    fn spreadsheet_mut(
        &mut self,
        id: &FileId,
    ) -> error_stack::Result<&mut MemoryFile, ServiceError> {
        self.file_mut(id.as_ref())
            .filter(|file| file.entry.is_spreadsheet())
            .ok_or_else(|| {
                report!(ServiceError::not_found(
                    ResourceKind::Spreadsheet,
                    id.as_ref()
                ))
            })
    }

    fn spreadsheet(&self, id: &FileId) -> error_stack::Result<&MemoryFile, ServiceError> {
        self.file(id.as_ref())
            .filter(|file| file.entry.is_spreadsheet())
            .ok_or_else(|| {
                report!(ServiceError::not_found(
                    ResourceKind::Spreadsheet,
                    id.as_ref()
                ))
            })
    }
}

impl MemoryFile {
    fn handle(&self) -> SpreadsheetHandle {
        SpreadsheetHandle {
            id: self.entry.id.clone(),
            name: self.entry.name.clone(),
            url: spreadsheet_url(&self.entry.id),
        }
    }

    fn touch(&mut self) {
        self.entry.modified_time = Utc::now();
    }

    fn has_title(&self, title: &str) -> bool {
        self.sheets.iter().any(|sheet| sheet.title == title)
    }

    fn sheet_mut(&mut self, sheet_id: i32) -> error_stack::Result<&mut MemorySheet, ServiceError> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.sheet_id == sheet_id)
            .ok_or_else(|| {
                report!(ServiceError::not_found(
                    ResourceKind::Sheet,
                    sheet_id.to_string()
                ))
            })
    }

    fn sheet_by_title_mut(
        &mut self,
        title: Option<&str>,
    ) -> error_stack::Result<&mut MemorySheet, ServiceError> {
        let position = match title {
            Some(title) => self.sheets.iter().position(|sheet| sheet.title == title),
            None if self.sheets.is_empty() => None,
            None => Some(0),
        };
        match position {
            Some(position) => Ok(&mut self.sheets[position]),
            None => Err(report!(ServiceError::not_found(
                ResourceKind::Sheet,
                title.unwrap_or_default()
            ))),
        }
    }
}

pub fn spreadsheet_url(id: &FileId) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}/edit", id)
}

/// Start and optional end of a cell reference, as 0-based (row, column). A column-only
/// start begins at the first row; a column-only end (`A1:C`) leaves the end row open.
fn cell_bounds(
    cells: &str,
) -> error_stack::Result<((usize, usize), Option<(Option<usize>, usize)>), ServiceError> {
    if cells.is_empty() {
        return Ok(((0, 0), None));
    }

    let invalid = || report!(ServiceError::unclassified(format!("Unable to parse range: {}", cells)));
    let mut parts = cells.split(':');
    let (start_row, start_column) = parts
        .next()
        .and_then(parse_cell_ref)
        .ok_or_else(invalid)?;
    let end = match parts.next() {
        Some(end) => Some(parse_cell_ref(end).ok_or_else(invalid)?),
        None => None,
    };

    let start = (
        start_row.unwrap_or(1) as usize - 1,
        start_column as usize - 1,
    );
    let end = end.map(|(row, column)| (row.map(|row| row as usize - 1), column as usize - 1));
    Ok((start, end))
}

/// Drive and Sheets in one process. Starts with an empty root folder.
#[derive(Debug)]
pub struct MemoryWorkspace {
    state: RwLock<State>,
}

impl Default for MemoryWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        let root = FolderId::new("mem-root");
        let root_file = MemoryFile {
            entry: FileEntry {
                id: root.clone().into(),
                name: "My Drive".to_string(),
                modified_time: Utc::now(),
                mime_type: MimeType::Folder,
            },
            parents: Vec::new(),
            sheets: Vec::new(),
        };

        Self {
            state: RwLock::new(State {
                root,
                files: vec![root_file],
                next_file: 0,
                next_sheet: 0,
            }),
        }
    }

    pub async fn add_folder(&self, name: &str) -> FolderId {
        let mut state = self.state.write().await;
        let id = state.new_file_id();
        let root = state.root.clone();
        state.files.push(MemoryFile {
            entry: FileEntry {
                id: id.clone(),
                name: name.to_string(),
                modified_time: Utc::now(),
                mime_type: MimeType::Folder,
            },
            parents: vec![root],
            sheets: Vec::new(),
        });
        FolderId::new(id.as_ref())
    }

    pub async fn add_spreadsheet(&self, folder: &FolderId, name: &str, sheets: &[&str]) -> FileId {
        self.add_spreadsheet_modified(folder, name, sheets, Utc::now())
            .await
    }

    pub async fn add_spreadsheet_modified(
        &self,
        folder: &FolderId,
        name: &str,
        sheets: &[&str],
        modified_time: DateTime<Utc>,
    ) -> FileId {
        let mut state = self.state.write().await;
        let id = state.new_file_id();
        let sheets = sheets.iter().map(|title| state.new_sheet(title)).collect();
        state.files.push(MemoryFile {
            entry: FileEntry {
                id: id.clone(),
                name: name.to_string(),
                modified_time,
                mime_type: MimeType::Spreadsheet,
            },
            parents: vec![folder.clone()],
            sheets,
        });
        id
    }

    pub async fn add_file(&self, folder: &FolderId, name: &str, mime_type: MimeType) -> FileId {
        let mut state = self.state.write().await;
        let id = state.new_file_id();
        state.files.push(MemoryFile {
            entry: FileEntry {
                id: id.clone(),
                name: name.to_string(),
                modified_time: Utc::now(),
                mime_type,
            },
            parents: vec![folder.clone()],
            sheets: Vec::new(),
        });
        id
    }

    /// Overwrites a sheet's cells, starting at A1.
    pub async fn set_cells(&self, file: &FileId, sheet: &str, values: &[&[&str]]) {
        let mut state = self.state.write().await;
        if let Some(sheet) = state
            .file_mut(file.as_ref())
            .and_then(|file| file.sheets.iter_mut().find(|s| s.title == sheet))
        {
            sheet.cells = values
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect();
        }
    }

    pub async fn cells(&self, file: &FileId, sheet: &str) -> Option<Vec<Vec<String>>> {
        let state = self.state.read().await;
        state
            .file(file.as_ref())
            .and_then(|file| file.sheets.iter().find(|s| s.title == sheet))
            .map(|sheet| sheet.cells.clone())
    }

    pub async fn sheet_titles(&self, file: &FileId) -> Vec<String> {
        let state = self.state.read().await;
        state
            .file(file.as_ref())
            .map(|file| file.sheets.iter().map(|s| s.title.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn styles(&self, file: &FileId, sheet: &str) -> Vec<AppliedStyle> {
        let state = self.state.read().await;
        state
            .file(file.as_ref())
            .and_then(|file| file.sheets.iter().find(|s| s.title == sheet))
            .map(|sheet| sheet.styles.clone())
            .unwrap_or_default()
    }

    /// Every file (of any type) directly inside `folder`, in insertion order.
    pub async fn files_in(&self, folder: &FolderId) -> Vec<FileEntry> {
        let state = self.state.read().await;
        state
            .files
            .iter()
            .filter(|file| file.parents.contains(folder))
            .map(|file| file.entry.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl FileStorage for MemoryWorkspace {
    #[instrument(skip(self))]
    async fn folder(&self, folder_id: &FolderId) -> error_stack::Result<Folder, ServiceError> {
        let state = self.state.read().await;
        let folder = state.folder(folder_id)?;
        Ok(Folder {
            id: folder_id.clone(),
            name: folder.entry.name.clone(),
        })
    }

    #[instrument(skip(self))]
    async fn list_files(
        &self,
        folder_id: &FolderId,
        mime_type: &MimeType,
    ) -> error_stack::Result<Vec<FileEntry>, ServiceError> {
        let state = self.state.read().await;
        state.folder(folder_id)?;
        Ok(state
            .files
            .iter()
            .filter(|file| file.parents.contains(folder_id) && &file.entry.mime_type == mime_type)
            .map(|file| file.entry.clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn file(&self, file_id: &FileId) -> error_stack::Result<FileEntry, ServiceError> {
        let state = self.state.read().await;
        state
            .file(file_id.as_ref())
            .map(|file| file.entry.clone())
            .ok_or_else(|| report!(ServiceError::not_found(ResourceKind::File, file_id.as_ref())))
    }

    #[instrument(skip(self))]
    async fn parent_ids(
        &self,
        file_id: &FileId,
    ) -> error_stack::Result<Vec<FolderId>, ServiceError> {
        let state = self.state.read().await;
        state
            .file(file_id.as_ref())
            .map(|file| file.parents.clone())
            .ok_or_else(|| report!(ServiceError::not_found(ResourceKind::File, file_id.as_ref())))
    }

    async fn root_folder_id(&self) -> error_stack::Result<FolderId, ServiceError> {
        Ok(self.state.read().await.root.clone())
    }

    #[instrument(skip(self))]
    async fn add_to_folder(
        &self,
        file_id: &FileId,
        folder_id: &FolderId,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        state.folder(folder_id)?;
        let file = state
            .file_mut(file_id.as_ref())
            .ok_or_else(|| report!(ServiceError::not_found(ResourceKind::File, file_id.as_ref())))?;
        if !file.parents.contains(folder_id) {
            file.parents.push(folder_id.clone());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_from_folder(
        &self,
        file_id: &FileId,
        folder_id: &FolderId,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state
            .file_mut(file_id.as_ref())
            .ok_or_else(|| report!(ServiceError::not_found(ResourceKind::File, file_id.as_ref())))?;
        file.parents.retain(|parent| parent != folder_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn copy_file(
        &self,
        file_id: &FileId,
        name: &str,
        folder_id: &FolderId,
    ) -> error_stack::Result<FileEntry, ServiceError> {
        let mut state = self.state.write().await;
        state.folder(folder_id)?;
        let source = state
            .file(file_id.as_ref())
            .cloned()
            .ok_or_else(|| report!(ServiceError::not_found(ResourceKind::File, file_id.as_ref())))?;

        let id = state.new_file_id();
        let entry = FileEntry {
            id,
            name: name.to_string(),
            modified_time: Utc::now(),
            mime_type: source.entry.mime_type.clone(),
        };
        state.files.push(MemoryFile {
            entry: entry.clone(),
            parents: vec![folder_id.clone()],
            sheets: source.sheets,
        });
        Ok(entry)
    }
}

#[async_trait::async_trait]
impl SpreadsheetService for MemoryWorkspace {
    #[instrument(skip(self))]
    async fn open(
        &self,
        spreadsheet_id: &FileId,
    ) -> error_stack::Result<SpreadsheetHandle, ServiceError> {
        let state = self.state.read().await;
        Ok(state.spreadsheet(spreadsheet_id)?.handle())
    }

    #[instrument(skip(self))]
    async fn create(&self, title: &str) -> error_stack::Result<SpreadsheetHandle, ServiceError> {
        let mut state = self.state.write().await;
        let id = state.new_file_id();
        let sheet = state.new_sheet("Sheet1");
        let file = MemoryFile {
            entry: FileEntry {
                id,
                name: title.to_string(),
                modified_time: Utc::now(),
                mime_type: MimeType::Spreadsheet,
            },
            parents: vec![state.root.clone()],
            sheets: vec![sheet],
        };
        let handle = file.handle();
        state.files.push(file);
        Ok(handle)
    }

    async fn sheets(
        &self,
        spreadsheet_id: &FileId,
    ) -> error_stack::Result<Vec<SheetProperties>, ServiceError> {
        let state = self.state.read().await;
        let file = state.spreadsheet(spreadsheet_id)?;
        Ok(file
            .sheets
            .iter()
            .enumerate()
            .map(|(index, sheet)| sheet.properties(index))
            .collect())
    }

    #[instrument(skip(self))]
    async fn rename_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        title: &str,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        if file
            .sheets
            .iter()
            .any(|sheet| sheet.title == title && sheet.sheet_id != sheet_id)
        {
            return Err(report!(ServiceError::name_collision(title)));
        }
        file.sheet_mut(sheet_id)?.title = title.to_string();
        file.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        let position = file
            .sheets
            .iter()
            .position(|sheet| sheet.sheet_id == sheet_id)
            .ok_or_else(|| {
                report!(ServiceError::not_found(
                    ResourceKind::Sheet,
                    sheet_id.to_string()
                ))
            })?;
        if file.sheets.len() == 1 {
            return Err(report!(ServiceError::unclassified(
                "You can't remove all the sheets in a document"
            )));
        }
        file.sheets.remove(position);
        file.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn duplicate_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        new_title: &str,
    ) -> error_stack::Result<SheetProperties, ServiceError> {
        let mut state = self.state.write().await;
        state.next_sheet += 1;
        let new_sheet_id = state.next_sheet;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        if file.has_title(new_title) {
            return Err(report!(ServiceError::name_collision(new_title)));
        }
        let mut copy = file.sheet_mut(sheet_id)?.clone();
        copy.sheet_id = new_sheet_id;
        copy.title = new_title.to_string();
        file.sheets.push(copy);
        file.touch();

        let index = file.sheets.len() - 1;
        Ok(file.sheets[index].properties(index))
    }

    #[instrument(skip(self))]
    async fn copy_sheet_to(
        &self,
        source_spreadsheet_id: &FileId,
        sheet_id: i32,
        destination_spreadsheet_id: &FileId,
    ) -> error_stack::Result<SheetProperties, ServiceError> {
        let mut state = self.state.write().await;
        let mut copy = state
            .spreadsheet_mut(source_spreadsheet_id)?
            .sheet_mut(sheet_id)?
            .clone();
        state.next_sheet += 1;
        copy.sheet_id = state.next_sheet;

        let destination = state.spreadsheet_mut(destination_spreadsheet_id)?;
        let base = format!("Copy of {}", copy.title);
        let mut title = base.clone();
        let mut suffix = 1;
        while destination.has_title(&title) {
            suffix += 1;
            title = format!("{} {}", base, suffix);
        }
        copy.title = title;
        destination.sheets.push(copy);
        destination.touch();

        let index = destination.sheets.len() - 1;
        Ok(destination.sheets[index].properties(index))
    }

    #[instrument(skip(self))]
    async fn read_values(
        &self,
        spreadsheet_id: &FileId,
        range: &A1Notation,
    ) -> error_stack::Result<Vec<Vec<String>>, ServiceError> {
        let mut state = self.state.write().await;
        let (title, cells) = range.split();
        let (start, end) = cell_bounds(cells)?;
        let sheet = state
            .spreadsheet_mut(spreadsheet_id)?
            .sheet_by_title_mut(title.as_deref())?;

        let (end_row, end_column) = end.map_or(
            (sheet.cells.len(), usize::MAX),
            |(row, column)| (row.map_or(sheet.cells.len(), |row| row + 1), column + 1),
        );
        let mut values: Vec<Vec<String>> = sheet
            .cells
            .iter()
            .take(end_row)
            .skip(start.0)
            .map(|row| {
                row.iter()
                    .take(end_column)
                    .skip(start.1)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        // The service omits trailing empty rows and cells
        for row in values.iter_mut() {
            while row.last().is_some_and(|cell| cell.is_empty()) {
                row.pop();
            }
        }
        while values.last().is_some_and(|row| row.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    #[instrument(skip(self, values))]
    async fn write_values(
        &self,
        spreadsheet_id: &FileId,
        range: &A1Notation,
        values: Vec<Vec<String>>,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let (title, cells) = range.split();
        let ((start_row, start_column), _) = cell_bounds(cells)?;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = file.sheet_by_title_mut(title.as_deref())?;
        for (row_offset, row) in values.into_iter().enumerate() {
            for (column_offset, value) in row.into_iter().enumerate() {
                sheet.set_cell(start_row + row_offset, start_column + column_offset, value);
            }
        }
        file.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn append_row(
        &self,
        spreadsheet_id: &FileId,
        sheet_title: &str,
        row: Vec<String>,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = file.sheet_by_title_mut(Some(sheet_title))?;
        let next_row = DataExtent::of_values(&sheet.cells).rows as usize;
        for (column, value) in row.into_iter().enumerate() {
            sheet.set_cell(next_row, column, value);
        }
        file.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn insert_rows(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        before_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = file.sheet_mut(sheet_id)?;
        if before_index > sheet.row_count {
            return Err(report!(ServiceError::unclassified(format!(
                "Row index {} is beyond the grid of {} rows",
                before_index, sheet.row_count
            ))));
        }
        let at = (before_index as usize).min(sheet.cells.len());
        for _ in 0..count {
            sheet.cells.insert(at, Vec::new());
        }
        sheet.row_count += count;
        file.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_rows(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        start_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = file.sheet_mut(sheet_id)?;
        let end_index = start_index.saturating_add(count);
        if end_index > sheet.row_count {
            return Err(report!(ServiceError::unclassified(format!(
                "Rows {}..{} are beyond the grid of {} rows",
                start_index, end_index, sheet.row_count
            ))));
        }
        if count == sheet.row_count {
            return Err(report!(ServiceError::unclassified(
                "You can't delete all the rows on the sheet"
            )));
        }
        let start = (start_index as usize).min(sheet.cells.len());
        let end = (end_index as usize).min(sheet.cells.len());
        sheet.cells.drain(start..end);
        sheet.row_count -= count;
        file.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_columns(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        start_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = file.sheet_mut(sheet_id)?;
        let end_index = start_index.saturating_add(count);
        if end_index > sheet.column_count {
            return Err(report!(ServiceError::unclassified(format!(
                "Columns {}..{} are beyond the grid of {} columns",
                start_index, end_index, sheet.column_count
            ))));
        }
        if count == sheet.column_count {
            return Err(report!(ServiceError::unclassified(
                "You can't delete all the columns on the sheet"
            )));
        }
        for row in sheet.cells.iter_mut() {
            let start = (start_index as usize).min(row.len());
            let end = (end_index as usize).min(row.len());
            row.drain(start..end);
        }
        sheet.column_count -= count;
        file.touch();
        Ok(())
    }

    async fn data_extent(
        &self,
        spreadsheet_id: &FileId,
        sheet: &SheetProperties,
    ) -> error_stack::Result<DataExtent, ServiceError> {
        let mut state = self.state.write().await;
        let sheet = state
            .spreadsheet_mut(spreadsheet_id)?
            .sheet_mut(sheet.sheet_id)?;
        Ok(DataExtent::of_values(&sheet.cells))
    }

    #[instrument(skip(self))]
    async fn sort_span(
        &self,
        spreadsheet_id: &FileId,
        span: GridSpan,
        column_index: u32,
        order: SortOrder,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        let sheet = file.sheet_mut(span.sheet_id)?;
        let start = (span.start_row as usize).min(sheet.cells.len());
        let end = (span.end_row as usize).min(sheet.cells.len());
        let key = column_index as usize;
        // Sheets sorts text case-insensitively
        let sort_key = |row: &Vec<String>| row.get(key).map(|cell| cell.to_lowercase()).unwrap_or_default();
        sheet.cells[start..end].sort_by(|a, b| {
            let ordering = sort_key(a).cmp(&sort_key(b));
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        file.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn style_span(
        &self,
        spreadsheet_id: &FileId,
        span: GridSpan,
        background: Rgb,
        bold: bool,
    ) -> error_stack::Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let file = state.spreadsheet_mut(spreadsheet_id)?;
        file.sheet_mut(span.sheet_id)?.styles.push(AppliedStyle {
            span,
            background,
            bold,
        });
        file.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_files_filters_by_folder_and_type() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let other = workspace.add_folder("Other").await;
        let alpha = workspace.add_spreadsheet(&folder, "Alpha", &["Sheet1"]).await;
        workspace.add_spreadsheet(&other, "Beta", &["Sheet1"]).await;
        workspace
            .add_file(&folder, "notes.txt", MimeType::Other("text/plain".to_string()))
            .await;

        let files = workspace
            .list_files(&folder, &MimeType::Spreadsheet)
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, alpha);
    }

    #[tokio::test]
    async fn test_unknown_folder_is_not_found() {
        let workspace = MemoryWorkspace::new();
        let error = workspace
            .folder(&FolderId::new("missing"))
            .await
            .unwrap_err();
        assert!(error.current_context().is_not_found());
    }

    #[tokio::test]
    async fn test_copy_sheet_to_picks_copy_of_title() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let source = workspace.add_spreadsheet(&folder, "Source", &["Data"]).await;
        let target = workspace
            .add_spreadsheet(&folder, "Target", &["Copy of Data"])
            .await;
        let data = workspace.sheet_by_name(&source, "Data").await.unwrap();

        let copied = workspace
            .copy_sheet_to(&source, data.sheet_id, &target)
            .await
            .unwrap();
        assert_eq!(copied.title, "Copy of Data 2");
        assert_eq!(copied.index, 1);
    }

    #[tokio::test]
    async fn test_rename_to_existing_title_collides() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let file = workspace.add_spreadsheet(&folder, "F", &["A", "B"]).await;
        let b = workspace.sheet_by_name(&file, "B").await.unwrap();

        let error = workspace.rename_sheet(&file, b.sheet_id, "A").await.unwrap_err();
        assert_eq!(
            error.current_context(),
            &ServiceError::name_collision("A")
        );
    }

    #[tokio::test]
    async fn test_last_sheet_cannot_be_deleted() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let file = workspace.add_spreadsheet(&folder, "F", &["Only"]).await;
        let only = workspace.sheet_by_name(&file, "Only").await.unwrap();

        assert!(workspace.delete_sheet(&file, only.sheet_id).await.is_err());
        assert_eq!(workspace.sheet_titles(&file).await, vec!["Only"]);
    }

    #[tokio::test]
    async fn test_append_row_lands_after_data() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let file = workspace.add_spreadsheet(&folder, "F", &["S"]).await;
        workspace.set_cells(&file, "S", &[&["a"], &[""], &["b"]]).await;

        workspace
            .append_row(&file, "S", vec!["c".to_string(), "d".to_string()])
            .await
            .unwrap();

        let cells = workspace.cells(&file, "S").await.unwrap();
        assert_eq!(cells[3], vec!["c".to_string(), "d".to_string()]);
    }

    #[tokio::test]
    async fn test_read_values_slices_and_trims() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let file = workspace.add_spreadsheet(&folder, "F", &["S"]).await;
        workspace
            .set_cells(&file, "S", &[&["a", "b", "c"], &["d", "", ""], &["", "", ""]])
            .await;

        let values = workspace
            .read_values(&file, &A1Notation::from("'S'!B1:C3"))
            .await
            .unwrap();
        assert_eq!(values, vec![vec!["b".to_string(), "c".to_string()]]);
    }

    #[tokio::test]
    async fn test_read_values_accepts_column_only_bounds() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let file = workspace.add_spreadsheet(&folder, "F", &["S"]).await;
        workspace
            .set_cells(&file, "S", &[&["a", "b", "c"], &["d", "e", ""], &["f", "", ""]])
            .await;

        let down_column = workspace
            .read_values(&file, &A1Notation::from("'S'!A2:A"))
            .await
            .unwrap();
        assert_eq!(down_column, vec![vec!["d".to_string()], vec!["f".to_string()]]);

        let columns = workspace
            .read_values(&file, &A1Notation::from("'S'!A:B"))
            .await
            .unwrap();
        assert_eq!(
            columns,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["d".to_string(), "e".to_string()],
                vec!["f".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_sort_span_ignores_case() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Reports").await;
        let file = workspace.add_spreadsheet(&folder, "F", &["S"]).await;
        workspace
            .set_cells(&file, "S", &[&["Name"], &["beta"], &["Gamma"], &["alpha"]])
            .await;
        let sheet = workspace.sheet_by_name(&file, "S").await.unwrap();

        workspace
            .sort_span(&file, GridSpan::rows(sheet.sheet_id, 1, 4, 1), 0, SortOrder::Ascending)
            .await
            .unwrap();

        let cells = workspace.cells(&file, "S").await.unwrap();
        let names: Vec<&str> = cells.iter().map(|row| row[0].as_str()).collect();
        assert_eq!(names, vec!["Name", "alpha", "beta", "Gamma"]);
    }
}
