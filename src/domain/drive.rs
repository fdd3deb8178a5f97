use std::{fmt::Formatter, str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use strum::{Display, EnumString};
use thiserror::Error;

static FOLDER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/folders/([A-Za-z0-9_-]+)").expect("folder url pattern should compile")
});

static SPREADSHEET_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:spreadsheets/d|file/d)/([A-Za-z0-9_-]+)")
        .expect("file url pattern should compile")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdParseError {
    #[error("Identifier is empty")]
    Empty,
    #[error("Identifier contains invalid characters: {0}")]
    InvalidCharacters(String),
}

fn parse_id(s: &str, url_pattern: &Regex) -> Result<String, IdParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(IdParseError::Empty);
    }

    if let Some(captures) = url_pattern.captures(s) {
        return Ok(captures[1].to_string());
    }

    if s.chars()
        .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
    {
        return Err(IdParseError::InvalidCharacters(s.to_string()));
    }

    Ok(s.to_string())
}

/// Drive identifier of a folder. Parses from a raw id or a folder URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        FolderId(id.into())
    }
}

impl FromStr for FolderId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id(s, &FOLDER_URL).map(FolderId)
    }
}

impl AsRef<str> for FolderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FolderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Drive identifier of a file. Spreadsheet ids are file ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        FileId(id.into())
    }
}

impl FromStr for FileId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id(s, &SPREADSHEET_URL).map(FileId)
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A folder is also a file in Drive, so the two ids convert freely.
impl From<FolderId> for FileId {
    fn from(folder_id: FolderId) -> Self {
        FileId(folder_id.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString)]
pub enum MimeType {
    #[strum(serialize = "application/vnd.google-apps.spreadsheet")]
    Spreadsheet,
    #[strum(serialize = "application/vnd.google-apps.folder")]
    Folder,
    #[strum(default)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: FileId,
    pub name: String,
    pub modified_time: DateTime<Utc>,
    pub mime_type: MimeType,
}

impl FileEntry {
    pub fn is_spreadsheet(&self) -> bool {
        self.mime_type == MimeType::Spreadsheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_id_from_raw_id() {
        let id: FolderId = "1AbC-d_E".parse().unwrap();
        assert_eq!(id, FolderId::new("1AbC-d_E"));
    }

    #[test]
    fn test_folder_id_from_url() {
        let id: FolderId = "https://drive.google.com/drive/u/0/folders/1xYz_09-Q?usp=sharing"
            .parse()
            .unwrap();
        assert_eq!(id.as_ref(), "1xYz_09-Q");
    }

    #[test]
    fn test_file_id_from_spreadsheet_url() {
        let id: FileId = "https://docs.google.com/spreadsheets/d/1sheetID/edit#gid=0"
            .parse()
            .unwrap();
        assert_eq!(id.as_ref(), "1sheetID");
    }

    #[test]
    fn test_empty_id_is_rejected() {
        assert_eq!("  ".parse::<FolderId>(), Err(IdParseError::Empty));
    }

    #[test]
    fn test_id_with_spaces_is_rejected() {
        assert!(matches!(
            "not an id".parse::<FileId>(),
            Err(IdParseError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_mime_type_round_trip() {
        assert_eq!(
            MimeType::Spreadsheet.to_string(),
            "application/vnd.google-apps.spreadsheet"
        );
        assert_eq!(
            "application/vnd.google-apps.folder".parse::<MimeType>().unwrap(),
            MimeType::Folder
        );
        assert_eq!(
            "text/plain".parse::<MimeType>().unwrap(),
            MimeType::Other("text/plain".to_string())
        );
    }
}
