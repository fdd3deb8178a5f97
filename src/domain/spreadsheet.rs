use std::{fmt::Formatter, str::FromStr};

use thiserror::Error;

use super::drive::FileId;

/// An opened spreadsheet: enough to address it and to show it to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetHandle {
    pub id: FileId,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProperties {
    pub sheet_id: i32,
    pub title: String,
    pub index: u32,
    pub row_count: u32,
    pub column_count: u32,
}

/// Rectangular block of cells on one sheet. Indexes are 0-based, ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpan {
    pub sheet_id: i32,
    pub start_row: u32,
    pub end_row: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl GridSpan {
    pub fn rows(sheet_id: i32, start_row: u32, end_row: u32, column_count: u32) -> Self {
        Self {
            sheet_id,
            start_row,
            end_row,
            start_column: 0,
            end_column: column_count,
        }
    }

    pub fn row_count(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row)
    }

    pub fn column_count(&self) -> u32 {
        self.end_column.saturating_sub(self.start_column)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.column_count() == 0
    }
}

/// Rows and columns that actually hold data, counted from A1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataExtent {
    pub rows: u32,
    pub columns: u32,
}

impl DataExtent {
    pub fn of_values(values: &[Vec<String>]) -> Self {
        let rows = values
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(0, |last| last + 1);
        let columns = values
            .iter()
            .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
            .max()
            .map_or(0, |last| last + 1);

        Self {
            rows: rows as u32,
            columns: columns as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("Color must look like #rrggbb, got {0}")]
    InvalidFormat(String),
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorParseError::InvalidFormat(s.to_string()))?;

        let channel = |offset: usize| {
            u8::from_str_radix(&hex[offset..offset + 2], 16)
                .map(|value| value as f32 / 255.0)
                .map_err(|_| ColorParseError::InvalidFormat(s.to_string()))
        };

        Ok(Rgb {
            red: channel(0)?,
            green: channel(2)?,
            blue: channel(4)?,
        })
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let to_byte = |channel: f32| (channel * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            to_byte(self.red),
            to_byte(self.green),
            to_byte(self.blue)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_hex() {
        let color: Rgb = "#c9daf8".parse().unwrap();
        assert_eq!(color.to_string(), "#c9daf8");
        assert!((color.red - 201.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rgb_rejects_missing_hash() {
        assert!("c9daf8".parse::<Rgb>().is_err());
        assert!("#c9daf".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_data_extent_ignores_trailing_blanks() {
        let values = vec![
            vec!["a".to_string(), "b".to_string(), "".to_string()],
            vec!["c".to_string()],
            vec!["".to_string(), "".to_string()],
        ];
        assert_eq!(
            DataExtent::of_values(&values),
            DataExtent {
                rows: 2,
                columns: 2
            }
        );
    }

    #[test]
    fn test_data_extent_of_nothing() {
        assert_eq!(DataExtent::of_values(&[]), DataExtent::default());
    }

    #[test]
    fn test_grid_span_counts() {
        let span = GridSpan::rows(7, 1, 4, 2);
        assert_eq!(span.row_count(), 3);
        assert_eq!(span.column_count(), 2);
        assert!(!span.is_empty());
        assert!(GridSpan::rows(7, 3, 3, 2).is_empty());
    }
}
