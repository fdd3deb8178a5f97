use std::fmt::Formatter;

/// A range reference such as `'Urls Reports'!A1:B1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Notation(String);

impl std::fmt::Display for A1Notation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<A1Notation> for String {
    fn from(a1_notation: A1Notation) -> Self {
        a1_notation.0
    }
}

impl From<String> for A1Notation {
    fn from(s: String) -> Self {
        A1Notation(s)
    }
}

impl From<&str> for A1Notation {
    fn from(s: &str) -> Self {
        A1Notation(s.to_string())
    }
}

impl AsRef<str> for A1Notation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn quote_sheet_title(title: &str) -> String {
    // Single quotes inside a title are escaped by doubling them
    format!("'{}'", title.replace('\'', "''"))
}

/// Removes exactly one outer pair of quotes, then un-doubles inner ones.
fn unquote_sheet_title(raw: &str) -> String {
    match raw
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) => inner.replace("''", "'"),
        None => raw.to_string(),
    }
}

impl A1Notation {
    /// Whole sheet.
    pub fn sheet(title: &str) -> Self {
        A1Notation(quote_sheet_title(title))
    }

    /// `width` cells of a single 1-based row, starting at column A.
    pub fn row(title: &str, row: u32, width: u32) -> Self {
        let last_column = column_letters(width.max(1));
        A1Notation(format!(
            "{}!A{}:{}{}",
            quote_sheet_title(title),
            row,
            last_column,
            row
        ))
    }

    /// Splits into the unquoted sheet title (if any) and the cell part.
    pub fn split(&self) -> (Option<String>, &str) {
        match self.0.rfind('!') {
            Some(bang) => (
                Some(unquote_sheet_title(&self.0[..bang])),
                &self.0[bang + 1..],
            ),
            None if self.0.starts_with('\'') => (Some(unquote_sheet_title(&self.0)), ""),
            None => (None, self.0.as_str()),
        }
    }
}

/// 1-based column number to letters: 1 -> A, 27 -> AA.
pub fn column_letters(number: u32) -> String {
    let mut number = number;
    let mut result = String::new();
    while number > 0 {
        let remainder = (number - 1) % 26;
        result.push((remainder as u8 + b'A') as char);
        number = (number - remainder) / 26;
    }
    result.chars().rev().collect()
}

/// Letters to a 1-based column number. `None` for an empty or non-alphabetic input.
pub fn column_number(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.chars().any(|c| !c.is_ascii_alphabetic()) {
        return None;
    }

    Some(
        letters
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .fold(0, |acc, c| acc * 26 + (c as u32 - 'A' as u32 + 1)),
    )
}

/// Parses a cell like `B12` into (1-based row, 1-based column).
pub fn parse_cell(cell: &str) -> Option<(u32, u32)> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    let column = column_number(letters)?;
    let row = digits.parse::<u32>().ok().filter(|row| *row > 0)?;
    Some((row, column))
}

/// Parses `B12`, or a column-only `B` as used by open-ended ranges like `A2:B`, into
/// (1-based row if present, 1-based column).
pub fn parse_cell_ref(cell: &str) -> Option<(Option<u32>, u32)> {
    match cell.find(|c: char| c.is_ascii_digit()) {
        Some(_) => parse_cell(cell).map(|(row, column)| (Some(row), column)),
        None => column_number(cell).map(|column| (None, column)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(2), "B");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn test_column_number() {
        assert_eq!(column_number("a"), Some(1));
        assert_eq!(column_number("AA"), Some(27));
        assert_eq!(column_number(""), None);
        assert_eq!(column_number("A1"), None);
    }

    #[test]
    fn test_row_notation() {
        assert_eq!(
            A1Notation::row("Urls Reports", 1, 2).as_ref(),
            "'Urls Reports'!A1:B1"
        );
    }

    #[test]
    fn test_sheet_title_with_quote() {
        assert_eq!(A1Notation::sheet("Bob's").as_ref(), "'Bob''s'");
    }

    #[test]
    fn test_split() {
        let a1 = A1Notation::from("'Bob''s'!A2:C9");
        assert_eq!(a1.split(), (Some("Bob's".to_string()), "A2:C9"));

        let a1 = A1Notation::from("A1:B2");
        assert_eq!(a1.split(), (None, "A1:B2"));

        let a1 = A1Notation::sheet("Data");
        assert_eq!(a1.split(), (Some("Data".to_string()), ""));

        let a1 = A1Notation::from("Data!A1:B2");
        assert_eq!(a1.split(), (Some("Data".to_string()), "A1:B2"));
    }

    #[test]
    fn test_titles_with_edge_quotes_keep_their_quotes() {
        assert_eq!(A1Notation::sheet("Teachers'").as_ref(), "'Teachers'''");
        assert_eq!(A1Notation::sheet("'Draft'").as_ref(), "'''Draft'''");

        for title in ["Teachers'", "'Draft'", "Urls Teachers'", "''", "Bob's"] {
            assert_eq!(
                A1Notation::sheet(title).split(),
                (Some(title.to_string()), ""),
                "whole-sheet range of {title:?}"
            );
            assert_eq!(
                A1Notation::row(title, 3, 2).split(),
                (Some(title.to_string()), "A3:B3"),
                "row range of {title:?}"
            );
        }
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("B12"), Some((12, 2)));
        assert_eq!(parse_cell("AA1"), Some((1, 27)));
        assert_eq!(parse_cell("12"), None);
        assert_eq!(parse_cell("B0"), None);
        assert_eq!(parse_cell("B"), None);
    }

    #[test]
    fn test_parse_cell_ref_accepts_column_only() {
        assert_eq!(parse_cell_ref("B12"), Some((Some(12), 2)));
        assert_eq!(parse_cell_ref("C"), Some((None, 3)));
        assert_eq!(parse_cell_ref(""), None);
        assert_eq!(parse_cell_ref("B0"), None);
    }
}
