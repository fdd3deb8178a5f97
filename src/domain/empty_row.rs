/// Finds the first row of `values` whose cells are all empty.
///
/// `start_row` is the 1-based sheet row of `values[0]`. Returns the 1-based sheet row
/// number, or `None` when every row has content.
pub fn first_empty_row(values: &[Vec<String>], start_row: u32) -> Option<u32> {
    let offset = start_row.saturating_sub(1);

    values
        .iter()
        .position(|row| row.concat().is_empty())
        .map(|row| row as u32 + 1 + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_first_empty_row_from_a1() {
        let values = rows(&[&["x", "y"], &["", "z"], &["", ""], &["w", ""]]);
        assert_eq!(first_empty_row(&values, 1), Some(3));
    }

    #[test]
    fn test_first_empty_row_with_offset() {
        let values = rows(&[&["x"], &[]]);
        assert_eq!(first_empty_row(&values, 5), Some(6));
    }

    #[test]
    fn test_no_empty_row() {
        let values = rows(&[&["x"], &["y"]]);
        assert_eq!(first_empty_row(&values, 1), None);
    }

    #[test]
    fn test_zero_start_row_behaves_like_one() {
        let values = rows(&[&[""]]);
        assert_eq!(first_empty_row(&values, 0), Some(1));
    }
}
