pub mod a1_notation;
pub mod drive;
pub mod empty_row;
pub mod membership;
pub mod spreadsheet;
