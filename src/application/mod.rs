pub mod batch_runner;
pub mod copy_sheet;
pub mod delete_sheet;
pub mod duplicate_sheet;
pub mod empty_row;
pub mod folder_copy;
pub mod folders;
pub mod recently_updated;
pub mod url_index;
