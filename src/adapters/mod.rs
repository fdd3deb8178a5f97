pub mod google;
pub mod memory;
