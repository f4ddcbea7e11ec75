pub mod project;
pub mod summary;
pub mod work_item;
