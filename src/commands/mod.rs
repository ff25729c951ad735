pub mod list;

pub use list::{collect_tools, handle_list_tools};
