pub mod root;
pub mod health;
pub mod create;
pub mod list;
pub mod get;
pub mod put;
pub mod patch;

pub use root::root_handler;
pub use health::health_handler;
pub use create::create_handler;
pub use list::list_handler;
pub use get::get_handler;
pub use put::put_handler;
pub use patch::patch_handler;
