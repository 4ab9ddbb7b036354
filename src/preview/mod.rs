pub mod error;
pub mod handlers;
pub mod session;

pub use error::PreviewError;
pub use handlers::{exit_preview_handler, link_resolver, preview_handler};
pub use session::PreviewSession;
