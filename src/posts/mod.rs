pub mod cursor;
pub mod detail;
pub mod error;
pub mod format;
pub mod handlers;
pub mod list;
pub mod reading_time;
pub mod render;
pub mod types;

pub use cursor::CursorRegistry;
pub use detail::generate_detail;
pub use error::PageError;
pub use list::{PostFeed, enumerate_paths, first_page};
pub use reading_time::estimate_reading_time;
pub use render::{pregenerate, render_page};
pub use types::{DetailProps, Page, PageKey, Post, PostLink, PostSummary};
