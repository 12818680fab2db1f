//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod ban_repo;
pub mod creator_repo;
pub mod embedding_repo;
pub mod favorite_repo;
pub mod merge_repo;
pub mod screenshot_repo;
pub mod selection_repo;
pub mod view_repo;

pub use ban_repo::BanRepo;
pub use creator_repo::CreatorRepo;
pub use embedding_repo::EmbeddingRepo;
pub use favorite_repo::FavoriteRepo;
pub use merge_repo::MergeRepo;
pub use screenshot_repo::ScreenshotRepo;
pub use selection_repo::SelectionRepo;
pub use view_repo::ViewRepo;
