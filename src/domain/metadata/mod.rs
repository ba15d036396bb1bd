pub mod raw;
pub mod standardized;

pub use raw::{ComicBookInfo, ComicInfo, CreditEntry, RawMetadata, RawPage};
pub use standardized::{MangaMode, PageInfo, StandardizedMetadata};
