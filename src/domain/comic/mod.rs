pub mod entity;
pub mod invariants;

pub use entity::Comic;
pub use invariants::validate_comic;
