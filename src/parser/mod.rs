pub mod title;

pub use title::{TitleParser, normalize_for_matching};
