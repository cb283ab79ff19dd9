pub mod movie_record;
pub mod query;
pub mod stats;

pub use movie_record::{MoviePayload, MovieRecord};
pub use query::{parse_genre_filter, CatalogPage, CatalogQuery, RecordFilter, SortField, SortKey};
pub use stats::{MovieStats, YearRuntime};
