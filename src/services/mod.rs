pub mod catalog;
pub mod lookup;
pub mod search;
pub mod stats;

pub use catalog::CatalogQueryService;
pub use lookup::LookupService;
pub use search::SearchService;
pub use stats::StatsService;
