pub mod client;
pub mod error;
pub mod vacancy;

pub use client::{ClientConfig, VacancyClient};
pub use error::FetchError;
pub use vacancy::{SearchQuery, VacancyDetail, VacancyPage, VacancySummary};
