pub mod company_scraper;
pub mod financial_enricher;
pub mod google_scraper;
pub mod prompts;
pub mod smart_scraper;

pub use company_scraper::*;
pub use financial_enricher::*;
pub use google_scraper::*;
pub use prompts::*;
pub use smart_scraper::*;
