//! LeadScout Email - contact email lookup on business websites.
//!
//! Given a business homepage, [`HttpEmailExtractor`] checks the site's
//! robots.txt, fetches the page once and pulls out plausible contact
//! addresses. It never follows links or discovers further URLs.
//!
//! Placeholder domains, platform-internal addresses (Wix, Sentry), long hex
//! tracking ids and image names such as `logo@2x.png` are filtered out.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod extractor;
pub mod patterns;
pub mod robots;

// Re-export commonly used types
pub use extractor::{EmailError, EmailExtractor, EmailFindings, HttpEmailExtractor};
pub use patterns::{extract_emails_from_html, is_valid_email};
pub use robots::{fetch_robots_txt, RobotsTxt};
