//! URL handling module for Guide-Harvest
//!
//! This module provides website URL validation, domain and origin derivation,
//! and the cleaning rules applied to every harvested link.

mod domain;
mod normalize;

pub use domain::{extract_domain, normalize_domain, origin_of, same_site};
pub use normalize::{
    clean_link, has_non_page_extension, is_website_url, parse_website_url, NON_PAGE_EXTENSIONS,
};
