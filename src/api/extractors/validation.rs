//! Reusable `validator` rules for request bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

use crate::config::MAX_PRODUCT_IMAGES;

/// 10 to 15 digits with an optional leading `+`.
pub static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern is valid"));

/// Postal codes: digits, letters, spaces and dashes.
pub static ZIP_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{2,9}$").expect("zip pattern is valid"));

fn is_http_url(raw: &str) -> bool {
    raw.starts_with("https://") || raw.starts_with("http://")
}

/// At most [`MAX_PRODUCT_IMAGES`] absolute http(s) URLs.
pub fn image_urls(urls: &[String]) -> Result<(), ValidationError> {
    if urls.len() > MAX_PRODUCT_IMAGES {
        let mut err = ValidationError::new("too_many_images");
        err.message = Some(format!("At most {} images are allowed", MAX_PRODUCT_IMAGES).into());
        return Err(err);
    }

    if urls.iter().any(|url| !is_http_url(url.trim())) {
        let mut err = ValidationError::new("image_url");
        err.message = Some("Image URLs must start with http:// or https://".into());
        return Err(err);
    }

    Ok(())
}

/// Adapter for `#[validate(custom(...))]` on `Vec<String>` fields.
pub fn image_url_list(urls: &Vec<String>) -> Result<(), ValidationError> {
    image_urls(urls)
}
