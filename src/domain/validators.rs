use std::borrow::Cow;

use validator::ValidationError;

use crate::entities::option_fields::OptionField;

pub fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

/// Accepts absolute http(s) URLs. Blank strings are treated as "unset" by callers.
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.trim().is_empty() {
        return Ok(());
    }
    match url::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error(
            "invalid_url_scheme",
            "URL must start with http:// or https://",
        )),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

pub fn validate_optional_url_field(value: &OptionField<String>) -> Result<(), ValidationError> {
    value.validate_with(validate_url)
}

pub fn validate_url_list(urls: &[String]) -> Result<(), ValidationError> {
    for url in urls {
        if url.trim().is_empty() {
            return Err(new_validation_error("invalid_url", "Image URL cannot be empty"));
        }
        validate_url(url)?;
    }
    Ok(())
}

pub fn validate_category_names(names: &[String]) -> Result<(), ValidationError> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(new_validation_error(
            "blank_category",
            "Category names cannot be blank",
        ));
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(new_validation_error("blank", "Value cannot be blank"));
    }
    Ok(())
}

pub fn validate_playback_id(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_whitespace) {
        return Err(new_validation_error(
            "playback_id_whitespace",
            "Playback ID must not contain whitespace",
        ));
    }
    Ok(())
}
