//! Field-level limits shared by every storage backend.

use crate::domain::error::DomainError;

pub const POST_TITLE_MAX_CHARS: usize = 100;
pub const POST_TEXT_MAX_CHARS: usize = 50_000;
pub const COMMENT_TEXT_MAX_CHARS: usize = 100;

pub fn validate_post_title(title: &str) -> Result<(), DomainError> {
    if title.is_empty() {
        return Err(DomainError::validation("post title must not be empty"));
    }
    if title.chars().count() > POST_TITLE_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "post title exceeds {POST_TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn validate_post_text(text: &str) -> Result<(), DomainError> {
    if text.is_empty() {
        return Err(DomainError::validation("post text must not be empty"));
    }
    if text.chars().count() > POST_TEXT_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "post text exceeds {POST_TEXT_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn validate_comment_text(text: &str) -> Result<(), DomainError> {
    if text.is_empty() {
        return Err(DomainError::validation("comment must not be empty"));
    }
    if text.chars().count() > COMMENT_TEXT_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "comment exceeds {COMMENT_TEXT_MAX_CHARS} characters"
        )));
    }
    Ok(())
}
