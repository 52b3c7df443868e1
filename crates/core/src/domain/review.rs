use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A rating and comment embedded in a product. Reviews have no identity of
/// their own and are only ever appended to their parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub author: String,
    pub rating: u8,
    pub comment: String,
}

impl Review {
    pub fn new(
        author: impl Into<String>,
        rating: i64,
        comment: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let author = author.into().trim().to_string();
        if author.is_empty() {
            return Err(DomainError::Validation("author must not be empty".to_string()));
        }

        let rating = u8::try_from(rating)
            .ok()
            .filter(|value| (MIN_RATING..=MAX_RATING).contains(value))
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "rating must be an integer between {MIN_RATING} and {MAX_RATING}"
                ))
            })?;

        let comment = comment.into().trim().to_string();
        if comment.is_empty() {
            return Err(DomainError::Validation("comment must not be empty".to_string()));
        }

        Ok(Self { author, rating, comment })
    }
}
