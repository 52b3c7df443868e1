use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::review::Review;
use crate::errors::DomainError;

/// Store-generated product identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier received from a client. Anything that is not exactly a
    /// UUID, surrounding whitespace included, is rejected before the store is consulted.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(raw).map(Self).map_err(|_| DomainError::InvalidProductId(raw.to_string()))
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// A catalog item together with its embedded reviews.
///
/// The identifier is serialized as `_id`, which is the field name storefront
/// clients key their links on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Product {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn default_size(&self) -> Option<&str> {
        self.sizes.first().map(String::as_str)
    }
}

/// Validated product fields, ready to be persisted. Reviews always start empty
/// and the identifier is assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        images: Vec<String>,
        sizes: Vec<String>,
    ) -> Result<Self, DomainError> {
        let name = required_text("name", name.into())?;
        let description = required_text("description", description.into())?;

        if price.is_sign_negative() && !price.is_zero() {
            return Err(DomainError::Validation("price must not be negative".to_string()));
        }

        let images = required_list("images", images)?;
        let sizes = required_list("sizes", sizes)?;

        Ok(Self { name, description, price, images, sizes })
    }

    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            images: self.images,
            sizes: self.sizes,
            reviews: Vec::new(),
        }
    }
}

fn required_text(field: &str, value: String) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn required_list(field: &str, values: Vec<String>) -> Result<Vec<String>, DomainError> {
    if values.is_empty() {
        return Err(DomainError::Validation(format!("{field} must contain at least one entry")));
    }

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(DomainError::Validation(format!("{field}[{index}] must not be empty")))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}
