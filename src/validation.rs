//! Form rules applied before anything is handed to the store.
//!
//! Each check returns a [`FieldErrors`] map keyed by field name; an empty map
//! means the input is acceptable. These are the messages a form shows next to
//! its fields, separate from the structural checks `put` performs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity_model::{BlogPost, Product};

pub type FieldErrors = BTreeMap<&'static str, String>;

/// Customer details collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field, message.to_string());
    }
}

/// `\S+@\S+\.\S+`: something, an `@`, something, a dot, something, with no
/// whitespace in any of the parts.
pub fn is_valid_email(email: &str) -> bool {
    email.split_whitespace().any(|token| {
        token.char_indices().filter(|&(_, c)| c == '@').any(|(at, _)| {
            let (local, domain) = (&token[..at], &token[at + 1..]);
            !local.is_empty()
                && domain
                    .char_indices()
                    .filter(|&(_, c)| c == '.')
                    .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
        })
    })
}

pub fn validate_product(product: &Product) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require(&mut errors, "name", &product.name, "Name is required");
    require(&mut errors, "description", &product.description, "Description is required");
    if product.price.is_nan() || product.price <= 0.0 {
        errors.insert("price", "Price must be greater than 0".to_string());
    }
    require(&mut errors, "imageUrl", &product.image_url, "Image URL is required");
    require(&mut errors, "category", &product.category, "Category is required");
    errors
}

pub fn validate_blog_post(post: &BlogPost) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require(&mut errors, "title", &post.title, "Title is required");
    require(&mut errors, "content", &post.content, "Content is required");
    require(&mut errors, "excerpt", &post.excerpt, "Excerpt is required");
    require(&mut errors, "imageUrl", &post.image_url, "Image URL is required");
    require(&mut errors, "author", &post.author, "Author is required");
    if post.published_date.is_empty() {
        errors.insert("publishedDate", "Publication date is required".to_string());
    }
    errors
}

pub fn validate_comment(author: &str, content: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require(&mut errors, "author", author, "Name is required");
    require(&mut errors, "content", content, "Comment is required");
    errors
}

pub fn validate_login(username: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require(&mut errors, "username", username, "Username is required");
    require(&mut errors, "password", password, "Password is required");
    errors
}

pub fn validate_shipping(details: &ShippingDetails) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require(&mut errors, "firstName", &details.first_name, "First name is required");
    require(&mut errors, "lastName", &details.last_name, "Last name is required");
    if details.email.trim().is_empty() {
        errors.insert("email", "Email is required".to_string());
    } else if !is_valid_email(&details.email) {
        errors.insert("email", "Email is not valid".to_string());
    }
    require(&mut errors, "address", &details.address, "Address is required");
    require(&mut errors, "city", &details.city, "City is required");
    require(&mut errors, "postalCode", &details.postal_code, "Postal code is required");
    require(&mut errors, "country", &details.country, "Country is required");
    errors
}
