//! Record definitions for every entity kind kept by the store.
//!
//! Each record is stored as its serde_json encoding under its key. Field names
//! are camelCase so a stored record has the same shape the web client reads
//! and writes (`imageUrl`, `inStock`, `publishedDate`, ...), and optional
//! fields are left out of the JSON when absent.
//!
//! Child records ([`Character`], [`Comment`]) are embedded in their parent and
//! carry a back-reference id only; they have no table of their own.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Categories the admin panel suggests for products. The field itself is
/// free text.
pub const SUGGESTED_CATEGORIES: [&str; 4] = ["Plushies", "Clothing", "Collectibles", "Accessories"];

/// The tables kept by a [`crate::local_store::LocalStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Games,
    Products,
    BlogPosts,
    Users,
    Cart,
}

impl EntityKind {
    /// Kinds that are seeded on first run, in seeding order.
    pub const SEEDED: [EntityKind; 4] = [
        EntityKind::Games,
        EntityKind::Products,
        EntityKind::BlogPosts,
        EntityKind::Users,
    ];

    /// Name of the LMDB database holding this kind.
    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::Games => "games",
            EntityKind::Products => "products",
            EntityKind::BlogPosts => "blog-posts",
            EntityKind::Users => "users",
            EntityKind::Cart => "cart",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for EntityKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "games" => Ok(EntityKind::Games),
            "products" => Ok(EntityKind::Products),
            "blog-posts" => Ok(EntityKind::BlogPosts),
            "users" => Ok(EntityKind::Users),
            "cart" => Ok(EntityKind::Cart),
            other => Err(StoreError::UnknownKind(other.to_string())),
        }
    }
}

/// A record that lives in its own keyed table.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    const KIND: EntityKind;

    /// Primary key. Ids for games, products and posts; the username for users.
    fn key(&self) -> &str;

    /// Structural checks run by `put` before anything is written.
    fn check(&self) -> Result<(), StoreError> {
        if self.key().is_empty() {
            return Err(StoreError::validation(format!("{} record has an empty key", Self::KIND)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning game. Relation only: the game's `characters` list owns the record.
    pub game_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<String>>,
}

impl Entity for Game {
    const KIND: EntityKind = EntityKind::Games;

    fn key(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.id.is_empty() {
            return Err(StoreError::validation("game id is empty"));
        }
        for character in &self.characters {
            if character.game_id != self.id {
                return Err(StoreError::validation(format!(
                    "character {} points at game {}, expected {}",
                    character.id, character.game_id, self.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url2: Option<String>,
    pub category: String,
    pub in_stock: bool,
}

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Products;

    fn key(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.id.is_empty() {
            return Err(StoreError::validation("product id is empty"));
        }
        check_price(self)
    }
}

fn check_price(product: &Product) -> Result<(), StoreError> {
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(StoreError::validation(format!(
            "product {} has an invalid price: {}",
            product.id, product.price
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    /// Creation time, ISO-8601 with milliseconds (`2024-01-15T10:30:00.000Z`).
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    /// Plain text, paragraphs separated by blank lines.
    pub content: String,
    pub excerpt: String,
    pub image_url: String,
    pub author: String,
    pub published_date: String,
    /// Display order is insertion order.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Entity for BlogPost {
    const KIND: EntityKind = EntityKind::BlogPosts;

    fn key(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.id.is_empty() {
            return Err(StoreError::validation("blog post id is empty"));
        }
        for comment in &self.comments {
            if comment.post_id != self.id {
                return Err(StoreError::validation(format!(
                    "comment {} points at post {}, expected {}",
                    comment.id, comment.post_id, self.id
                )));
            }
        }
        Ok(())
    }
}

/// Admin panel account. The password is kept and compared in plaintext; this
/// is not a security boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::Users;

    fn key(&self) -> &str {
        &self.username
    }
}

/// A cart line. `product` is a snapshot taken when the line was added and
/// does not follow later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Checks a whole cart before it is written: positive quantities, valid
/// product snapshots, one line per product id.
pub(crate) fn check_cart(items: &[CartItem]) -> Result<(), StoreError> {
    for (index, item) in items.iter().enumerate() {
        if item.quantity == 0 {
            return Err(StoreError::validation(format!(
                "cart line for product {} has zero quantity",
                item.product.id
            )));
        }
        check_price(&item.product)?;
        if items[..index].iter().any(|other| other.product.id == item.product.id) {
            return Err(StoreError::validation(format!(
                "product {} appears twice in the cart",
                item.product.id
            )));
        }
    }
    Ok(())
}
