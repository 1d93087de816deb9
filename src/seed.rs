//! Default records written the first time each table is initialized.

use serde::{Deserialize, Serialize};

use crate::entity_model::{BlogPost, Entity, Game, Product, User};
use crate::error::StoreError;

const DEFAULT_DATASET: &str = include_str!("../data/seed.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    pub games: Vec<Game>,
    pub products: Vec<Product>,
    pub blog_posts: Vec<BlogPost>,
    pub users: Vec<User>,
}

impl SeedData {
    /// Parses the dataset bundled with the crate.
    pub fn bundled() -> Result<Self, StoreError> {
        Ok(serde_json::from_str(DEFAULT_DATASET)?)
    }
}

/// Entity kinds that have default records.
pub trait SeedSource: Entity {
    fn default_records(data: &SeedData) -> &[Self];
}

impl SeedSource for Game {
    fn default_records(data: &SeedData) -> &[Self] {
        &data.games
    }
}

impl SeedSource for Product {
    fn default_records(data: &SeedData) -> &[Self] {
        &data.products
    }
}

impl SeedSource for BlogPost {
    fn default_records(data: &SeedData) -> &[Self] {
        &data.blog_posts
    }
}

impl SeedSource for User {
    fn default_records(data: &SeedData) -> &[Self] {
        &data.users
    }
}

/// Which tables `LocalStore::initialize` populated. A `false` means the table
/// had already been seeded on an earlier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub games: bool,
    pub products: bool,
    pub blog_posts: bool,
    pub users: bool,
}

impl SeedReport {
    pub fn any(&self) -> bool {
        self.games || self.products || self.blog_posts || self.users
    }
}
