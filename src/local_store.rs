//! LMDB-backed storage context.
//!
//! A [`LocalStore`] owns one LMDB environment with a named database per entity
//! kind and a `meta` database for the seeded flags. It is created once at
//! application start and handed to whatever needs persistence; typed access to
//! a single table goes through [`EntityStore`], the singleton cart through
//! [`CartStore`].
//!
//! Read-modify-write operations (cart edits, comment edits) run their read and
//! their write inside one LMDB write transaction. LMDB allows a single writer
//! at a time, so two callers editing the same record serialize instead of
//! overwriting each other. Plain `put` is still last-writer-wins.

use std::fs;
use std::marker::PhantomData;

use chrono::{SecondsFormat, Utc};
use lmdb::{Cursor, Database, DatabaseFlags, Environment, RwTransaction, Transaction, WriteFlags};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entity_model::{
    check_cart, BlogPost, CartItem, Comment, Entity, EntityKind, Game, Product, User,
};
use crate::error::{StoreError, StoreResult};
use crate::seed::{SeedData, SeedReport, SeedSource};
use crate::store_config::StoreConfig;

const CART_KEY: &str = "cart";
const MAX_DBS: u32 = 8;

/// Returns a millisecond timestamp id, the scheme every creator in the app
/// uses for new games, products, posts and comments.
pub fn timestamp_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Current time in the ISO form stored on comments.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone, Copy)]
struct Tables {
    games: Database,
    products: Database,
    blog_posts: Database,
    users: Database,
    cart: Database,
    meta: Database,
}

impl Tables {
    fn create(env: &Environment) -> StoreResult<Self> {
        let open = |name: &str| env.create_db(Some(name), DatabaseFlags::empty());
        Ok(Self {
            games: open(EntityKind::Games.table_name())?,
            products: open(EntityKind::Products.table_name())?,
            blog_posts: open(EntityKind::BlogPosts.table_name())?,
            users: open(EntityKind::Users.table_name())?,
            cart: open(EntityKind::Cart.table_name())?,
            meta: open("meta")?,
        })
    }

    fn for_kind(&self, kind: EntityKind) -> Database {
        match kind {
            EntityKind::Games => self.games,
            EntityKind::Products => self.products,
            EntityKind::BlogPosts => self.blog_posts,
            EntityKind::Users => self.users,
            EntityKind::Cart => self.cart,
        }
    }

    fn all(&self) -> [Database; 6] {
        [self.games, self.products, self.blog_posts, self.users, self.cart, self.meta]
    }
}

pub struct LocalStore {
    env: Option<Environment>,
    tables: Tables,
    config: StoreConfig,
}

impl LocalStore {
    /// Opens (or creates) the environment described by `config`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let dir = config.directory();
        fs::create_dir_all(&dir)?;
        info!("Opening store at {}", dir.display());

        let env = Environment::new()
            .set_max_dbs(MAX_DBS)
            .set_map_size(config.map_size)
            .set_max_readers(config.max_readers)
            .open(&dir)?;
        let tables = Tables::create(&env)?;

        Ok(Self {
            env: Some(env),
            tables,
            config,
        })
    }

    pub fn open_named(name: &str) -> StoreResult<Self> {
        Self::open(StoreConfig::named(name))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn env(&self) -> StoreResult<&Environment> {
        self.env.as_ref().ok_or(StoreError::Closed)
    }

    /// Typed access to the table for `T`.
    pub fn table<T: Entity>(&self) -> EntityStore<'_, T> {
        EntityStore::new(self)
    }

    pub fn games(&self) -> EntityStore<'_, Game> {
        self.table()
    }

    pub fn products(&self) -> EntityStore<'_, Product> {
        self.table()
    }

    pub fn blog_posts(&self) -> EntityStore<'_, BlogPost> {
        self.table()
    }

    pub fn users(&self) -> EntityStore<'_, User> {
        self.table()
    }

    pub fn cart(&self) -> CartStore<'_> {
        CartStore { store: self }
    }

    /// Seeds every kind that has never been seeded. Each kind is its own
    /// transaction; a failure part way leaves earlier kinds seeded.
    pub fn initialize(&self) -> StoreResult<SeedReport> {
        let data = SeedData::bundled()?;
        let report = SeedReport {
            games: self.games().seed_with(&data)?,
            products: self.products().seed_with(&data)?,
            blog_posts: self.blog_posts().seed_with(&data)?,
            users: self.users().seed_with(&data)?,
        };
        info!("Store initialized: {:?}", report);
        Ok(report)
    }

    pub fn is_seeded(&self, kind: EntityKind) -> StoreResult<bool> {
        let txn = self.env()?.begin_ro_txn()?;
        let flag: Option<bool> = read_value(&txn, self.tables.meta, &seed_flag_key(kind))?;
        Ok(flag.unwrap_or(false))
    }

    /// Checks a username/password pair against the users table. Exact string
    /// comparison on a plaintext password; returns `None` on any mismatch.
    pub fn authenticate(&self, username: &str, password: &str) -> StoreResult<Option<User>> {
        match self.users().get_by_id(username)? {
            Some(user) if user.password == password => {
                debug!("Authenticated user {username}");
                Ok(Some(user))
            }
            _ => {
                debug!("Authentication failed for {username}");
                Ok(None)
            }
        }
    }

    /// Appends a comment to a post and writes the post back. Returns `None`
    /// when the post does not exist.
    pub fn add_comment(&self, post_id: &str, author: &str, content: &str) -> StoreResult<Option<Comment>> {
        let db = self.tables.blog_posts;
        let mut txn = self.env()?.begin_rw_txn()?;

        let mut post: BlogPost = match read_value(&txn, db, post_id)? {
            Some(post) => post,
            None => {
                debug!("add_comment: no post with id {post_id}");
                return Ok(None);
            }
        };

        let comment = Comment {
            id: next_unique_id(&post.comments),
            post_id: post.id.clone(),
            author: author.to_string(),
            content: content.to_string(),
            date: iso_now(),
        };
        post.comments.push(comment.clone());
        write_value(&mut txn, db, &post.id, &post)?;
        txn.commit()?;

        debug!("Added comment {} to post {post_id}", comment.id);
        Ok(Some(comment))
    }

    /// Removes one comment by id. Surviving comments keep their order.
    pub fn delete_comment(&self, post_id: &str, comment_id: &str) -> StoreResult<bool> {
        let db = self.tables.blog_posts;
        let mut txn = self.env()?.begin_rw_txn()?;

        let mut post: BlogPost = match read_value(&txn, db, post_id)? {
            Some(post) => post,
            None => return Ok(false),
        };

        let before = post.comments.len();
        post.comments.retain(|c| c.id != comment_id);
        if post.comments.len() == before {
            return Ok(false);
        }

        write_value(&mut txn, db, &post.id, &post)?;
        txn.commit()?;
        debug!("Deleted comment {comment_id} from post {post_id}");
        Ok(true)
    }

    /// Deletes every record in every table, keeping the seeded flags.
    /// Returns how many records were removed.
    pub fn clear_all_records(&self) -> StoreResult<usize> {
        let env = self.env()?;
        let tables = EntityKind::SEEDED
            .iter()
            .map(|kind| self.tables.for_kind(*kind))
            .chain([self.tables.cart]);

        let mut removed = 0;
        let mut txn = env.begin_rw_txn()?;
        for db in tables {
            removed += count_entries(&txn, db)?;
            txn.clear_db(db)?;
        }
        txn.commit()?;

        info!("Cleared {removed} records");
        Ok(removed)
    }

    /// Deletes every record and every seeded flag, so the next `initialize`
    /// seeds again.
    pub fn reset(&self) -> StoreResult<()> {
        let mut txn = self.env()?.begin_rw_txn()?;
        for db in self.tables.all() {
            txn.clear_db(db)?;
        }
        txn.commit()?;
        info!("Store '{}' reset", self.config.name);
        Ok(())
    }

    /// Flushes and releases the environment. Any later call returns
    /// [`StoreError::Closed`].
    pub fn close(&mut self) -> StoreResult<()> {
        match self.env.take() {
            Some(env) => {
                if let Err(e) = env.sync(true) {
                    warn!("Failed to sync store before close: {e}");
                }
                info!("Store '{}' closed", self.config.name);
                Ok(())
            }
            None => Err(StoreError::Closed),
        }
    }
}

/// Typed view over one entity table.
pub struct EntityStore<'a, T> {
    store: &'a LocalStore,
    db: Database,
    _kind: PhantomData<T>,
}

impl<'a, T: Entity> EntityStore<'a, T> {
    fn new(store: &'a LocalStore) -> Self {
        Self {
            store,
            db: store.tables.for_kind(T::KIND),
            _kind: PhantomData,
        }
    }

    /// Every record of this kind, read into memory in key order.
    pub fn list(&self) -> StoreResult<Vec<T>> {
        let txn = self.store.env()?.begin_ro_txn()?;
        let mut records = Vec::new();
        {
            let mut cursor = txn.open_ro_cursor(self.db)?;
            for (_, value) in cursor.iter() {
                records.push(serde_json::from_slice(value)?);
            }
        }
        debug!("Listed {} {} records", records.len(), T::KIND);
        Ok(records)
    }

    pub fn get_by_id(&self, id: &str) -> StoreResult<Option<T>> {
        let txn = self.store.env()?.begin_ro_txn()?;
        read_value(&txn, self.db, id)
    }

    /// Inserts or fully replaces the record at its key.
    pub fn put(&self, record: T) -> StoreResult<T> {
        record.check()?;
        let mut txn = self.store.env()?.begin_rw_txn()?;
        write_value(&mut txn, self.db, record.key(), &record)?;
        txn.commit()?;
        debug!("Stored {} record {}", T::KIND, record.key());
        Ok(record)
    }

    /// Removes the record if present. `Ok(false)` when there was nothing to
    /// remove.
    pub fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        if id.is_empty() {
            return Ok(false);
        }
        let mut txn = self.store.env()?.begin_rw_txn()?;
        match txn.del(self.db, &id, None) {
            Ok(()) => {
                txn.commit()?;
                debug!("Deleted {} record {id}", T::KIND);
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count(&self) -> StoreResult<usize> {
        let txn = self.store.env()?.begin_ro_txn()?;
        count_entries(&txn, self.db)
    }
}

impl<'a, T: SeedSource> EntityStore<'a, T> {
    /// Writes the bundled default records the first time it runs for this
    /// kind. Returns `true` if it seeded.
    pub fn seed_if_empty(&self) -> StoreResult<bool> {
        self.seed_with(&SeedData::bundled()?)
    }

    /// Same as [`Self::seed_if_empty`] with a caller-supplied dataset. The
    /// records and the seeded flag are committed together; the flag stays set
    /// even if every record is deleted later.
    pub fn seed_with(&self, data: &SeedData) -> StoreResult<bool> {
        let meta = self.store.tables.meta;
        let flag_key = seed_flag_key(T::KIND);
        let mut txn = self.store.env()?.begin_rw_txn()?;

        let seeded: Option<bool> = read_value(&txn, meta, &flag_key)?;
        if seeded.unwrap_or(false) {
            return Ok(false);
        }

        let records = T::default_records(data);
        for record in records {
            record.check()?;
            write_value(&mut txn, self.db, record.key(), record)?;
        }
        write_value(&mut txn, meta, &flag_key, &true)?;
        txn.commit()?;

        info!("Seeded {} {} records", records.len(), T::KIND);
        Ok(true)
    }
}

/// The singleton cart record.
pub struct CartStore<'a> {
    store: &'a LocalStore,
}

impl CartStore<'_> {
    pub fn items(&self) -> StoreResult<Vec<CartItem>> {
        let txn = self.store.env()?.begin_ro_txn()?;
        Ok(read_value(&txn, self.store.tables.cart, CART_KEY)?.unwrap_or_default())
    }

    /// Adds `quantity` of `product`, merging into an existing line for the
    /// same product id. The stored line keeps a snapshot of `product` taken
    /// when the line was first created. A merged quantity of zero or less
    /// drops the line.
    pub fn add(&self, product: &Product, quantity: i64) -> StoreResult<Vec<CartItem>> {
        self.update(|items| {
            match items.iter().position(|item| item.product.id == product.id) {
                Some(index) => {
                    let merged = i64::from(items[index].quantity) + quantity;
                    if merged <= 0 {
                        items.remove(index);
                    } else {
                        items[index].quantity = to_quantity(merged)?;
                    }
                }
                None if quantity > 0 => items.push(CartItem {
                    product: product.clone(),
                    quantity: to_quantity(quantity)?,
                }),
                None => {}
            }
            Ok(())
        })
    }

    /// Sets the exact quantity of a line; zero or less removes it. Unknown
    /// product ids leave the cart untouched.
    pub fn set_item_quantity(&self, product_id: &str, quantity: i64) -> StoreResult<Vec<CartItem>> {
        self.update(|items| {
            if let Some(index) = items.iter().position(|item| item.product.id == product_id) {
                if quantity <= 0 {
                    items.remove(index);
                } else {
                    items[index].quantity = to_quantity(quantity)?;
                }
            }
            Ok(())
        })
    }

    pub fn remove(&self, product_id: &str) -> StoreResult<Vec<CartItem>> {
        self.set_item_quantity(product_id, 0)
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.update(|items| {
            items.clear();
            Ok(())
        })
        .map(|_| ())
    }

    fn update<F>(&self, edit: F) -> StoreResult<Vec<CartItem>>
    where
        F: FnOnce(&mut Vec<CartItem>) -> StoreResult<()>,
    {
        let db = self.store.tables.cart;
        let mut txn = self.store.env()?.begin_rw_txn()?;
        let mut items: Vec<CartItem> = read_value(&txn, db, CART_KEY)?.unwrap_or_default();

        edit(&mut items)?;
        check_cart(&items)?;

        write_value(&mut txn, db, CART_KEY, &items)?;
        txn.commit()?;
        debug!("Cart now holds {} lines", items.len());
        Ok(items)
    }
}

fn to_quantity(quantity: i64) -> StoreResult<u32> {
    u32::try_from(quantity)
        .map_err(|_| StoreError::validation(format!("cart quantity out of range: {quantity}")))
}

fn seed_flag_key(kind: EntityKind) -> String {
    format!("seeded:{}", kind.table_name())
}

/// Timestamp id that does not collide with any comment already on the post.
fn next_unique_id(existing: &[Comment]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while existing.iter().any(|c| c.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

fn read_value<T, Txn>(txn: &Txn, db: Database, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    Txn: Transaction,
{
    // LMDB rejects zero-length keys; `put` never stores one.
    if key.is_empty() {
        return Ok(None);
    }
    match txn.get(db, &key) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
        Err(lmdb::Error::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_value<T: Serialize + ?Sized>(
    txn: &mut RwTransaction<'_>,
    db: Database,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let bytes = serde_json::to_vec(value)?;
    txn.put(db, &key, &bytes, WriteFlags::empty())?;
    Ok(())
}

fn count_entries<Txn: Transaction>(txn: &Txn, db: Database) -> StoreResult<usize> {
    let mut cursor = txn.open_ro_cursor(db)?;
    Ok(cursor.iter().count())
}
