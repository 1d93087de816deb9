//! # Showcase Store
//!
//! Local persistence for a game company's showcase site and its admin panel:
//! games with their characters, the merchandise catalog, blog posts with
//! comments, admin users and the shopping cart. Records live in an LMDB
//! environment, one named database per entity kind, encoded as JSON.
//!
//! ## Rust usage
//!
//! ```no_run
//! use showcase_store::local_store::LocalStore;
//!
//! let store = LocalStore::open_named("showcase")?;
//! let report = store.initialize()?;
//! println!("seeded anything: {}", report.any());
//!
//! let plush = store.products().get_by_id("1")?.expect("seeded product");
//! store.cart().add(&plush, 2)?;
//! # Ok::<(), showcase_store::error::StoreError>(())
//! ```
//!
//! ## FFI functions
//!
//! Every function takes and returns null-terminated JSON strings. Results are
//! wrapped in an [`AppResponse`] envelope such as `{"Ok":"..."}` or
//! `{"NotFound":"..."}`; release them with [`free_c_string`].
//!
//! - [`create_store`] / [`close_store`] - open and release a store
//! - [`initialize_store`] - seed default records on first run
//! - [`list_records`], [`get_record`], [`put_record`], [`delete_record`] -
//!   per-kind CRUD for `games`, `products`, `blog-posts` and `users`
//! - [`get_cart`], [`add_to_cart`], [`set_cart_quantity`], [`clear_cart`]
//! - [`add_comment`], [`delete_comment`]
//! - [`authenticate`]
//! - [`place_order`]

pub mod app_response;
pub mod catalog;
pub mod checkout;
pub mod entity_model;
pub mod error;
pub mod local_store;
pub mod seed;
pub mod store_config;
pub mod validation;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};

pub use crate::app_response::AppResponse;
use crate::entity_model::{BlogPost, Entity, EntityKind, Game, Product, User};
use crate::local_store::LocalStore;
use crate::store_config::StoreConfig;
use crate::validation::ShippingDetails;

/// Opens (or creates) a store in the `<name>.lmdb` directory.
///
/// # Parameters
///
/// * `name` - Null-terminated C string: a plain store name, or a JSON
///   [`StoreConfig`] object (anything starting with `{`)
///
/// # Returns
///
/// A pointer to the [`LocalStore`], or null on failure. Release it with
/// [`close_store`].
///
/// # Safety
///
/// This function is unsafe because it:
/// - Dereferences a raw pointer
/// - Returns a raw pointer that must be released with [`close_store`]
/// - Requires the input string to be valid UTF-8
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char) -> *mut LocalStore {
    if name.is_null() {
        warn!("Null name pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = if name_str.trim_start().starts_with('{') {
        match StoreConfig::from_json(name_str) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid store configuration: {e}");
                return std::ptr::null_mut();
            }
        }
    } else {
        StoreConfig::named(name_str)
    };

    match LocalStore::open(config) {
        Ok(store) => {
            info!("Store '{}' ready", store.config().name);
            Box::into_raw(Box::new(store))
        }
        Err(e) => {
            warn!("Failed to open store '{name_str}': {e}");
            std::ptr::null_mut()
        }
    }
}

/// Seeds games, products, blog posts and users the first time it runs.
///
/// # Returns
///
/// The [`crate::seed::SeedReport`] as JSON, one flag per kind that was seeded
/// by this call.
///
/// # Safety
///
/// `state` must be a live pointer from [`create_store`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn initialize_store(state: *mut LocalStore) -> *const c_char {
    let store = match store_ref(state, "initialize_store") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    match store.initialize() {
        Ok(report) => response_to_c_string(&AppResponse::json(&report)),
        Err(e) => failure(e),
    }
}

/// Lists every record of `kind` as a JSON array.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `kind` - `games`, `products`, `blog-posts` or `users`
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn list_records(state: *mut LocalStore, kind: *const c_char) -> *const c_char {
    let (store, kind) = match store_and_kind(state, kind, "list_records") {
        Ok(pair) => pair,
        Err(error_ptr) => return error_ptr,
    };
    response_to_c_string(&dispatch(kind, store, ListOp))
}

/// Fetches one record of `kind` by id (username for `users`).
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `kind` - `games`, `products`, `blog-posts` or `users`
/// * `id` - Record id; an empty id is reported as `NotFound`
///
/// # Returns
///
/// The record as JSON, or `NotFound`. The returned string must be freed with
/// [`free_c_string`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_record(state: *mut LocalStore, kind: *const c_char, id: *const c_char) -> *const c_char {
    let (store, kind) = match store_and_kind(state, kind, "get_record") {
        Ok(pair) => pair,
        Err(error_ptr) => return error_ptr,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    response_to_c_string(&dispatch(kind, store, GetOp(&id)))
}

/// Inserts or fully replaces a record of `kind`. The record's own id decides
/// where it is stored.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `kind` - `games`, `products`, `blog-posts` or `users`
/// * `json_ptr` - The record as camelCase JSON
///
/// # Returns
///
/// The stored record, `SerializationError` for malformed JSON, or
/// `ValidationError` when the record fails the storage checks.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn put_record(state: *mut LocalStore, kind: *const c_char, json_ptr: *const c_char) -> *const c_char {
    let (store, kind) = match store_and_kind(state, kind, "put_record") {
        Ok(pair) => pair,
        Err(error_ptr) => return error_ptr,
    };
    let json = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };
    response_to_c_string(&dispatch(kind, store, PutOp(&json)))
}

/// Deletes a record of `kind`. Deleting a missing id reports `NotFound` and
/// changes nothing.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_record(state: *mut LocalStore, kind: *const c_char, id: *const c_char) -> *const c_char {
    let (store, kind) = match store_and_kind(state, kind, "delete_record") {
        Ok(pair) => pair,
        Err(error_ptr) => return error_ptr,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    response_to_c_string(&dispatch(kind, store, DeleteOp(&id)))
}

/// Returns the cart lines as a JSON array, in insertion order.
///
/// # Safety
///
/// `state` must be a live pointer from [`create_store`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_cart(state: *mut LocalStore) -> *const c_char {
    let store = match store_ref(state, "get_cart") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    match store.cart().items() {
        Ok(items) => response_to_c_string(&AppResponse::json(&items)),
        Err(e) => failure(e),
    }
}

/// Adds `quantity` of the product given as JSON, merging with an existing
/// line. Returns the updated cart.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `product_json` - The product snapshot as JSON
/// * `quantity` - Amount to add; a merged total of zero or less drops the line
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_to_cart(state: *mut LocalStore, product_json: *const c_char, quantity: i64) -> *const c_char {
    let store = match store_ref(state, "add_to_cart") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let json = match c_ptr_to_string(product_json, "product") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };
    let product: Product = match serde_json::from_str(&json) {
        Ok(product) => product,
        Err(e) => return response_to_c_string(&AppResponse::SerializationError(format!("Invalid product JSON: {e}"))),
    };

    match store.cart().add(&product, quantity) {
        Ok(items) => response_to_c_string(&AppResponse::json(&items)),
        Err(e) => failure(e),
    }
}

/// Sets the exact quantity of a cart line; zero or less removes it.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_cart_quantity(state: *mut LocalStore, product_id: *const c_char, quantity: i64) -> *const c_char {
    let store = match store_ref(state, "set_cart_quantity") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let product_id = match c_ptr_to_string(product_id, "product id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    match store.cart().set_item_quantity(&product_id, quantity) {
        Ok(items) => response_to_c_string(&AppResponse::json(&items)),
        Err(e) => failure(e),
    }
}

/// Empties the cart.
///
/// # Safety
///
/// `state` must be a live pointer from [`create_store`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_cart(state: *mut LocalStore) -> *const c_char {
    let store = match store_ref(state, "clear_cart") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    match store.cart().clear() {
        Ok(()) => response_to_c_string(&AppResponse::success("Cart cleared")),
        Err(e) => failure(e),
    }
}

/// Appends a comment to a post.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `post_id` - Id of the blog post
/// * `author` - Comment author name
/// * `content` - Comment text
///
/// # Returns
///
/// The new comment as JSON, or `NotFound` when the post does not exist.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_comment(
    state: *mut LocalStore,
    post_id: *const c_char,
    author: *const c_char,
    content: *const c_char,
) -> *const c_char {
    let store = match store_ref(state, "add_comment") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let post_id = match c_ptr_to_string(post_id, "post id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    let author = match c_ptr_to_string(author, "author") {
        Ok(author) => author,
        Err(error_ptr) => return error_ptr,
    };
    let content = match c_ptr_to_string(content, "content") {
        Ok(content) => content,
        Err(error_ptr) => return error_ptr,
    };

    match store.add_comment(&post_id, &author, &content) {
        Ok(Some(comment)) => response_to_c_string(&AppResponse::json(&comment)),
        Ok(None) => response_to_c_string(&AppResponse::NotFound(format!("No blog post found with id: {post_id}"))),
        Err(e) => failure(e),
    }
}

/// Removes one comment from a post. `NotFound` when either the post or the
/// comment is missing.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_comment(state: *mut LocalStore, post_id: *const c_char, comment_id: *const c_char) -> *const c_char {
    let store = match store_ref(state, "delete_comment") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let post_id = match c_ptr_to_string(post_id, "post id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    let comment_id = match c_ptr_to_string(comment_id, "comment id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    match store.delete_comment(&post_id, &comment_id) {
        Ok(true) => response_to_c_string(&AppResponse::success("Comment deleted successfully")),
        Ok(false) => response_to_c_string(&AppResponse::NotFound(format!(
            "No comment {comment_id} on post {post_id}"
        ))),
        Err(e) => failure(e),
    }
}

/// Checks admin credentials.
///
/// # Returns
///
/// The user as JSON, or `NotFound` when the pair does not match.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn authenticate(state: *mut LocalStore, username: *const c_char, password: *const c_char) -> *const c_char {
    let store = match store_ref(state, "authenticate") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let username = match c_ptr_to_string(username, "username") {
        Ok(username) => username,
        Err(error_ptr) => return error_ptr,
    };
    let password = match c_ptr_to_string(password, "password") {
        Ok(password) => password,
        Err(error_ptr) => return error_ptr,
    };

    match store.authenticate(&username, &password) {
        Ok(Some(user)) => response_to_c_string(&AppResponse::json(&user)),
        Ok(None) => response_to_c_string(&AppResponse::NotFound("Invalid credentials".to_string())),
        Err(e) => failure(e),
    }
}

/// Places a simulated order for the current cart and empties it.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `details_json` - [`ShippingDetails`] as camelCase JSON
///
/// # Returns
///
/// The receipt as JSON, or `ValidationError` for bad details or an empty cart.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must
/// come from [`create_store`] and not yet be closed; the string arguments must
/// be null-terminated and valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn place_order(state: *mut LocalStore, details_json: *const c_char) -> *const c_char {
    let store = match store_ref(state, "place_order") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let json = match c_ptr_to_string(details_json, "shipping details") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };
    let details: ShippingDetails = match serde_json::from_str(&json) {
        Ok(details) => details,
        Err(e) => return response_to_c_string(&AppResponse::from(e)),
    };

    match checkout::place_order(store, details) {
        Ok(receipt) => response_to_c_string(&AppResponse::json(&receipt)),
        Err(e) => failure(e),
    }
}

/// Closes the store and frees the pointer returned by [`create_store`].
///
/// # Safety
///
/// `state` must come from [`create_store`] and must not be used after this
/// call, or passed here twice.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(state: *mut LocalStore) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    let mut store = unsafe { Box::from_raw(state) };
    match store.close() {
        Ok(()) => response_to_c_string(&AppResponse::success("Store closed successfully")),
        Err(e) => failure(e),
    }
}

/// Frees a string returned by any function in this library.
///
/// # Safety
///
/// `ptr` must be a string returned by this library that has not been freed
/// already.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// A per-kind operation, run against the table chosen at runtime.
trait KindOp {
    fn run<T: Entity>(self, store: &LocalStore) -> AppResponse;
}

struct ListOp;
struct GetOp<'a>(&'a str);
struct PutOp<'a>(&'a str);
struct DeleteOp<'a>(&'a str);

impl KindOp for ListOp {
    fn run<T: Entity>(self, store: &LocalStore) -> AppResponse {
        match store.table::<T>().list() {
            Ok(records) => AppResponse::json(&records),
            Err(e) => AppResponse::from(e),
        }
    }
}

impl KindOp for GetOp<'_> {
    fn run<T: Entity>(self, store: &LocalStore) -> AppResponse {
        match store.table::<T>().get_by_id(self.0) {
            Ok(Some(record)) => AppResponse::json(&record),
            Ok(None) => AppResponse::NotFound(format!("No {} record found with id: {}", T::KIND, self.0)),
            Err(e) => AppResponse::from(e),
        }
    }
}

impl KindOp for PutOp<'_> {
    fn run<T: Entity>(self, store: &LocalStore) -> AppResponse {
        let record: T = match serde_json::from_str(self.0) {
            Ok(record) => record,
            Err(e) => return AppResponse::SerializationError(format!("Invalid {} JSON: {e}", T::KIND)),
        };
        match store.table::<T>().put(record) {
            Ok(stored) => AppResponse::json(&stored),
            Err(e) => AppResponse::from(e),
        }
    }
}

impl KindOp for DeleteOp<'_> {
    fn run<T: Entity>(self, store: &LocalStore) -> AppResponse {
        match store.table::<T>().delete_by_id(self.0) {
            Ok(true) => AppResponse::success("Record deleted successfully"),
            Ok(false) => AppResponse::NotFound(format!("No {} record found with id: {}", T::KIND, self.0)),
            Err(e) => AppResponse::from(e),
        }
    }
}

fn dispatch(kind: EntityKind, store: &LocalStore, op: impl KindOp) -> AppResponse {
    match kind {
        EntityKind::Games => op.run::<Game>(store),
        EntityKind::Products => op.run::<Product>(store),
        EntityKind::BlogPosts => op.run::<BlogPost>(store),
        EntityKind::Users => op.run::<User>(store),
        EntityKind::Cart => AppResponse::BadRequest("Use the cart functions for the cart".to_string()),
    }
}

fn store_ref<'a>(state: *mut LocalStore, fn_name: &str) -> Result<&'a LocalStore, *const c_char> {
    match unsafe { state.as_ref() } {
        Some(store) => Ok(store),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {fn_name}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn store_and_kind<'a>(
    state: *mut LocalStore,
    kind: *const c_char,
    fn_name: &str,
) -> Result<(&'a LocalStore, EntityKind), *const c_char> {
    let store = store_ref(state, fn_name)?;
    let kind = c_ptr_to_string(kind, "kind")?;
    match kind.parse::<EntityKind>() {
        Ok(kind) => Ok((store, kind)),
        Err(e) => Err(failure(e)),
    }
}

fn failure(err: error::StoreError) -> *const c_char {
    warn!("Store operation failed: {err}");
    response_to_c_string(&AppResponse::from(err))
}

/// Serializes an [`AppResponse`] into a C string owned by the caller. Null if
/// serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer into an owned `String`, or an error response
/// naming `field_name` when the pointer is null or not UTF-8.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
