//! Process-wide default client and its shortcut functions.

use std::sync::LazyLock;

use courier_core::{Body, Destination, Result};

use crate::client::Client;
use crate::request::Request;

static DEFAULT_CLIENT: LazyLock<Client> = LazyLock::new(Client::new);

/// Process-wide client, built with [`Client::new`] on first use.
///
/// Clone it to change its configuration: the clone does not affect other
/// users of the default client.
#[must_use]
pub fn default_client() -> &'static Client {
    &DEFAULT_CLIENT
}

/// Start a GET request on the default client.
#[must_use]
pub fn get(url: impl AsRef<str>) -> Request {
    default_client().get(url)
}

/// Start a PUT request on the default client.
#[must_use]
pub fn put(url: impl AsRef<str>) -> Request {
    default_client().put(url)
}

/// Start a HEAD request on the default client.
#[must_use]
pub fn head(url: impl AsRef<str>) -> Request {
    default_client().head(url)
}

/// Start a POST request on the default client.
#[must_use]
pub fn post(url: impl AsRef<str>) -> Request {
    default_client().post(url)
}

/// Start a PATCH request on the default client.
#[must_use]
pub fn patch(url: impl AsRef<str>) -> Request {
    default_client().patch(url)
}

/// Start a DELETE request on the default client.
#[must_use]
pub fn delete(url: impl AsRef<str>) -> Request {
    default_client().delete(url)
}

/// Start an OPTIONS request on the default client.
#[must_use]
pub fn options(url: impl AsRef<str>) -> Request {
    default_client().options(url)
}

/// GET `url` and decode the response into `dst`.
pub async fn get_into<D: Destination>(url: impl AsRef<str>, dst: &mut D) -> Result<()> {
    get(url).send_into(dst).await.into_result()
}

/// POST `body` to `url` and decode the response into `dst`.
///
/// Strings and bytes are sent as is, values built with [`Body::value`] are
/// encoded as JSON.
pub async fn post_into<D: Destination>(
    url: impl AsRef<str>,
    body: impl Into<Body>,
    dst: &mut D,
) -> Result<()> {
    post(url).set_body(body).send_into(dst).await.into_result()
}

/// PUT `body` to `url` and decode the response into `dst`.
pub async fn put_into<D: Destination>(
    url: impl AsRef<str>,
    body: impl Into<Body>,
    dst: &mut D,
) -> Result<()> {
    put(url).set_body(body).send_into(dst).await.into_result()
}

/// PATCH `body` to `url` and decode the response into `dst`.
pub async fn patch_into<D: Destination>(
    url: impl AsRef<str>,
    body: impl Into<Body>,
    dst: &mut D,
) -> Result<()> {
    patch(url).set_body(body).send_into(dst).await.into_result()
}

/// DELETE `url` with an optional `body`, pass `()` for none, and decode the
/// response into `dst`.
pub async fn delete_into<D: Destination>(
    url: impl AsRef<str>,
    body: impl Into<Body>,
    dst: &mut D,
) -> Result<()> {
    delete(url).set_body(body).send_into(dst).await.into_result()
}
