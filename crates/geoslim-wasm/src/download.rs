//! Saving a [`Download`] from the browser.
//!
//! The file is wrapped in a `Blob`, given an object URL, and offered
//! through a throwaway `<a download>` element attached to the page body.
//! Only meaningful on `wasm32-unknown-unknown` inside a page.

use geoslim_export::Download;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

/// Why the browser could not offer a file.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// No window, document, or body to attach the link to.
    #[error("no {0} available; downloads need a page context")]
    NoBrowser(&'static str),

    /// The `Blob` or its object URL could not be created.
    #[error("could not stage {filename}: {reason}")]
    Blob {
        /// File being staged.
        filename: String,
        /// Browser error text.
        reason: String,
    },

    /// The link element could not be created or attached.
    #[error("could not attach download link: {0}")]
    Link(String),
}

/// Object URL that is revoked when dropped.
struct ObjectUrl(String);

impl ObjectUrl {
    fn for_blob(blob: &Blob) -> Result<Self, JsValue> {
        Url::create_object_url_with_blob(blob).map(Self)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        // Revocation failing only leaks the blob until the page unloads.
        let _ = Url::revoke_object_url(&self.0);
    }
}

/// Offer `file` to the user as a browser download.
///
/// # Errors
///
/// Returns [`DownloadError::NoBrowser`] outside a page,
/// [`DownloadError::Blob`] if the browser will not hold the contents, and
/// [`DownloadError::Link`] if the link element cannot be used.
pub fn trigger_download(file: &Download) -> Result<(), DownloadError> {
    let document = web_sys::window()
        .ok_or(DownloadError::NoBrowser("window"))?
        .document()
        .ok_or(DownloadError::NoBrowser("document"))?;
    let body = document.body().ok_or(DownloadError::NoBrowser("body"))?;

    let staging = |err: JsValue| DownloadError::Blob {
        filename: file.filename.clone(),
        reason: describe(&err),
    };
    let url = ObjectUrl::for_blob(&blob_of(file).map_err(staging)?).map_err(staging)?;

    let link = document
        .create_element("a")
        .map_err(|e| DownloadError::Link(describe(&e)))?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|e| DownloadError::Link(describe(&e)))?;
    link.set_href(&url.0);
    link.set_download(&file.filename);

    body.append_child(&link)
        .map_err(|e| DownloadError::Link(describe(&e)))?;
    link.click();
    log::debug!(
        "offered {} ({} bytes, {})",
        file.filename,
        file.contents.len(),
        file.mime_type
    );
    // The click has already handed the URL to the browser.
    let _ = body.remove_child(&link);

    Ok(())
}

fn blob_of(file: &Download) -> Result<Blob, JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(&file.contents));
    let options = BlobPropertyBag::new();
    options.set_type(&file.mime_type);
    Blob::new_with_str_sequence_and_options(&parts, &options)
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
