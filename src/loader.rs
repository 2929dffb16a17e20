//! Fetching and validating the family data file.

use log::{debug, info};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::config::AssetPaths;
use crate::error::TreeError;
use crate::model::{Family, FamilyDocument};
use crate::tree::Hierarchy;

/// A family ready to be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedFamily {
	pub paths: AssetPaths,
	pub family: Family,
	pub hierarchy: Hierarchy,
}

/// Fetch `url` and reject non-2xx answers.
pub async fn fetch_response(url: &str) -> Result<Response, TreeError> {
	let window = web_sys::window().ok_or_else(|| TreeError::Network("sin ventana".into()))?;
	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(|e| TreeError::network(&e))?
		.dyn_into()
		.map_err(|e| TreeError::network(&e))?;
	if !response.ok() {
		return Err(TreeError::Http {
			status: response.status(),
			status_text: response.status_text(),
		});
	}
	Ok(response)
}

/// Check the minimal shape of the document and decode it.
pub fn parse_document(text: &str) -> Result<FamilyDocument, TreeError> {
	let value: Value = serde_json::from_str(text).map_err(|e| TreeError::shape(e.to_string()))?;
	if !value.get("nodes").is_some_and(Value::is_array) {
		return Err(TreeError::shape("se requiere un array de nodes"));
	}
	serde_json::from_value(value).map_err(|e| TreeError::shape(e.to_string()))
}

/// Turn a raw document into a family and its hierarchy.
pub fn prepare(paths: AssetPaths, doc: &FamilyDocument) -> Result<LoadedFamily, TreeError> {
	let family = Family::from_document(doc)?;
	let hierarchy = Hierarchy::build(&family)?;
	Ok(LoadedFamily {
		paths,
		family,
		hierarchy,
	})
}

/// Load `family-{name}.json` for the family in `paths`.
pub async fn load_family(paths: AssetPaths) -> Result<LoadedFamily, TreeError> {
	let url = paths.data_url();
	info!("Loading family data from {url}");
	let response = fetch_response(&url).await?;
	let text = JsFuture::from(response.text().map_err(|e| TreeError::network(&e))?)
		.await
		.map_err(|e| TreeError::network(&e))?
		.as_string()
		.unwrap_or_default();
	let doc = parse_document(&text)?;
	debug!("Fetched {} nodes", doc.nodes.len());
	prepare(paths, &doc)
}
