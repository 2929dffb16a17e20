//! Avatar image resolution.
//!
//! A person's avatar is the first candidate path that loads as an image; when
//! none does, the default avatar for their sex is used.

use js_sys::{Function, Promise};
use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

use crate::config::{AVATAR_EXTENSIONS, AssetPaths};
use crate::model::Person;

/// Paths to probe for a person, most specific first.
pub fn candidates(paths: &AssetPaths, person: &Person) -> Vec<String> {
	person
		.image
		.as_deref()
		.map(|image| paths.explicit_image(image))
		.into_iter()
		.chain(
			AVATAR_EXTENSIONS
				.iter()
				.map(|ext| paths.person_image(&person.id, ext)),
		)
		.collect()
}

/// Probe candidates in order and fall back to the default avatar.
pub async fn resolve(paths: &AssetPaths, person: &Person) -> String {
	for url in candidates(paths, person) {
		if image_exists(&url).await {
			return url;
		}
	}
	debug!("no avatar for '{}', using default", person.id);
	paths.default_avatar(person.sex)
}

/// Whether the browser manages to load `url` as an image.
pub async fn image_exists(url: &str) -> bool {
	load_image(url).await.is_ok()
}

/// Load `url` into a detached image element.
pub async fn load_image(url: &str) -> Result<HtmlImageElement, JsValue> {
	let img = HtmlImageElement::new()?;
	let mut handlers: Option<(Closure<dyn FnMut()>, Closure<dyn FnMut()>)> = None;
	let promise = Promise::new(&mut |resolve: Function, reject: Function| {
		let onload: Closure<dyn FnMut()> = Closure::once(move || {
			let _ = resolve.call0(&JsValue::NULL);
		});
		let onerror: Closure<dyn FnMut()> = Closure::once(move || {
			let _ = reject.call0(&JsValue::NULL);
		});
		img.set_onload(Some(onload.as_ref().unchecked_ref()));
		img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
		handlers = Some((onload, onerror));
	});
	img.set_src(url);
	let settled = JsFuture::from(promise).await;
	// Detach before the closures are freed; the one that never ran goes too.
	img.set_onload(None);
	img.set_onerror(None);
	drop(handlers);
	settled?;
	Ok(img)
}
