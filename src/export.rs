//! PNG export of the rendered tree.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use js_sys::{Array, Uint8Array};
use log::{error, info};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
	Blob, BlobPropertyBag, CanvasRenderingContext2d, CssStyleSheet, Document, Element,
	HtmlAnchorElement, HtmlCanvasElement, Url, Window, XmlSerializer,
};

use crate::avatar::load_image;
use crate::config::{AppConfig, AssetPaths};
use crate::dates::{iso, today};
use crate::error::{TreeError, describe_js};
use crate::loader::fetch_response;
use crate::tree::ViewBox;

/// Selector of the rendered tree.
pub const TREE_SVG_SELECTOR: &str = "#tree-container svg";
/// Class of the group carrying the pan/zoom transform.
pub const VIEWPORT_CLASS: &str = "viewport";

/// `arbol-genealogico-{family}-{YYYY-MM-DD}.png`
pub fn file_name(family: &str, date: NaiveDate) -> String {
	let family = if family.is_empty() { "familia" } else { family };
	format!("arbol-genealogico-{family}-{}.png", iso(date))
}

/// Pixel size of the exported image.
pub fn canvas_size(view_box: &ViewBox, scale: f64) -> (u32, u32) {
	(
		(view_box.width * scale).round() as u32,
		(view_box.height * scale).round() as u32,
	)
}

/// Put page CSS inside the SVG so it renders standalone.
pub fn inline_styles(svg: &str, css: &str) -> String {
	let style = format!("<style>{css}</style>");
	if svg.contains("</defs>") {
		return svg.replacen("</defs>", &format!("{style}</defs>"), 1);
	}
	match svg.find("<svg").and_then(|start| svg[start..].find('>').map(|end| start + end + 1)) {
		Some(at) => format!("{}{style}{}", &svg[..at], &svg[at..]),
		None => svg.to_string(),
	}
}

pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
	format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

/// Page shown in a new tab on mobile, where direct downloads are often blocked.
pub fn mobile_page(image_href: &str, file_name: &str) -> String {
	format!(
		r#"<div class="export-preview">
	<img src="{image_href}" alt="Árbol Genealógico" style="max-width: 100%; height: auto; display: block; margin: 0 auto 16px;">
	<a href="{image_href}" download="{file_name}" style="display: block; padding: 12px; background: #1a73e8; color: white; border-radius: 4px; text-align: center; text-decoration: none;">Descargar Imagen</a>
</div>"#
	)
}

fn js_err(err: JsValue) -> TreeError {
	TreeError::export(describe_js(&err))
}

/// Clone the live SVG, embed images and styles, rasterize and hand the PNG
/// to the user.
pub async fn export_tree_png(paths: &AssetPaths, config: &AppConfig) -> Result<(), TreeError> {
	let window = web_sys::window().ok_or_else(|| TreeError::export("sin ventana"))?;
	let document = window
		.document()
		.ok_or_else(|| TreeError::export("sin documento"))?;
	let svg = document
		.query_selector(TREE_SVG_SELECTOR)
		.map_err(js_err)?
		.ok_or_else(|| TreeError::export("no hay ningún árbol dibujado"))?;
	let view_box = svg
		.get_attribute("viewBox")
		.as_deref()
		.and_then(ViewBox::parse)
		.ok_or_else(|| TreeError::export("viewBox ausente"))?;

	let viewport_width = window
		.inner_width()
		.ok()
		.and_then(|w| w.as_f64())
		.unwrap_or_default();
	let scale = config.export_scale(viewport_width);
	let mobile = viewport_width <= config.mobile_breakpoint;

	let clone: Element = svg
		.clone_node_with_deep(true)
		.map_err(js_err)?
		.dyn_into()
		.map_err(|_| TreeError::export("el clon no es un elemento"))?;
	clone
		.set_attribute("width", &view_box.width.to_string())
		.map_err(js_err)?;
	clone
		.set_attribute("height", &view_box.height.to_string())
		.map_err(js_err)?;
	clone
		.set_attribute("style", "background: white")
		.map_err(js_err)?;
	// Export the fitted tree, not the current pan/zoom.
	if let Some(group) = clone
		.query_selector(&format!("g.{VIEWPORT_CLASS}"))
		.map_err(js_err)?
	{
		group.remove_attribute("transform").map_err(js_err)?;
	}

	inline_images(&clone).await;

	let markup = XmlSerializer::new()
		.and_then(|s| s.serialize_to_string(&clone))
		.map_err(js_err)?;
	let markup = inline_styles(&markup, &page_css(&document));
	let png = rasterize(&document, &markup, &view_box, scale).await?;

	let name = file_name(&paths.family, today());
	if mobile {
		open_in_tab(&window, &png, &name)?;
	} else {
		download(&document, &png, &name)?;
	}
	info!("Exported {name} at scale {scale}");
	Ok(())
}

/// Replace every pattern image href with an embedded data URL; images that
/// fail to load are skipped.
async fn inline_images(svg: &Element) {
	let Ok(images) = svg.query_selector_all("pattern image") else {
		return;
	};
	for i in 0..images.length() {
		let Some(image) = images.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
			continue;
		};
		let Some(href) = image.get_attribute("href") else {
			continue;
		};
		if href.starts_with("data:") {
			continue;
		}
		match fetch_data_url(&href).await {
			Ok(data) => {
				let _ = image.set_attribute("href", &data);
			}
			Err(e) => error!("Error al cargar imagen {href}: {e}"),
		}
	}
}

async fn fetch_data_url(url: &str) -> Result<String, TreeError> {
	let response = fetch_response(url).await?;
	let content_type = response
		.headers()
		.get("content-type")
		.ok()
		.flatten()
		.unwrap_or_else(|| "image/png".to_string());
	let buffer = JsFuture::from(response.array_buffer().map_err(|e| TreeError::network(&e))?)
		.await
		.map_err(|e| TreeError::network(&e))?;
	Ok(data_url(&content_type, &Uint8Array::new(&buffer).to_vec()))
}

fn page_css(document: &Document) -> String {
	let sheets = document.style_sheets();
	let mut css = String::new();
	for i in 0..sheets.length() {
		let Some(sheet) = sheets
			.item(i)
			.and_then(|s| s.dyn_into::<CssStyleSheet>().ok())
		else {
			continue;
		};
		// Cross-origin sheets refuse access to their rules.
		let Ok(rules) = sheet.css_rules() else {
			continue;
		};
		for j in 0..rules.length() {
			if let Some(rule) = rules.item(j) {
				css.push_str(&rule.css_text());
			}
		}
	}
	css
}

async fn rasterize(
	document: &Document,
	markup: &str,
	view_box: &ViewBox,
	scale: f64,
) -> Result<String, TreeError> {
	let options = BlobPropertyBag::new();
	options.set_type("image/svg+xml;charset=utf-8");
	let blob = Blob::new_with_str_sequence_and_options(&Array::of1(&JsValue::from_str(markup)), &options)
		.map_err(js_err)?;
	let url = Url::create_object_url_with_blob(&blob).map_err(js_err)?;
	let image = load_image(&url).await;
	let _ = Url::revoke_object_url(&url);
	let image = image.map_err(|_| TreeError::export("no se pudo dibujar el SVG"))?;

	let (width, height) = canvas_size(view_box, scale);
	let canvas: HtmlCanvasElement = document
		.create_element("canvas")
		.map_err(js_err)?
		.dyn_into()
		.map_err(|_| TreeError::export("canvas no disponible"))?;
	canvas.set_width(width);
	canvas.set_height(height);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(js_err)?
		.ok_or_else(|| TreeError::export("contexto 2d no disponible"))?
		.dyn_into()
		.map_err(|_| TreeError::export("contexto 2d no disponible"))?;

	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, f64::from(width), f64::from(height));
	ctx.scale(scale, scale).map_err(js_err)?;
	ctx.draw_image_with_html_image_element_and_dw_and_dh(
		&image,
		0.0,
		0.0,
		view_box.width,
		view_box.height,
	)
	.map_err(js_err)?;
	canvas.to_data_url_with_type("image/png").map_err(js_err)
}

fn download(document: &Document, href: &str, name: &str) -> Result<(), TreeError> {
	let link: HtmlAnchorElement = document
		.create_element("a")
		.map_err(js_err)?
		.dyn_into()
		.map_err(|_| TreeError::export("enlace no disponible"))?;
	link.set_download(name);
	link.set_href(href);
	link.click();
	Ok(())
}

fn open_in_tab(window: &Window, href: &str, name: &str) -> Result<(), TreeError> {
	let Some(tab) = window
		.open_with_url_and_target("", "_blank")
		.map_err(js_err)?
	else {
		return Err(TreeError::export("el navegador bloqueó la nueva pestaña"));
	};
	let document = tab
		.document()
		.ok_or_else(|| TreeError::export("sin documento"))?;
	document.set_title(name);
	document
		.body()
		.ok_or_else(|| TreeError::export("sin body"))?
		.set_inner_html(&mobile_page(href, name));
	Ok(())
}
