//! Runtime settings and asset locations.

use crate::error::TreeError;
use crate::model::Sex;

/// Host name on which assets are served from the site root.
const LOCAL_HOST: &str = "localhost";
/// Prefix used when the app is deployed under a sub-path.
const DEPLOYED_BASE_PATH: &str = "/family-tree";

/// Image extensions probed for a person's avatar, in order.
pub const AVATAR_EXTENSIONS: [&str; 3] = ["png", "jpeg", "jpg"];

/// Tunables for layout, viewport and export.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
	pub layout: LayoutConfig,
	/// Lower and upper zoom bounds.
	pub zoom_extent: (f64, f64),
	/// Padding around the tree bounds in the SVG viewBox.
	pub view_padding: f64,
	/// Viewport width at or below which the export is treated as mobile.
	pub mobile_breakpoint: f64,
	/// Viewport width at or below which the calendar becomes a drawer.
	pub calendar_breakpoint: f64,
	pub desktop_export_scale: f64,
	pub mobile_export_scale: f64,
}

/// Spacing rules for the tree layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Horizontal distance represented by one separation unit.
	pub node_width: f64,
	/// Vertical distance between depths.
	pub level_height: f64,
	/// Separation between neighbours, in units of `node_width`.
	pub sibling_separation: f64,
	/// Separation when both neighbours are couples.
	pub couple_separation: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			node_width: 120.0,
			level_height: 160.0,
			sibling_separation: 2.0,
			couple_separation: 2.5,
		}
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			layout: LayoutConfig::default(),
			zoom_extent: (0.5, 2.0),
			view_padding: 100.0,
			mobile_breakpoint: 768.0,
			calendar_breakpoint: 700.0,
			desktop_export_scale: 2.0,
			mobile_export_scale: 1.0,
		}
	}
}

impl AppConfig {
	/// Rasterization factor for a viewport of the given width.
	pub fn export_scale(&self, viewport_width: f64) -> f64 {
		if viewport_width <= self.mobile_breakpoint {
			self.mobile_export_scale
		} else {
			self.desktop_export_scale
		}
	}
}

/// Resolve the base path for a given host name.
pub fn base_path_for_host(host: &str) -> &'static str {
	if host == LOCAL_HOST { "" } else { DEPLOYED_BASE_PATH }
}

/// Base path for the page currently loaded in the browser.
pub fn current_base_path() -> &'static str {
	let host = web_sys::window()
		.and_then(|w| w.location().hostname().ok())
		.unwrap_or_default();
	base_path_for_host(&host)
}

/// Extract the family name from a query string such as `?family=Perez`.
pub fn family_from_query(value: Option<String>) -> Result<String, TreeError> {
	value
		.map(|v| v.trim().to_lowercase())
		.filter(|v| !v.is_empty())
		.ok_or(TreeError::MissingFamily)
}

/// Locations of the data file and images of one family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
	pub base_path: String,
	pub family: String,
}

impl AssetPaths {
	pub fn new(base_path: impl Into<String>, family: impl Into<String>) -> Self {
		Self {
			base_path: base_path.into(),
			family: family.into(),
		}
	}

	/// Build paths from the current page location.
	pub fn from_location(family: String) -> Self {
		Self::new(current_base_path(), family)
	}

	pub fn data_url(&self) -> String {
		format!(
			"{}/families/{}/data/family-{}.json",
			self.base_path, self.family, self.family
		)
	}

	pub fn images_dir(&self) -> String {
		format!("{}/families/{}/images", self.base_path, self.family)
	}

	pub fn person_image(&self, id: &str, ext: &str) -> String {
		format!("{}/{id}.{ext}", self.images_dir())
	}

	/// Resolve an explicit `image` field: absolute paths and URLs are kept,
	/// bare file names live in the family images directory.
	pub fn explicit_image(&self, image: &str) -> String {
		if image.starts_with('/') || image.contains("://") || image.starts_with("data:") {
			image.to_string()
		} else {
			format!("{}/{image}", self.images_dir())
		}
	}

	pub fn default_avatar(&self, sex: Sex) -> String {
		let variant = match sex {
			Sex::Male => "male",
			Sex::Female => "female",
		};
		format!("{}/images/default-avatar-{variant}.png", self.base_path)
	}

	/// Family name with the first letter upper-cased.
	pub fn display_family(&self) -> String {
		let mut chars = self.family.chars();
		match chars.next() {
			Some(first) => first.to_uppercase().chain(chars).collect(),
			None => String::new(),
		}
	}

	pub fn page_title(&self) -> String {
		format!("Árbol Genealógico de la Familia {}", self.display_family())
	}
}
