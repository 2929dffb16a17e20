//! Interactive family tree and birthday calendar, rendered client-side with
//! Leptos.
//!
//! The data model, tree building, layout, calendar and export geometry are
//! plain Rust; the browser glue lives in the components.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod avatar;
pub mod calendar;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod tooltip;
pub mod tree;

// Modules
mod components;
mod pages;

// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the family page and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="es" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Árbol Genealógico" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router base=config::current_base_path()>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/index.html") view=Home />
			</Routes>
		</Router>
	}
}
