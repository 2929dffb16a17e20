use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::Title;
use leptos_router::hooks::use_query_map;
use log::{debug, error};

use crate::components::calendar::Calendar;
use crate::components::export_button::ExportButton;
use crate::components::family_tree::{FamilyTree, Generation};
use crate::config::{AppConfig, AssetPaths, family_from_query};
use crate::dates::today;
use crate::error::TreeError;
use crate::loader::{LoadedFamily, load_family};

const URL_HINT: &str =
	"Asegúrate de que la URL tenga el formato correcto: /?family=nombreFamilia";

#[derive(Clone, Debug, PartialEq)]
enum LoadState {
	Loading,
	Ready(LoadedFamily),
	Failed(TreeError),
}

/// Tree, calendar and export for the family named in `?family=`.
#[component]
pub fn Home() -> impl IntoView {
	let query = use_query_map();
	let family = Memo::new(move |_| family_from_query(query.with(|q| q.get("family"))));
	let state = RwSignal::new(LoadState::Loading);
	let generation = StoredValue::new(Generation::default());

	// Only the latest requested family may land.
	Effect::new(move |_| {
		let tag = generation.try_update_value(|g| g.begin()).unwrap_or_default();
		match family.get() {
			Err(e) => state.set(LoadState::Failed(e)),
			Ok(name) => {
				state.set(LoadState::Loading);
				let paths = AssetPaths::from_location(name);
				spawn_local(async move {
					let result = load_family(paths).await;
					if generation.try_with_value(|g| g.is_current(tag)) != Some(true) {
						debug!("ignoring stale load result");
						return;
					}
					state.try_set(match result {
						Ok(loaded) => LoadState::Ready(loaded),
						Err(e) => {
							error!("Error al cargar los datos: {e}");
							LoadState::Failed(e)
						}
					});
				});
			}
		}
	});

	let title = move || match family.get() {
		Ok(name) => AssetPaths::new("", name).page_title(),
		Err(_) => "Árbol Genealógico".to_string(),
	};

	view! {
		<Title text=title />
		<header>
			<h1 id="family-title">{title}</h1>
		</header>
		<main class="layout">
			{move || match state.get() {
				LoadState::Loading => {
					view! {
						<div id="loading-spinner" class="loading-spinner">
							<div class="spinner"></div>
							<p>"Cargando árbol genealógico..."</p>
						</div>
					}
						.into_any()
				}
				LoadState::Failed(e) => {
					view! {
						<div class="error-container">
							<h2>"Error"</h2>
							<p class="error-message">{e.to_string()}</p>
							<p class="error-hint">{URL_HINT}</p>
						</div>
					}
						.into_any()
				}
				LoadState::Ready(loaded) => {
					let config = AppConfig::default();
					let persons = loaded.family.persons().cloned().collect::<Vec<_>>();
					let paths = loaded.paths.clone();
					view! {
						<section id="tree-container" class="tree-container">
							<FamilyTree loaded=loaded config=config.clone() />
							<div class="export-controls">
								<ExportButton paths=paths config=config.clone() />
							</div>
						</section>
						<Calendar persons=persons today=today() config=config />
					}
						.into_any()
				}
			}}
		</main>
	}
}
