use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;
use web_sys::MouseEvent;

use crate::config::{AppConfig, AssetPaths};
use crate::export::export_tree_png;

/// How long the failure mark stays on the button.
const FAILURE_DISPLAY: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportStatus {
	#[default]
	Idle,
	Working,
	Failed,
}

impl ExportStatus {
	pub fn label(self) -> &'static str {
		match self {
			ExportStatus::Idle => "💾",
			ExportStatus::Working => "⏳",
			ExportStatus::Failed => "❌",
		}
	}
}

#[component]
pub fn ExportButton(
	paths: AssetPaths,
	#[prop(default = AppConfig::default())] config: AppConfig,
) -> impl IntoView {
	let status = RwSignal::new(ExportStatus::Idle);
	let settings = StoredValue::new((paths, config));

	let on_click = move |_: MouseEvent| {
		if status.get_untracked() == ExportStatus::Working {
			return;
		}
		status.set(ExportStatus::Working);
		let (paths, config) = settings.get_value();
		spawn_local(async move {
			match export_tree_png(&paths, &config).await {
				Ok(()) => {
					status.try_set(ExportStatus::Idle);
				}
				Err(e) => {
					error!("{e}");
					status.try_set(ExportStatus::Failed);
					set_timeout(
						move || {
							status.try_set(ExportStatus::Idle);
						},
						FAILURE_DISPLAY,
					);
				}
			}
		});
	};

	view! {
		<button
			id="export-tree"
			class="control-button"
			title="Exportar como imagen"
			disabled=move || status.get() == ExportStatus::Working
			on:click=on_click
		>
			{move || status.get().label()}
		</button>
	}
}
