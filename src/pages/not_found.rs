use leptos::prelude::*;

/// 404 - Not Found
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="error-container">
			<h1>"Página no encontrada"</h1>
			<p class="error-hint">"Abre el árbol con /?family=nombreFamilia"</p>
		</div>
	}
}
