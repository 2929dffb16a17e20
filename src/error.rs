//! Error types for loading, building and exporting a family tree.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Structural problems found while turning the flat node list into a tree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StructureError {
	/// Two nodes share the same identifier.
	#[error("el identificador '{0}' está repetido")]
	DuplicateId(String),

	/// A node points at a parent that is not part of the dataset.
	#[error("el nodo '{child}' hace referencia a un padre inexistente '{parent}'")]
	UnknownParent {
		/// Node carrying the dangling reference.
		child: String,
		/// The missing parent identifier.
		parent: String,
	},

	/// A relationship node that does not name two partners.
	#[error("la relación '{0}' no identifica a dos personas")]
	MalformedRelationship(String),

	/// Every node has a parent (or the dataset is empty).
	#[error("no se encontró ningún nodo raíz")]
	NoRoot,

	/// More than one node has no parent.
	#[error("se encontraron varias raíces: {}", .0.join(", "))]
	MultipleRoots(Vec<String>),

	/// Nodes that cannot be reached from the root; they form a cycle.
	#[error("referencias cíclicas entre: {}", .0.join(", "))]
	Cycle(Vec<String>),
}

/// Everything that can stop the tree from being shown or exported.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TreeError {
	/// The page was opened without `?family=`.
	#[error("No se ha especificado el nombre de la familia en la URL (use ?family=nombreFamilia)")]
	MissingFamily,

	/// The request never produced a response.
	#[error("Error de red: {0}")]
	Network(String),

	/// The server answered with a non-2xx status.
	#[error("Error HTTP: {status} - {status_text}")]
	Http {
		/// HTTP status code.
		status: u16,
		/// Reason phrase sent by the server.
		status_text: String,
	},

	/// The document is not shaped like a family file.
	#[error("Estructura de datos inválida: {0}")]
	Shape(String),

	/// The nodes do not form a single rooted tree.
	#[error("Estructura del árbol inválida: {0}")]
	Structure(#[from] StructureError),

	/// The PNG export pipeline failed as a whole.
	#[error("Error al exportar el árbol: {0}")]
	Export(String),
}

impl TreeError {
	/// Create a data-shape error with the given message.
	#[must_use]
	pub fn shape(message: impl Into<String>) -> Self {
		Self::Shape(message.into())
	}

	/// Create an export error with the given message.
	#[must_use]
	pub fn export(message: impl Into<String>) -> Self {
		Self::Export(message.into())
	}

	/// Convert a rejected browser call into a network error.
	#[must_use]
	pub fn network(err: &JsValue) -> Self {
		Self::Network(describe_js(err))
	}
}

/// Best-effort text for an exception thrown by a browser API.
pub fn describe_js(err: &JsValue) -> String {
	err.as_string()
		.or_else(|| {
			js_sys::Reflect::get(err, &JsValue::from_str("message"))
				.ok()
				.and_then(|m| m.as_string())
		})
		.unwrap_or_else(|| format!("{err:?}"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn http_error_mentions_status() {
		let err = TreeError::Http {
			status: 404,
			status_text: "Not Found".into(),
		};
		assert_eq!(err.to_string(), "Error HTTP: 404 - Not Found");
	}

	#[test]
	fn structure_errors_wrap_transparently() {
		let err: TreeError = StructureError::MultipleRoots(vec!["a".into(), "b".into()]).into();
		assert_eq!(
			err.to_string(),
			"Estructura del árbol inválida: se encontraron varias raíces: a, b"
		);
	}

	#[test]
	fn shape_constructor() {
		assert_eq!(
			TreeError::shape("se requiere un array de nodes"),
			TreeError::Shape("se requiere un array de nodes".into())
		);
	}
}
