//! Reading foreign node lists into native vectors.

use crate::error::Result;
use crate::value::DynamicValue;

/// Upper bound on the up-front allocation; `length` comes from foreign code.
const PREALLOCATE_LIMIT: usize = 1024;

/// Collects the nodes of a foreign node list, in list order.
///
/// Some environments hand out plain arrays where a live `NodeList` is
/// expected. Anything whose `constructor` is `Array`, or that is an
/// `instanceof Array`, is read by index; everything else through
/// `item(i)`.
pub fn node_list_to_values(list: &DynamicValue) -> Result<Vec<DynamicValue>> {
	if is_array(list)? {
		return array_to_values(list);
	}
	let length = list.length()?;
	let mut nodes = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
	for i in 0..length {
		nodes.push(list.call("item", (i,))?);
	}
	Ok(nodes)
}

/// Collects the elements of any array-like value (`length` plus indexed
/// reads), in index order.
pub fn array_to_values(list: &DynamicValue) -> Result<Vec<DynamicValue>> {
	let length = list.length()?;
	(0..length).map(|i| list.index(i)).collect()
}

fn is_array(list: &DynamicValue) -> Result<bool> {
	let array = DynamicValue::global().get("Array")?;
	if list.get("constructor")?.equals(&array) {
		return Ok(true);
	}
	list.instance_of(&array)
}

#[cfg(all(test, simulated))]
mod tests {
	use super::*;
	use crate::BridgeError;
	use crate::runtime::sim;
	use rstest::{fixture, rstest};

	#[fixture]
	fn parent() -> DynamicValue {
		sim::reset();
		let document = DynamicValue::global().get("document").unwrap();
		let parent = document.call("createElement", ("ul",)).unwrap();
		for tag in ["li", "li", "p"] {
			let child = document.call("createElement", (tag,)).unwrap();
			parent.call("appendChild", (child,)).unwrap();
		}
		parent
	}

	fn tag_names(nodes: &[DynamicValue]) -> Vec<String> {
		nodes
			.iter()
			.map(|n| n.get("tagName").unwrap().as_string())
			.collect()
	}

	#[rstest]
	fn test_live_node_list_is_read_through_item(parent: DynamicValue) {
		// Arrange
		let children = parent.get("childNodes").unwrap();

		// Act
		let nodes = node_list_to_values(&children).unwrap();

		// Assert
		assert_eq!(tag_names(&nodes), ["LI", "LI", "P"]);
	}

	#[rstest]
	fn test_array_backed_list_is_read_by_index(parent: DynamicValue) {
		// Arrange
		let children = array_to_values(&parent.get("childNodes").unwrap()).unwrap();
		let array = crate::marshal::marshal(&children).unwrap();

		// Act
		let nodes = node_list_to_values(&array).unwrap();

		// Assert
		assert_eq!(tag_names(&nodes), ["LI", "LI", "P"]);
		assert!(nodes[2].equals(&children[2]));
	}

	#[rstest]
	fn test_empty_list() {
		sim::reset();
		let document = DynamicValue::global().get("document").unwrap();
		let leaf = document.call("createElement", ("span",)).unwrap();
		assert!(node_list_to_values(&leaf.get("childNodes").unwrap()).unwrap().is_empty());
	}

	#[rstest]
	fn test_non_object_list_is_a_type_error() {
		sim::reset();
		let err = node_list_to_values(&DynamicValue::null()).unwrap_err();
		assert!(matches!(err, BridgeError::ForeignType { .. }));
	}

	#[rstest]
	fn test_huge_length_does_not_preallocate() {
		// Arrange
		sim::reset();
		let list = crate::marshal::new_object().unwrap();
		list.set("length", 1e18_f64).unwrap();

		// Act
		let err = node_list_to_values(&list).unwrap_err();

		// Assert
		assert!(matches!(err, BridgeError::NoSuchMethod { ref method, .. } if method == "item"));
	}
}
