//! Marshalling integration tests
//!
//! Success Criteria:
//! 1. Records become objects with the declared property names, in order
//! 2. Scalars survive a marshal/unmarshal round trip
//! 3. Sequences keep their order, maps keep their key set
//! 4. A failing marshal leaves the receiving object untouched
//!
//! Test Categories:
//! - Happy Path: 4 tests
//! - Error Path: 2 tests
//! - Property-based: 4 tests

#![cfg(not(target_arch = "wasm32"))]

use std::collections::{BTreeSet, HashMap};

use domglue_core::runtime::sim;
use domglue_core::{BridgeError, DynamicValue, Marshal, Result, Type, marshal};
use proptest::prelude::*;
use rstest::*;

// ============================================================================
// Fixtures
// ============================================================================

#[fixture]
fn realm() {
	sim::reset();
}

#[derive(Marshal)]
struct Record {
	#[js(name = "name")]
	display_name: String,
	values: Vec<i32>,
}

#[derive(Marshal)]
struct Settings<T> {
	#[serde(rename = "maxRetries")]
	max_retries: u32,
	label: Option<String>,
	#[js(skip)]
	#[allow(dead_code)]
	scratch: Vec<u8>,
	nested: T,
}

#[derive(Marshal)]
struct Point(f64, f64);

#[derive(Marshal)]
struct Empty;

/// Fails to marshal, for checking that nothing is written.
struct Unmarshallable;

impl Marshal for Unmarshallable {
	fn marshal(&self) -> Result<DynamicValue> {
		Err(BridgeError::UnsupportedNativeShape("opaque handle".to_string()))
	}
}

#[derive(Marshal)]
struct Partial {
	first: i32,
	second: Unmarshallable,
}

// ============================================================================
// Happy Path Tests
// ============================================================================

/// Tests the `{name: "a", values: [1, 2, 3]}` record
#[rstest]
fn test_record_scenario(#[from(realm)] _realm: ()) {
	// Arrange
	let record = Record {
		display_name: "a".to_string(),
		values: vec![1, 2, 3],
	};

	// Act
	let value = marshal(&record).unwrap();

	// Assert
	assert_eq!(value.get("name").unwrap().as_string(), "a");
	let values = value.get("values").unwrap();
	assert_eq!(values.length().unwrap(), 3);
	let items: Vec<i32> = (0..3).map(|i| values.index(i).unwrap().as_i32().unwrap()).collect();
	assert_eq!(items, [1, 2, 3]);
	assert_eq!(value.keys().unwrap(), ["name", "values"]);
}

/// Tests renames, skipped fields, absent options and generic fields
#[rstest]
fn test_field_mapping(#[from(realm)] _realm: ()) {
	// Arrange
	let settings = Settings {
		max_retries: 3,
		label: None,
		scratch: vec![0; 16],
		nested: Point(1.5, -2.0),
	};

	// Act
	let value = settings.marshal().unwrap();

	// Assert
	assert_eq!(value.keys().unwrap(), ["maxRetries", "label", "nested"]);
	assert_eq!(value.get("maxRetries").unwrap().as_i32().unwrap(), 3);
	assert!(value.get("label").unwrap().is_null());
	let nested = value.get("nested").unwrap();
	assert_eq!(nested.length().unwrap(), 2);
	assert_eq!(nested.index(1).unwrap().as_f64().unwrap(), -2.0);
}

/// Tests that a unit struct becomes null, as it does through serde
#[rstest]
fn test_unit_struct(#[from(realm)] _realm: ()) {
	// Arrange
	#[derive(serde::Serialize)]
	struct Marker;

	// Act
	let derived = Empty.marshal().unwrap();
	let serialized = domglue_core::to_dynamic(&Marker).unwrap();

	// Assert
	assert_eq!(derived.type_of(), Type::Null);
	assert_eq!(serialized.type_of(), Type::Null);
	assert!(derived.equals(&serialized));
}

/// Tests that a record can be passed straight to a foreign call
#[rstest]
fn test_record_as_call_argument(#[from(realm)] _realm: ()) {
	// Arrange
	let object = DynamicValue::global().get("Object").unwrap();
	let record = Record {
		display_name: "b".to_string(),
		values: vec![],
	};

	// Act
	let keys = object.call("keys", (&record,)).unwrap();

	// Assert
	assert_eq!(keys.unmarshal::<Vec<String>>().unwrap(), ["name", "values"]);
}

// ============================================================================
// Error Path Tests
// ============================================================================

/// Tests that a failing field aborts without touching the receiver
#[rstest]
fn test_failed_marshal_does_not_mutate(#[from(realm)] _realm: ()) {
	// Arrange
	let target = domglue_core::marshal::new_object().unwrap();
	let partial = Partial {
		first: 1,
		second: Unmarshallable,
	};

	// Act
	let result = target.set("config", &partial);

	// Assert
	assert!(matches!(result, Err(BridgeError::UnsupportedNativeShape(_))));
	assert!(target.keys().unwrap().is_empty());
	assert!(target.get("config").unwrap().is_undefined());
}

/// Tests that non-string map keys are rejected by the serde bridge
#[rstest]
fn test_non_string_keys_rejected(#[from(realm)] _realm: ()) {
	let map: HashMap<(i32, i32), &str> = HashMap::from([((0, 0), "origin")]);
	let err = domglue_core::to_dynamic(&map).unwrap_err();
	assert!(matches!(err, BridgeError::UnsupportedNativeShape(_)));
}

// ============================================================================
// Property-based Tests
// ============================================================================

/// Tests scalar round trips through the foreign runtime
#[rstest]
fn test_scalar_round_trip(#[from(realm)] _realm: ()) {
	proptest!(|(n in any::<i32>(), x in -1.0e12f64..1.0e12f64, b in any::<bool>(), s in ".*")| {
		prop_assert_eq!(marshal(&n).unwrap().unmarshal::<i32>().unwrap(), n);
		prop_assert_eq!(marshal(&x).unwrap().unmarshal::<f64>().unwrap(), x);
		prop_assert_eq!(marshal(&b).unwrap().unmarshal::<bool>().unwrap(), b);
		prop_assert_eq!(marshal(&s).unwrap().unmarshal::<String>().unwrap(), s.clone());

		let foreign = marshal(&s).unwrap();
		prop_assert!(foreign.equals(&marshal(s.as_str()).unwrap()));
	});
}

/// Tests that sequences keep their order
#[rstest]
fn test_sequence_order(#[from(realm)] _realm: ()) {
	proptest!(|(xs in prop::collection::vec(any::<i64>().prop_map(|n| n >> 12), 0..32))| {
		let array = marshal(&xs).unwrap();
		prop_assert_eq!(array.length().unwrap(), xs.len());
		for (i, expected) in xs.iter().enumerate() {
			prop_assert_eq!(array.index(i).unwrap().as_i64().unwrap(), *expected);
		}
	});
}

/// Tests that maps keep their key set regardless of iteration order
#[rstest]
fn test_map_key_set(#[from(realm)] _realm: ()) {
	proptest!(|(map in prop::collection::hash_map("[a-z][a-z0-9_]{0,7}", any::<i32>(), 0..16))| {
		let object = marshal(&map).unwrap();
		let keys: BTreeSet<String> = object.keys().unwrap().into_iter().collect();
		let expected: BTreeSet<String> = map.keys().cloned().collect();
		prop_assert_eq!(keys, expected);
		for (key, value) in &map {
			prop_assert_eq!(object.get(key).unwrap().as_i32().unwrap(), *value);
		}
	});
}

/// Tests that derive and serde agree on records
#[rstest]
fn test_derive_matches_serde(#[from(realm)] _realm: ()) {
	#[derive(serde::Serialize)]
	struct Wire {
		name: String,
		values: Vec<i32>,
	}

	proptest!(|(name in "[ -~]{0,12}", values in prop::collection::vec(any::<i32>(), 0..8))| {
		let derived = marshal(&Record { display_name: name.clone(), values: values.clone() }).unwrap();
		let serialized = domglue_core::to_dynamic(&Wire { name, values }).unwrap();

		prop_assert_eq!(derived.keys().unwrap(), serialized.keys().unwrap());
		prop_assert_eq!(
			derived.get("values").unwrap().unmarshal::<Vec<i32>>().unwrap(),
			serialized.get("values").unwrap().unmarshal::<Vec<i32>>().unwrap()
		);
		prop_assert_eq!(
			derived.get("name").unwrap().as_string(),
			serialized.get("name").unwrap().as_string()
		);
	});
}
