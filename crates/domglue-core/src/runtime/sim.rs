//! Simulated foreign runtime
//!
//! An in-process object heap with JavaScript semantics, used on every target
//! that is not a browser. It implements the part of the host the bridge
//! relies on:
//!
//! - primitives, plain objects, arrays, symbols and native functions
//! - prototype chains and `instanceof`
//! - `Object`, `Array`, `Symbol`, `Event`, `EventTarget`, `Element`, `NodeList`
//! - a `document` with `createElement`, `getElementById` and a `body`
//! - `addEventListener` / `removeEventListener` / `dispatchEvent` on event targets
//!
//! Events are dispatched at the target only; there is no capture or bubble
//! walk through ancestors.
//!
//! Each thread owns one realm, created lazily on first use. [`reset`] drops
//! it so the next access starts from a fresh heap:
//!
//! ```ignore
//! use domglue_core::runtime::sim;
//!
//! sim::reset();
//! let doc = domglue_core::document()?;
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use super::{Exception, ForeignRuntime, NativeFn};
use crate::types::{Type, number_to_string};
use crate::value::DynamicValue;

/// The simulated runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimRuntime;

/// A value living in the simulated heap.
#[derive(Clone)]
pub enum SimValue {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(Rc<str>),
	Symbol(Rc<Symbol>),
	Object(ObjectRef),
}

/// A unique symbol. Identity is the allocation.
#[derive(Debug)]
pub struct Symbol {
	description: Option<String>,
}

/// Shared handle to a heap object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

/// Native side of a function created through [`SimRuntime::new_function`].
#[derive(Debug)]
pub struct SimFunction {
	object: Weak<RefCell<ObjectData>>,
}

struct ObjectData {
	class: Class,
	properties: Vec<(String, SimValue)>,
	prototype: Option<ObjectRef>,
	listeners: Vec<Listener>,
}

enum Class {
	Plain,
	Array(Vec<SimValue>),
	NodeList(Vec<SimValue>),
	Function(FunctionSlot),
	Event(EventFlags),
}

struct FunctionSlot {
	/// `None` once released.
	call: Option<NativeFn<SimValue>>,
	/// Receives the freshly allocated `this`; an object result replaces it.
	construct: Option<NativeFn<SimValue>>,
}

#[derive(Default)]
struct EventFlags {
	stop_immediate: bool,
}

#[derive(Clone)]
struct Listener {
	event_type: String,
	callback: ObjectRef,
	capture: bool,
}

impl Listener {
	fn same(&self, event_type: &str, callback: &ObjectRef, capture: bool) -> bool {
		self.event_type == event_type && self.callback.ptr_eq(callback) && self.capture == capture
	}
}

fn type_error(message: impl fmt::Display) -> Exception {
	Exception::new(format!("TypeError: {message}"))
}

fn array_index(name: &str) -> Option<usize> {
	let index: u32 = name.parse().ok()?;
	(index.to_string() == name).then_some(index as usize)
}

impl ObjectRef {
	fn new(class: Class, prototype: Option<ObjectRef>) -> Self {
		Self(Rc::new(RefCell::new(ObjectData {
			class,
			properties: Vec::new(),
			prototype,
			listeners: Vec::new(),
		})))
	}

	fn ptr_eq(&self, other: &ObjectRef) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn prototype(&self) -> Option<ObjectRef> {
		self.0.borrow().prototype.clone()
	}

	fn is_function(&self) -> bool {
		matches!(self.0.borrow().class, Class::Function(_))
	}

	fn is_event(&self) -> bool {
		matches!(self.0.borrow().class, Class::Event(_))
	}

	fn own(&self, name: &str) -> Option<SimValue> {
		let data = self.0.borrow();
		match &data.class {
			Class::Array(items) | Class::NodeList(items) => {
				if name == "length" {
					return Some(SimValue::Number(items.len() as f64));
				}
				if let Some(index) = array_index(name) {
					return Some(items.get(index).cloned().unwrap_or(SimValue::Undefined));
				}
			}
			_ => {}
		}
		data.properties
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.clone())
	}

	fn lookup(&self, name: &str) -> SimValue {
		let mut current = Some(self.clone());
		while let Some(object) = current {
			if let Some(value) = object.own(name) {
				return value;
			}
			current = object.prototype();
		}
		SimValue::Undefined
	}

	fn put(&self, name: &str, value: SimValue) {
		let mut data = self.0.borrow_mut();
		match &mut data.class {
			Class::Array(items) => {
				if name == "length" {
					let len = value.to_number();
					if len >= 0.0 && len.fract() == 0.0 {
						items.resize(len as usize, SimValue::Undefined);
					}
					return;
				}
				if let Some(index) = array_index(name) {
					if index >= items.len() {
						items.resize(index + 1, SimValue::Undefined);
					}
					items[index] = value;
					return;
				}
			}
			Class::NodeList(_) => return,
			_ => {}
		}
		match data.properties.iter_mut().find(|(key, _)| key == name) {
			Some(slot) => slot.1 = value,
			None => data.properties.push((name.to_string(), value)),
		}
	}

	fn remove(&self, name: &str) {
		let mut data = self.0.borrow_mut();
		if let Class::Array(items) = &mut data.class
			&& let Some(index) = array_index(name)
		{
			if let Some(slot) = items.get_mut(index) {
				*slot = SimValue::Undefined;
			}
			return;
		}
		data.properties.retain(|(key, _)| key != name);
	}

	fn keys(&self) -> Vec<String> {
		let data = self.0.borrow();
		let indices = match &data.class {
			Class::Array(items) | Class::NodeList(items) => items.len(),
			_ => 0,
		};
		(0..indices)
			.map(|i| i.to_string())
			.chain(data.properties.iter().map(|(key, _)| key.clone()))
			.collect()
	}

	fn describe(&self) -> &'static str {
		match self.0.try_borrow() {
			Ok(data) => match data.class {
				Class::Plain => "[object Object]",
				Class::Array(_) => "[object Array]",
				Class::NodeList(_) => "[object NodeList]",
				Class::Function(_) => "[function]",
				Class::Event(_) => "[object Event]",
			},
			Err(_) => "[object]",
		}
	}
}

impl SimValue {
	fn from_object(object: ObjectRef) -> Self {
		SimValue::Object(object)
	}

	fn as_object(&self) -> Option<&ObjectRef> {
		match self {
			SimValue::Object(object) => Some(object),
			_ => None,
		}
	}

	fn to_number(&self) -> f64 {
		match self {
			SimValue::Undefined => f64::NAN,
			SimValue::Null => 0.0,
			SimValue::Bool(b) => f64::from(u8::from(*b)),
			SimValue::Number(n) => *n,
			SimValue::String(s) => s.trim().parse().unwrap_or(f64::NAN),
			SimValue::Symbol(_) | SimValue::Object(_) => f64::NAN,
		}
	}

	/// `String(value)` for primitives; objects render as their class tag.
	fn to_display_string(&self) -> String {
		match self {
			SimValue::Undefined => "undefined".to_string(),
			SimValue::Null => "null".to_string(),
			SimValue::Bool(b) => b.to_string(),
			SimValue::Number(n) => number_to_string(*n),
			SimValue::String(s) => s.to_string(),
			SimValue::Symbol(symbol) => {
				format!("Symbol({})", symbol.description.as_deref().unwrap_or(""))
			}
			SimValue::Object(object) => object.describe().to_string(),
		}
	}

	fn truthy(&self) -> bool {
		match self {
			SimValue::Undefined | SimValue::Null => false,
			SimValue::Bool(b) => *b,
			SimValue::Number(n) => *n != 0.0 && !n.is_nan(),
			SimValue::String(s) => !s.is_empty(),
			SimValue::Symbol(_) | SimValue::Object(_) => true,
		}
	}
}

impl fmt::Debug for SimValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SimValue::String(s) => write!(f, "{:?}", s),
			other => f.write_str(&other.to_display_string()),
		}
	}
}

impl fmt::Debug for ObjectRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.describe())
	}
}

/// Per-thread heap roots.
struct Realm {
	global: ObjectRef,
	object_prototype: ObjectRef,
	function_prototype: ObjectRef,
	array_prototype: ObjectRef,
	node_list_prototype: ObjectRef,
	element_prototype: ObjectRef,
	origin: Instant,
}

thread_local! {
	static REALM: RefCell<Option<Rc<Realm>>> = const { RefCell::new(None) };
}

/// Runs `f` against this thread's realm, creating it on first use.
fn with_realm<F, R>(f: F) -> R
where
	F: FnOnce(&Realm) -> R,
{
	let realm = REALM.with(|slot| {
		slot.borrow_mut()
			.get_or_insert_with(|| Rc::new(Realm::new()))
			.clone()
	});
	f(&realm)
}

/// Drops this thread's realm.
///
/// Builtins and every object reachable from the old global object
/// reference each other (`window.window`, `prototype.constructor`,
/// `parentNode`), so they are emptied before the realm is dropped. Handles
/// to those objects stay valid but see empty objects afterwards.
pub fn reset() {
	let Some(realm) = REALM.with(|slot| slot.borrow_mut().take()) else {
		return;
	};
	teardown(vec![
		realm.global.clone(),
		realm.object_prototype.clone(),
		realm.function_prototype.clone(),
		realm.array_prototype.clone(),
		realm.node_list_prototype.clone(),
		realm.element_prototype.clone(),
	]);
}

/// Empties every object reachable from `roots`.
fn teardown(roots: Vec<ObjectRef>) {
	let mut seen = HashSet::new();
	let mut pending = roots;
	// Dropped only once no object is borrowed; closures may hold callbacks.
	let mut garbage = Vec::new();

	while let Some(object) = pending.pop() {
		if !seen.insert(Rc::as_ptr(&object.0)) {
			continue;
		}
		let Ok(mut data) = object.0.try_borrow_mut() else {
			continue;
		};
		let (properties, prototype, listeners, class) = {
			let data = &mut *data;
			(
				std::mem::take(&mut data.properties),
				data.prototype.take(),
				std::mem::take(&mut data.listeners),
				std::mem::replace(&mut data.class, Class::Plain),
			)
		};
		let items: &[SimValue] = match &class {
			Class::Array(items) | Class::NodeList(items) => items.as_slice(),
			_ => &[],
		};
		pending.extend(
			properties
				.iter()
				.map(|(_, value)| value)
				.chain(items)
				.filter_map(SimValue::as_object)
				.cloned(),
		);
		pending.extend(prototype.iter().cloned());
		pending.extend(listeners.iter().map(|l| l.callback.clone()));
		garbage.push((properties, prototype, listeners, class));
	}
	drop(garbage);
}

/// Number of listeners currently registered on `target` in the heap.
pub fn listener_count(target: &DynamicValue) -> usize {
	target
		.raw()
		.as_object()
		.map_or(0, |object| object.0.borrow().listeners.len())
}

fn native_fn<F>(f: F) -> NativeFn<SimValue>
where
	F: Fn(SimValue, Vec<SimValue>) -> Result<SimValue, Exception> + 'static,
{
	Rc::new(f)
}

impl Realm {
	fn new() -> Self {
		let object_prototype = ObjectRef::new(Class::Plain, None);
		let function_prototype = ObjectRef::new(Class::Plain, Some(object_prototype.clone()));
		let array_prototype = ObjectRef::new(Class::Plain, Some(object_prototype.clone()));
		let node_list_prototype = ObjectRef::new(Class::Plain, Some(object_prototype.clone()));
		let event_prototype = ObjectRef::new(Class::Plain, Some(object_prototype.clone()));
		let event_target_prototype = ObjectRef::new(Class::Plain, Some(object_prototype.clone()));
		let element_prototype = ObjectRef::new(Class::Plain, Some(event_target_prototype.clone()));
		let document_prototype = ObjectRef::new(Class::Plain, Some(event_target_prototype.clone()));
		let global = ObjectRef::new(Class::Plain, Some(event_target_prototype.clone()));

		let method = |target: &ObjectRef, name: &str, f: NativeFn<SimValue>| {
			let function = ObjectRef::new(
				Class::Function(FunctionSlot {
					call: Some(f),
					construct: None,
				}),
				Some(function_prototype.clone()),
			);
			function.put("name", SimValue::String(name.into()));
			target.put(name, SimValue::from_object(function));
		};
		let constructor = |name: &str,
		                   prototype: &ObjectRef,
		                   call: Option<NativeFn<SimValue>>,
		                   construct: Option<NativeFn<SimValue>>| {
			let function = ObjectRef::new(
				Class::Function(FunctionSlot { call, construct }),
				Some(function_prototype.clone()),
			);
			function.put("name", SimValue::String(name.into()));
			function.put("prototype", SimValue::from_object(prototype.clone()));
			prototype.put("constructor", SimValue::from_object(function.clone()));
			global.put(name, SimValue::from_object(function.clone()));
			function
		};

		// Object
		let object_ctor = constructor(
			"Object",
			&object_prototype,
			Some(native_fn(|_, _| {
				Ok(with_realm(|realm| {
					SimValue::from_object(ObjectRef::new(
						Class::Plain,
						Some(realm.object_prototype.clone()),
					))
				}))
			})),
			Some(native_fn(|this, _| Ok(this))),
		);
		method(
			&object_ctor,
			"keys",
			native_fn(|_, args| {
				let keys = match args.first() {
					Some(SimValue::Object(object)) => object.keys(),
					_ => return Err(type_error("Cannot convert undefined or null to object")),
				};
				Ok(with_realm(|realm| {
					realm.new_array(
						keys.into_iter()
							.map(|key| SimValue::String(key.into()))
							.collect(),
					)
				}))
			}),
		);

		// Function
		constructor("Function", &function_prototype, None, None);

		// Array
		let new_array = native_fn(|_, args| {
			let items = if args.len() == 1
				&& let SimValue::Number(n) = args[0]
			{
				if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
					return Err(Exception::new("RangeError: Invalid array length"));
				}
				vec![SimValue::Undefined; n as usize]
			} else {
				args
			};
			Ok(with_realm(|realm| realm.new_array(items)))
		});
		let array_ctor = constructor(
			"Array",
			&array_prototype,
			Some(new_array.clone()),
			Some(new_array),
		);
		method(
			&array_ctor,
			"isArray",
			native_fn(|_, args| {
				let is_array = args.first().and_then(SimValue::as_object).is_some_and(|o| {
					matches!(o.0.borrow().class, Class::Array(_))
				});
				Ok(SimValue::Bool(is_array))
			}),
		);
		method(
			&array_prototype,
			"push",
			native_fn(|this, args| {
				let object = this
					.as_object()
					.ok_or_else(|| type_error("Array.prototype.push called on non-object"))?;
				let mut data = object.0.borrow_mut();
				match &mut data.class {
					Class::Array(items) => {
						items.extend(args);
						Ok(SimValue::Number(items.len() as f64))
					}
					_ => Err(type_error("Array.prototype.push called on non-array")),
				}
			}),
		);

		// NodeList
		constructor("NodeList", &node_list_prototype, None, None);
		method(
			&node_list_prototype,
			"item",
			native_fn(|this, args| {
				let index = args.first().map_or(0.0, SimValue::to_number);
				let object = this.as_object().ok_or_else(|| type_error("Illegal invocation"))?;
				let data = object.0.borrow();
				match &data.class {
					Class::NodeList(items) if index >= 0.0 => Ok(items
						.get(index as usize)
						.cloned()
						.unwrap_or(SimValue::Null)),
					Class::NodeList(_) => Ok(SimValue::Null),
					_ => Err(type_error("Illegal invocation")),
				}
			}),
		);

		// Symbol
		constructor(
			"Symbol",
			&ObjectRef::new(Class::Plain, Some(object_prototype.clone())),
			Some(native_fn(|_, args| {
				let description = match args.first() {
					None | Some(SimValue::Undefined) => None,
					Some(value) => Some(value.to_display_string()),
				};
				Ok(SimValue::Symbol(Rc::new(Symbol { description })))
			})),
			None,
		);

		// EventTarget
		constructor(
			"EventTarget",
			&event_target_prototype,
			None,
			Some(native_fn(|this, _| Ok(this))),
		);
		method(
			&event_target_prototype,
			"addEventListener",
			native_fn(|this, args| {
				let (target, listener) = listener_args(&this, &args, "addEventListener")?;
				if let Some(listener) = listener {
					let mut data = target.0.borrow_mut();
					if !data
						.listeners
						.iter()
						.any(|l| l.same(&listener.event_type, &listener.callback, listener.capture))
					{
						data.listeners.push(listener);
					}
				}
				Ok(SimValue::Undefined)
			}),
		);
		method(
			&event_target_prototype,
			"removeEventListener",
			native_fn(|this, args| {
				let (target, listener) = listener_args(&this, &args, "removeEventListener")?;
				if let Some(listener) = listener {
					target.0.borrow_mut().listeners.retain(|l| {
						!l.same(&listener.event_type, &listener.callback, listener.capture)
					});
				}
				Ok(SimValue::Undefined)
			}),
		);
		method(
			&event_target_prototype,
			"dispatchEvent",
			native_fn(|this, args| dispatch_event(&this, args.first())),
		);

		// Event
		let event_ctor = constructor(
			"Event",
			&event_prototype,
			None,
			Some(native_fn(|this, args| {
				let Some(event_type) = args.first() else {
					return Err(type_error(
						"Failed to construct 'Event': 1 argument required, but only 0 present.",
					));
				};
				let init = args.get(1).and_then(SimValue::as_object);
				let flag = |name: &str| SimValue::Bool(init.is_some_and(|o| o.lookup(name).truthy()));
				let object = this.as_object().ok_or_else(|| type_error("Illegal constructor"))?;
				object.0.borrow_mut().class = Class::Event(EventFlags::default());
				let time_stamp = with_realm(|realm| realm.origin.elapsed().as_secs_f64() * 1000.0);
				object.put("type", SimValue::String(event_type.to_display_string().into()));
				object.put("bubbles", flag("bubbles"));
				object.put("cancelable", flag("cancelable"));
				object.put("defaultPrevented", SimValue::Bool(false));
				object.put("cancelBubble", SimValue::Bool(false));
				object.put("eventPhase", SimValue::Number(0.0));
				object.put("timeStamp", SimValue::Number(time_stamp));
				object.put("target", SimValue::Null);
				object.put("currentTarget", SimValue::Null);
				Ok(this)
			})),
		);
		for (name, phase) in [
			("NONE", 0.0),
			("CAPTURING_PHASE", 1.0),
			("AT_TARGET", 2.0),
			("BUBBLING_PHASE", 3.0),
		] {
			event_ctor.put(name, SimValue::Number(phase));
		}
		method(
			&event_prototype,
			"preventDefault",
			native_fn(|this, _| {
				let event = event_this(&this)?;
				if event.lookup("cancelable").truthy() {
					event.put("defaultPrevented", SimValue::Bool(true));
				}
				Ok(SimValue::Undefined)
			}),
		);
		method(
			&event_prototype,
			"stopPropagation",
			native_fn(|this, _| {
				event_this(&this)?.put("cancelBubble", SimValue::Bool(true));
				Ok(SimValue::Undefined)
			}),
		);
		method(
			&event_prototype,
			"stopImmediatePropagation",
			native_fn(|this, _| {
				with_event_flags(&this, |flags| flags.stop_immediate = true)?;
				event_this(&this)?.put("cancelBubble", SimValue::Bool(true));
				Ok(SimValue::Undefined)
			}),
		);

		// Element
		constructor("Element", &element_prototype, None, None);
		method(
			&element_prototype,
			"appendChild",
			native_fn(|this, args| {
				let parent = this.as_object().ok_or_else(|| type_error("Illegal invocation"))?;
				let child = args
					.first()
					.and_then(SimValue::as_object)
					.ok_or_else(|| type_error("parameter 1 is not of type 'Node'"))?;
				if let Some(SimValue::Object(children)) = parent.own("childNodes")
					&& let Class::NodeList(items) = &mut children.0.borrow_mut().class
				{
					items.push(SimValue::from_object(child.clone()));
				}
				child.put("parentNode", this.clone());
				Ok(SimValue::from_object(child.clone()))
			}),
		);

		// Document
		constructor("Document", &document_prototype, None, None);
		method(
			&document_prototype,
			"createElement",
			native_fn(|_, args| {
				let tag = args
					.first()
					.map(SimValue::to_display_string)
					.unwrap_or_else(|| "undefined".to_string());
				Ok(with_realm(|realm| {
					SimValue::from_object(realm.create_element(&tag))
				}))
			}),
		);
		method(
			&document_prototype,
			"getElementById",
			native_fn(|this, args| {
				let id = args.first().map(SimValue::to_display_string).unwrap_or_default();
				let document = this.as_object().ok_or_else(|| type_error("Illegal invocation"))?;
				let found = match document.own("body") {
					Some(SimValue::Object(body)) => find_by_id(&body, &id),
					_ => None,
				};
				Ok(found.map_or(SimValue::Null, SimValue::from_object))
			}),
		);

		let realm = Self {
			global,
			object_prototype,
			function_prototype,
			array_prototype,
			node_list_prototype,
			element_prototype,
			origin: Instant::now(),
		};

		let document = ObjectRef::new(Class::Plain, Some(document_prototype));
		document.put("body", SimValue::from_object(realm.create_element("body")));
		realm.global.put("document", SimValue::from_object(document));
		realm.global.put("NaN", SimValue::Number(f64::NAN));
		realm.global.put("Infinity", SimValue::Number(f64::INFINITY));
		let global = realm.global.clone();
		realm.global.put("window", SimValue::from_object(global.clone()));
		realm.global.put("globalThis", SimValue::from_object(global));
		realm
	}

	fn new_array(&self, items: Vec<SimValue>) -> SimValue {
		SimValue::from_object(ObjectRef::new(
			Class::Array(items),
			Some(self.array_prototype.clone()),
		))
	}

	fn create_element(&self, tag: &str) -> ObjectRef {
		let element = ObjectRef::new(Class::Plain, Some(self.element_prototype.clone()));
		let tag_name = tag.to_ascii_uppercase();
		let children = ObjectRef::new(
			Class::NodeList(Vec::new()),
			Some(self.node_list_prototype.clone()),
		);
		element.put("tagName", SimValue::String(tag_name.as_str().into()));
		element.put("nodeName", SimValue::String(tag_name.into()));
		element.put("id", SimValue::String("".into()));
		element.put("childNodes", SimValue::from_object(children));
		element.put("parentNode", SimValue::Null);
		element
	}
}

fn find_by_id(root: &ObjectRef, id: &str) -> Option<ObjectRef> {
	let children = match root.own("childNodes") {
		Some(SimValue::Object(list)) => {
			let data = list.0.borrow();
			match &data.class {
				Class::NodeList(items) => items.clone(),
				_ => Vec::new(),
			}
		}
		_ => Vec::new(),
	};
	for child in children.iter().filter_map(SimValue::as_object) {
		if matches!(child.own("id"), Some(SimValue::String(ref s)) if &**s == id) {
			return Some(child.clone());
		}
		if let Some(found) = find_by_id(child, id) {
			return Some(found);
		}
	}
	None
}

fn listener_args(
	this: &SimValue,
	args: &[SimValue],
	operation: &str,
) -> Result<(ObjectRef, Option<Listener>), Exception> {
	let target = this
		.as_object()
		.cloned()
		.ok_or_else(|| type_error(format!("{operation}: Illegal invocation")))?;
	let event_type = match args.first() {
		Some(value) => value.to_display_string(),
		None => {
			return Err(type_error(format!(
				"Failed to execute '{operation}': 2 arguments required"
			)));
		}
	};
	let callback = match args.get(1) {
		Some(SimValue::Object(object)) if object.is_function() => object.clone(),
		None | Some(SimValue::Undefined) | Some(SimValue::Null) => return Ok((target, None)),
		Some(_) => {
			return Err(type_error(format!(
				"Failed to execute '{operation}': parameter 2 is not of type 'Object'"
			)));
		}
	};
	let capture = match args.get(2) {
		Some(SimValue::Object(options)) => options.lookup("capture").truthy(),
		Some(other) => other.truthy(),
		None => false,
	};
	Ok((
		target,
		Some(Listener {
			event_type,
			callback,
			capture,
		}),
	))
}

fn event_this(this: &SimValue) -> Result<ObjectRef, Exception> {
	match this {
		SimValue::Object(object) if object.is_event() => Ok(object.clone()),
		_ => Err(type_error("Illegal invocation")),
	}
}

fn with_event_flags(this: &SimValue, f: impl FnOnce(&mut EventFlags)) -> Result<(), Exception> {
	let event = event_this(this)?;
	if let Class::Event(flags) = &mut event.0.borrow_mut().class {
		f(flags);
	}
	Ok(())
}

fn dispatch_event(this: &SimValue, event: Option<&SimValue>) -> Result<SimValue, Exception> {
	let target = this
		.as_object()
		.cloned()
		.ok_or_else(|| type_error("dispatchEvent: Illegal invocation"))?;
	let event_value = event
		.cloned()
		.ok_or_else(|| type_error("Failed to execute 'dispatchEvent': 1 argument required"))?;
	let event = match &event_value {
		SimValue::Object(object) if object.is_event() => object.clone(),
		_ => {
			return Err(type_error(
				"Failed to execute 'dispatchEvent': parameter 1 is not of type 'Event'",
			));
		}
	};

	if let Class::Event(flags) = &mut event.0.borrow_mut().class {
		*flags = EventFlags::default();
	}
	event.put("target", this.clone());
	event.put("currentTarget", this.clone());
	event.put("eventPhase", SimValue::Number(2.0));

	let event_type = event.lookup("type").to_display_string();
	let snapshot: Vec<Listener> = target
		.0
		.borrow()
		.listeners
		.iter()
		.filter(|l| l.event_type == event_type)
		.cloned()
		.collect();

	for listener in snapshot {
		let still_registered = target
			.0
			.borrow()
			.listeners
			.iter()
			.any(|l| l.same(&listener.event_type, &listener.callback, listener.capture));
		if !still_registered {
			continue;
		}
		let callback = SimValue::from_object(listener.callback.clone());
		if let Err(exception) = SimRuntime::apply(&callback, this, std::slice::from_ref(&event_value)) {
			crate::warn_log!("uncaught exception in '{}' listener: {}", event_type, exception);
		}
		let stopped = matches!(&event.0.borrow().class, Class::Event(flags) if flags.stop_immediate);
		if stopped {
			break;
		}
	}

	event.put("eventPhase", SimValue::Number(0.0));
	event.put("currentTarget", SimValue::Null);
	let canceled = event.lookup("cancelable").truthy() && event.lookup("defaultPrevented").truthy();
	Ok(SimValue::Bool(!canceled))
}

impl ForeignRuntime for SimRuntime {
	type Value = SimValue;
	type Function = SimFunction;

	fn undefined() -> SimValue {
		SimValue::Undefined
	}

	fn null() -> SimValue {
		SimValue::Null
	}

	fn global() -> SimValue {
		with_realm(|realm| SimValue::from_object(realm.global.clone()))
	}

	fn from_bool(value: bool) -> SimValue {
		SimValue::Bool(value)
	}

	fn from_f64(value: f64) -> SimValue {
		SimValue::Number(value)
	}

	fn from_str(value: &str) -> SimValue {
		SimValue::String(value.into())
	}

	fn type_of(value: &SimValue) -> Type {
		match value {
			SimValue::Undefined => Type::Undefined,
			SimValue::Null => Type::Null,
			SimValue::Bool(_) => Type::Boolean,
			SimValue::Number(_) => Type::Number,
			SimValue::String(_) => Type::String,
			SimValue::Symbol(_) => Type::Symbol,
			SimValue::Object(object) if object.is_function() => Type::Function,
			SimValue::Object(_) => Type::Object,
		}
	}

	fn is_undefined(value: &SimValue) -> bool {
		matches!(value, SimValue::Undefined)
	}

	fn is_null(value: &SimValue) -> bool {
		matches!(value, SimValue::Null)
	}

	fn is_nan(value: &SimValue) -> bool {
		matches!(value, SimValue::Number(n) if n.is_nan())
	}

	fn strict_equals(a: &SimValue, b: &SimValue) -> bool {
		match (a, b) {
			(SimValue::Undefined, SimValue::Undefined) | (SimValue::Null, SimValue::Null) => true,
			(SimValue::Bool(a), SimValue::Bool(b)) => a == b,
			(SimValue::Number(a), SimValue::Number(b)) => a == b,
			(SimValue::String(a), SimValue::String(b)) => a == b,
			(SimValue::Symbol(a), SimValue::Symbol(b)) => Rc::ptr_eq(a, b),
			(SimValue::Object(a), SimValue::Object(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	fn truthy(value: &SimValue) -> bool {
		value.truthy()
	}

	fn instance_of(value: &SimValue, constructor: &SimValue) -> Result<bool, Exception> {
		let constructor = match constructor {
			SimValue::Object(object) if object.is_function() => object,
			_ => return Err(type_error("Right-hand side of 'instanceof' is not callable")),
		};
		let SimValue::Object(prototype) = constructor.lookup("prototype") else {
			return Err(type_error(
				"Function has non-object prototype in instanceof check",
			));
		};
		let mut current = value.as_object().and_then(ObjectRef::prototype);
		while let Some(object) = current {
			if object.ptr_eq(&prototype) {
				return Ok(true);
			}
			current = object.prototype();
		}
		Ok(false)
	}

	fn get(target: &SimValue, name: &str) -> Result<SimValue, Exception> {
		match target {
			SimValue::Object(object) => Ok(object.lookup(name)),
			SimValue::Undefined | SimValue::Null => Err(type_error(format!(
				"Cannot read properties of {} (reading '{}')",
				target.to_display_string(),
				name
			))),
			SimValue::String(s) if name == "length" => {
				Ok(SimValue::Number(s.encode_utf16().count() as f64))
			}
			_ => Ok(SimValue::Undefined),
		}
	}

	fn set(target: &SimValue, name: &str, value: SimValue) -> Result<(), Exception> {
		match target {
			SimValue::Object(object) => {
				object.put(name, value);
				Ok(())
			}
			SimValue::Undefined | SimValue::Null => Err(type_error(format!(
				"Cannot set properties of {} (setting '{}')",
				target.to_display_string(),
				name
			))),
			_ => Ok(()),
		}
	}

	fn delete(target: &SimValue, name: &str) -> Result<(), Exception> {
		match target {
			SimValue::Object(object) => {
				object.remove(name);
				Ok(())
			}
			SimValue::Undefined | SimValue::Null => Err(type_error(format!(
				"Cannot convert {} to object",
				target.to_display_string()
			))),
			_ => Ok(()),
		}
	}

	fn get_index(target: &SimValue, index: u32) -> Result<SimValue, Exception> {
		Self::get(target, &index.to_string())
	}

	fn set_index(target: &SimValue, index: u32, value: SimValue) -> Result<(), Exception> {
		Self::set(target, &index.to_string(), value)
	}

	fn apply(function: &SimValue, this: &SimValue, args: &[SimValue]) -> Result<SimValue, Exception> {
		let SimValue::Object(object) = function else {
			return Err(type_error(format!("{:?} is not a function", function)));
		};
		let call = match &object.0.borrow().class {
			Class::Function(slot) => slot.call.clone(),
			_ => return Err(type_error(format!("{:?} is not a function", object))),
		};
		let call = call.ok_or_else(|| Exception::new("Error: call to released function"))?;
		call(this.clone(), args.to_vec())
	}

	fn construct(constructor: &SimValue, args: &[SimValue]) -> Result<SimValue, Exception> {
		let not_constructor = || type_error(format!("{:?} is not a constructor", constructor));
		let object = constructor.as_object().ok_or_else(not_constructor)?;
		let construct = match &object.0.borrow().class {
			Class::Function(slot) => slot.construct.clone(),
			_ => None,
		};
		let construct = construct.ok_or_else(not_constructor)?;
		let prototype = match object.lookup("prototype") {
			SimValue::Object(prototype) => prototype,
			_ => with_realm(|realm| realm.object_prototype.clone()),
		};
		let this = SimValue::from_object(ObjectRef::new(Class::Plain, Some(prototype)));
		match construct(this.clone(), args.to_vec())? {
			result @ SimValue::Object(_) => Ok(result),
			_ => Ok(this),
		}
	}

	fn as_f64(value: &SimValue) -> Option<f64> {
		match value {
			SimValue::Number(n) => Some(*n),
			_ => None,
		}
	}

	fn as_bool(value: &SimValue) -> Option<bool> {
		match value {
			SimValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	fn as_string(value: &SimValue) -> Option<String> {
		match value {
			SimValue::String(s) => Some(s.to_string()),
			_ => None,
		}
	}

	fn new_function(function: NativeFn<SimValue>) -> Result<(SimValue, SimFunction), Exception> {
		let object = with_realm(|realm| {
			ObjectRef::new(
				Class::Function(FunctionSlot {
					call: Some(function),
					construct: None,
				}),
				Some(realm.function_prototype.clone()),
			)
		});
		let handle = SimFunction {
			object: Rc::downgrade(&object.0),
		};
		Ok((SimValue::from_object(object), handle))
	}

	fn release_function(function: SimFunction) {
		if let Some(object) = function.object.upgrade()
			&& let Class::Function(slot) = &mut object.borrow_mut().class
		{
			slot.call = None;
		}
	}

	fn forget_function(function: SimFunction) {
		drop(function);
	}
}
