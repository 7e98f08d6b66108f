//! Property descriptors.
//!
//! [`PropertyDescriptor`] is a complete description of an existing property
//! as returned by `get_own_property_descriptor`. [`PropertyDescriptorPatch`]
//! is the partial form accepted by `define_own_property`: absent fields keep
//! their current value, or take the ECMAScript default (`false` /
//! `undefined`) when the property is new.

use crate::attributes::Attributes;
use crate::error::{ObjectError, ObjectResult};
use core_types::{ObjectRef, Value};

/// The kind of property described by a [`PropertyDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// Data property
    Data {
        /// Stored value
        value: Value,
        /// Whether assignment may change the value
        writable: bool,
    },
    /// Accessor property
    Accessor {
        /// Getter function
        get: Option<ObjectRef>,
        /// Setter function
        set: Option<ObjectRef>,
    },
}

/// A complete property descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Visible to enumeration
    pub enumerable: bool,
    /// Deletable and reconfigurable
    pub configurable: bool,
    /// Data or accessor fields
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    /// A writable, enumerable, configurable data property.
    pub fn data(value: Value) -> Self {
        PropertyDescriptor {
            enumerable: true,
            configurable: true,
            kind: PropertyKind::Data {
                value,
                writable: true,
            },
        }
    }

    /// Returns true for accessor descriptors.
    pub fn is_accessor(&self) -> bool {
        matches!(self.kind, PropertyKind::Accessor { .. })
    }

    /// The data value, if this is a data descriptor.
    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            PropertyKind::Data { value, .. } => Some(value),
            PropertyKind::Accessor { .. } => None,
        }
    }

    /// Whether a data descriptor is writable. Accessors report false.
    pub fn writable(&self) -> bool {
        matches!(self.kind, PropertyKind::Data { writable: true, .. })
    }

    /// Attribute bits equivalent to this descriptor.
    pub fn attributes(&self) -> Attributes {
        let mut attributes = Attributes::empty();
        if !self.enumerable {
            attributes |= Attributes::NON_ENUMERABLE;
        }
        if !self.configurable {
            attributes |= Attributes::NON_CONFIGURABLE;
        }
        match &self.kind {
            PropertyKind::Data { writable, .. } => {
                if !writable {
                    attributes |= Attributes::READ_ONLY;
                }
            }
            PropertyKind::Accessor { get, set } => {
                attributes |= Attributes::accessor(get.is_some(), set.is_some());
            }
        }
        attributes
    }

    /// Builds a descriptor from table attributes and the slot's contents.
    pub(crate) fn from_parts(attributes: Attributes, kind: PropertyKind) -> Self {
        let kind = match kind {
            PropertyKind::Data { value, .. } => PropertyKind::Data {
                value,
                writable: !attributes.is_read_only(),
            },
            accessor => accessor,
        };
        PropertyDescriptor {
            enumerable: attributes.is_enumerable(),
            configurable: attributes.is_configurable(),
            kind,
        }
    }
}

/// A partial descriptor used by `define_own_property`.
///
/// `get` and `set` hold either `undefined` or a function object.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PropertyDescriptorPatch {
    /// Requested enumerability
    pub enumerable: Option<bool>,
    /// Requested configurability
    pub configurable: Option<bool>,
    /// Requested value
    pub value: Option<Value>,
    /// Requested writability
    pub writable: Option<bool>,
    /// Requested getter
    pub get: Option<Value>,
    /// Requested setter
    pub set: Option<Value>,
}

impl PropertyDescriptorPatch {
    /// Patch with only a value.
    pub fn with_value(value: Value) -> Self {
        PropertyDescriptorPatch {
            value: Some(value),
            ..Default::default()
        }
    }

    /// Patch describing a complete data property.
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptorPatch {
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            value: Some(value),
            writable: Some(writable),
            ..Default::default()
        }
    }

    /// Patch describing a complete accessor property.
    pub fn accessor(
        get: Option<ObjectRef>,
        set: Option<ObjectRef>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        PropertyDescriptorPatch {
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            get: Some(get.map(Value::Object).unwrap_or_default()),
            set: Some(set.map(Value::Object).unwrap_or_default()),
            ..Default::default()
        }
    }

    /// Returns true if no field is present.
    pub fn is_empty(&self) -> bool {
        *self == PropertyDescriptorPatch::default()
    }

    /// Returns true if `value` or `writable` is present.
    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// Returns true if `get` or `set` is present.
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// Returns true if neither data nor accessor fields are present.
    pub fn is_generic(&self) -> bool {
        !self.is_data() && !self.is_accessor()
    }

    /// Rejects patches mixing data and accessor fields, and accessor fields
    /// that are neither undefined nor an object.
    pub fn validate(&self) -> ObjectResult<()> {
        if self.is_data() && self.is_accessor() {
            return Err(ObjectError::type_error(
                "Invalid property.  A property cannot both have accessors and be writable or have a value",
            ));
        }
        for field in [&self.get, &self.set].into_iter().flatten() {
            if !field.is_undefined() && !field.is_object() {
                return Err(ObjectError::type_error("Accessor must be a function or undefined"));
            }
        }
        Ok(())
    }

    /// The getter requested by the patch: outer `None` if absent, inner
    /// `None` for undefined.
    pub(crate) fn getter(&self) -> Option<Option<ObjectRef>> {
        self.get.as_ref().map(Value::as_object)
    }

    /// The setter requested by the patch.
    pub(crate) fn setter(&self) -> Option<Option<ObjectRef>> {
        self.set.as_ref().map(Value::as_object)
    }

    /// Attributes for a new property: absent flags default to false.
    pub fn attributes(&self) -> Attributes {
        self.attributes_overriding(None)
    }

    /// Attributes for redefining a property: absent flags keep the value
    /// from `current`.
    pub fn attributes_overriding(&self, current: Option<&PropertyDescriptor>) -> Attributes {
        let mut attributes = Attributes::empty();
        let enumerable = self
            .enumerable
            .or(current.map(|c| c.enumerable))
            .unwrap_or(false);
        let configurable = self
            .configurable
            .or(current.map(|c| c.configurable))
            .unwrap_or(false);
        if !enumerable {
            attributes |= Attributes::NON_ENUMERABLE;
        }
        if !configurable {
            attributes |= Attributes::NON_CONFIGURABLE;
        }
        if !self.is_accessor() {
            let current_writable = current.and_then(|c| match c.kind {
                PropertyKind::Data { writable, .. } => Some(writable),
                PropertyKind::Accessor { .. } => None,
            });
            let writable = self.writable.or(current_writable).unwrap_or(false);
            if !writable {
                attributes |= Attributes::READ_ONLY;
            }
        }
        attributes
    }

    /// Returns true if every present flag matches `current`.
    pub(crate) fn attributes_equal(&self, current: &PropertyDescriptor) -> bool {
        if self.enumerable.is_some_and(|e| e != current.enumerable) {
            return false;
        }
        if self.configurable.is_some_and(|c| c != current.configurable) {
            return false;
        }
        if let Some(writable) = self.writable {
            if writable != current.writable() {
                return false;
            }
        }
        true
    }

    /// Returns true if applying this patch to `current` would change nothing.
    pub(crate) fn equal_to(&self, current: &PropertyDescriptor) -> bool {
        if !self.attributes_equal(current) {
            return false;
        }
        match &current.kind {
            PropertyKind::Data { value, .. } => {
                if self.is_accessor() {
                    return false;
                }
                self.value.as_ref().map_or(true, |v| v.same_value(value))
            }
            PropertyKind::Accessor { get, set } => {
                if self.is_data() {
                    return false;
                }
                self.getter().map_or(true, |g| g == *get)
                    && self.setter().map_or(true, |s| s == *set)
            }
        }
    }
}
