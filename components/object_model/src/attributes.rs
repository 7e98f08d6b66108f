//! Property attribute bits.

bitflags::bitflags! {
    /// Attributes recorded for each property table entry.
    ///
    /// The empty set is an ordinary writable, enumerable, configurable data
    /// property. An entry is an accessor exactly when `IS_GETTER` or
    /// `IS_SETTER` is present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        /// Value cannot be changed by assignment.
        const READ_ONLY = 1 << 0;
        /// Skipped by enumeration unless non-enumerable keys are requested.
        const NON_ENUMERABLE = 1 << 1;
        /// Cannot be deleted or reconfigured.
        const NON_CONFIGURABLE = 1 << 2;
        /// Accessor with a getter field.
        const IS_GETTER = 1 << 3;
        /// Accessor with a setter field.
        const IS_SETTER = 1 << 4;
    }
}

impl Attributes {
    /// Both accessor bits.
    pub const ACCESSOR: Attributes = Attributes::IS_GETTER.union(Attributes::IS_SETTER);

    /// Accessor kind bits for a pair with the given functions installed. A
    /// pair with neither function still counts as an accessor and gets both
    /// bits.
    pub fn accessor(has_getter: bool, has_setter: bool) -> Attributes {
        match (has_getter, has_setter) {
            (true, false) => Self::IS_GETTER,
            (false, true) => Self::IS_SETTER,
            _ => Self::ACCESSOR,
        }
    }

    /// Returns true for accessor entries.
    #[inline]
    pub fn is_accessor(self) -> bool {
        self.intersects(Self::ACCESSOR)
    }

    /// Returns true for read-only entries.
    #[inline]
    pub fn is_read_only(self) -> bool {
        self.contains(Self::READ_ONLY)
    }

    /// Returns true for enumerable entries.
    #[inline]
    pub fn is_enumerable(self) -> bool {
        !self.contains(Self::NON_ENUMERABLE)
    }

    /// Returns true for configurable entries.
    #[inline]
    pub fn is_configurable(self) -> bool {
        !self.contains(Self::NON_CONFIGURABLE)
    }

    /// The attribute bits that describe the property, without the accessor
    /// kind bits.
    #[inline]
    pub fn without_accessor(self) -> Attributes {
        self.difference(Self::ACCESSOR)
    }
}
