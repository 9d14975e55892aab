use crate::{AsValue, Result, Value};
use std::{
    any::{self, TypeId},
    collections::HashMap,
};

/// A struct that can be mapped to a table, usually through `#[derive(Record)]`.
///
/// The implementation describes the layout of the struct, the [`crate::Registry`] turns it into a
/// [`Model`] the first time the type is used.
pub trait Record: Send + Sync + 'static {
    fn shape() -> RecordShape;
}

/// Structural description of a record type.
#[derive(Debug)]
pub struct RecordShape {
    pub type_name: &'static str,
    /// Explicit table name, used as is.
    pub table_name: Option<&'static str>,
    pub fields: Vec<FieldShape>,
}

/// Structural description of one field: its name, its raw tag and how to reach it in memory.
#[derive(Debug)]
pub struct FieldShape {
    pub field_name: &'static str,
    pub tag: Option<&'static str>,
    pub(crate) slot: FieldSlot,
}

impl FieldShape {
    /// Describes a field of type `T` found `offset` bytes after the start of its record.
    ///
    /// # Safety
    /// `offset` must be the result of `core::mem::offset_of!` for a field of type `T` in the
    /// record whose [`Record::shape`] returns this value.
    pub unsafe fn new<T>(field_name: &'static str, tag: Option<&'static str>, offset: usize) -> Self
    where
        T: AsValue + Clone + Send + Sync + 'static,
    {
        Self {
            field_name,
            tag,
            slot: FieldSlot {
                type_id: TypeId::of::<T>(),
                type_name: any::type_name::<T>(),
                offset,
                read: read_slot::<T>,
                write: write_slot::<T>,
            },
        }
    }
}

pub(crate) type ReadSlot = unsafe fn(*const u8) -> Value;
pub(crate) type WriteSlot = unsafe fn(*mut u8, Value) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSlot {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) offset: usize,
    pub(crate) read: ReadSlot,
    pub(crate) write: WriteSlot,
}

unsafe fn read_slot<T: AsValue + Clone>(ptr: *const u8) -> Value {
    unsafe { (*ptr.cast::<T>()).clone().as_value() }
}

unsafe fn write_slot<T: AsValue>(ptr: *mut u8, value: Value) -> Result<()> {
    let value = T::try_from_value(value)?;
    unsafe {
        *ptr.cast::<T>() = value;
    }
    Ok(())
}

/// Resolved metadata of one field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub column_name: String,
    pub field_name: &'static str,
    pub(crate) slot: FieldSlot,
}

impl FieldInfo {
    pub fn type_id(&self) -> TypeId {
        self.slot.type_id
    }
    pub fn type_name(&self) -> &'static str {
        self.slot.type_name
    }
    /// Byte offset within instances of the owning record type.
    pub fn offset(&self) -> usize {
        self.slot.offset
    }
}

/// Cached schema of a record type. Immutable once built.
#[derive(Debug)]
pub struct Model {
    pub(crate) record: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) table_name: String,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) by_field: HashMap<&'static str, usize>,
    pub(crate) by_column: HashMap<String, usize>,
}

impl Model {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
    /// Name of the record type this model describes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
    pub fn record_type(&self) -> TypeId {
        self.record
    }
    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
    /// Lookup by the Rust field name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.by_field.get(name).map(|i| &self.fields[*i])
    }
    /// Lookup by the SQL column name.
    pub fn column(&self, name: &str) -> Option<&FieldInfo> {
        self.by_column.get(name).map(|i| &self.fields[*i])
    }
}
