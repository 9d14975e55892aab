use crate::{Destination, ErrorKind, FieldInfo, Model, Record, Result, RowCursor, Value};
use std::{
    any::{self, TypeId},
    marker::PhantomData,
};

fn check_binding<T: Record>(model: &Model) -> Result<()> {
    if model.record_type() != TypeId::of::<T>() {
        return Err(ErrorKind::InvalidArguments(format!(
            "`{}` cannot be accessed through the model of `{}`",
            any::type_name::<T>(),
            model.type_name()
        ))
        .into());
    }
    Ok(())
}

/// Read only view of a record through the offsets of its [`Model`].
#[derive(Debug, Clone, Copy)]
pub struct Accessor<'r> {
    model: &'r Model,
    base: *const u8,
    _entity: PhantomData<&'r ()>,
}

impl<'r> Accessor<'r> {
    /// Binds `entity` to `model`, the model must describe exactly `T`.
    pub fn new<T: Record>(model: &'r Model, entity: &'r T) -> Result<Self> {
        check_binding::<T>(model)?;
        Ok(Self {
            model,
            base: (entity as *const T).cast(),
            _entity: PhantomData,
        })
    }

    pub fn model(&self) -> &'r Model {
        self.model
    }

    /// Value of the field with the given Rust name.
    pub fn fetch(&self, field_name: &str) -> Result<Value> {
        let info = self
            .model
            .field(field_name)
            .ok_or_else(|| ErrorKind::UnknownField(field_name.into()))?;
        Ok(unsafe { read(self.base, info) })
    }

    /// Value of a field of the bound model, without any name lookup.
    pub fn fetch_field(&self, info: &FieldInfo) -> Result<Value> {
        if !self
            .model
            .fields()
            .as_ptr_range()
            .contains(&(info as *const FieldInfo))
        {
            return Err(ErrorKind::InvalidArguments(format!(
                "Field `{}` does not belong to the model of `{}`",
                info.field_name,
                self.model.type_name()
            ))
            .into());
        }
        Ok(unsafe { read(self.base, info) })
    }

    /// Every field in declaration order along with its value.
    pub fn fetch_all(&self) -> impl Iterator<Item = (&'r FieldInfo, Value)> + 'r {
        let base = self.base;
        self.model
            .fields()
            .iter()
            .map(move |info| (info, unsafe { read(base, info) }))
    }
}

// Behaves like `&'r T` and `&'r mut T`, records are `Send + Sync`.
unsafe impl Send for Accessor<'_> {}
unsafe impl Sync for Accessor<'_> {}
unsafe impl Send for AccessorMut<'_> {}

/// Read and write view of a record, used to materialize rows.
#[derive(Debug)]
pub struct AccessorMut<'r> {
    model: &'r Model,
    base: *mut u8,
    _entity: PhantomData<&'r mut ()>,
}

impl<'r> AccessorMut<'r> {
    pub fn new<T: Record>(model: &'r Model, entity: &'r mut T) -> Result<Self> {
        check_binding::<T>(model)?;
        Ok(Self {
            model,
            base: (entity as *mut T).cast(),
            _entity: PhantomData,
        })
    }

    pub fn fetch(&self, field_name: &str) -> Result<Value> {
        let info = self
            .model
            .field(field_name)
            .ok_or_else(|| ErrorKind::UnknownField(field_name.into()))?;
        Ok(unsafe { read(self.base, info) })
    }

    /// Decodes the current row of `cursor` into the bound record.
    ///
    /// Every column must map to a field, values are written in place at the field offsets.
    pub fn materialize(&mut self, cursor: &mut dyn RowCursor) -> Result<()> {
        let columns: Vec<String> = cursor.column_names().to_vec();
        let fields = columns
            .iter()
            .map(|column| {
                self.model
                    .column(column)
                    .ok_or_else(|| ErrorKind::UnknownColumn(column.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut destinations: Vec<Destination<'_>> = columns
            .iter()
            .zip(fields)
            .map(|(column, info)| unsafe {
                Destination::new(column, self.base.add(info.offset()), info.slot.write)
            })
            .collect();
        cursor.decode_into(&mut destinations).map_err(|e| {
            if matches!(ErrorKind::of(&e), Some(ErrorKind::ScanFailed { .. })) {
                e
            } else {
                ErrorKind::ScanFailed {
                    column: "*".into(),
                    reason: format!("{e:#}"),
                }
                .into()
            }
        })
    }
}

/// # Safety
/// `base` must point to a live instance of the record type `info` was resolved from.
unsafe fn read(base: *const u8, info: &FieldInfo) -> Value {
    unsafe { (info.slot.read)(base.add(info.offset())) }
}
