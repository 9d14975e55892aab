use crate::{ErrorKind, FieldInfo, Model, Record, RecordShape, Result, snake_case};
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Cache of [`Model`] values keyed by record type.
///
/// Held by a database handle and shared with every builder created from it. Two tasks resolving
/// the same unseen type at once may both parse it; the first stored model is kept and parsing
/// has no side effects, so either result is equivalent.
#[derive(Debug, Default)]
pub struct Registry {
    models: RwLock<HashMap<TypeId, Arc<Model>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The model of `T`, parsed on first use.
    pub fn get<T: Record>(&self) -> Result<Arc<Model>> {
        let id = TypeId::of::<T>();
        if let Some(model) = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(model.clone());
        }
        let model = Arc::new(parse_model(id, T::shape())?);
        log::debug!(
            "Registered `{}` as table `{}`",
            model.type_name,
            model.table_name
        );
        Ok(self
            .models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert(model)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits `key=value[,key=value...]`.
pub fn parse_tags(field: &str, tag: &str) -> Result<HashMap<String, String>> {
    let mut result = HashMap::new();
    for pair in tag.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(ErrorKind::InvalidTags {
                field: field.into(),
                tag: tag.into(),
            }
            .into());
        };
        result.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(result)
}

fn parse_model(record: TypeId, shape: RecordShape) -> Result<Model> {
    if shape.fields.is_empty() {
        return Err(ErrorKind::InvalidModel(shape.type_name.into()).into());
    }
    let table_name = match shape.table_name {
        Some(name) => name.to_string(),
        None => snake_case(shape.type_name),
    };
    let mut fields = Vec::with_capacity(shape.fields.len());
    let mut by_field = HashMap::with_capacity(shape.fields.len());
    let mut by_column = HashMap::with_capacity(shape.fields.len());
    for (i, field) in shape.fields.into_iter().enumerate() {
        let mut column_name = String::new();
        if let Some(tag) = field.tag {
            let mut tags = parse_tags(field.field_name, tag)?;
            column_name = tags.remove("column").unwrap_or_default();
        }
        if column_name.is_empty() {
            column_name = snake_case(field.field_name);
        }
        if let Some(previous) = by_column.insert(column_name.clone(), i) {
            let previous: &FieldInfo = &fields[previous];
            log::warn!(
                "Fields `{}` and `{}` of `{}` both map to column `{}`, the latter wins",
                previous.field_name,
                field.field_name,
                shape.type_name,
                column_name,
            );
        }
        by_field.insert(field.field_name, i);
        fields.push(FieldInfo {
            column_name,
            field_name: field.field_name,
            slot: field.slot,
        });
    }
    Ok(Model {
        record,
        type_name: shape.type_name,
        table_name,
        fields,
        by_field,
        by_column,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Registry, parse_tags};
    use crate::{ErrorKind, FieldShape, Record, RecordShape};
    use std::{mem::offset_of, sync::Arc};

    #[derive(Debug, Default, Clone, PartialEq)]
    pub(crate) struct TestModel {
        pub(crate) id: i64,
        pub(crate) name: String,
        pub(crate) age: i32,
        pub(crate) address: Option<String>,
    }

    impl Record for TestModel {
        fn shape() -> RecordShape {
            RecordShape {
                type_name: "TestModel",
                table_name: None,
                fields: unsafe {
                    vec![
                        FieldShape::new::<i64>("ID", None, offset_of!(TestModel, id)),
                        FieldShape::new::<String>("Name", None, offset_of!(TestModel, name)),
                        FieldShape::new::<i32>("Age", None, offset_of!(TestModel, age)),
                        FieldShape::new::<Option<String>>(
                            "Address",
                            None,
                            offset_of!(TestModel, address),
                        ),
                    ]
                },
            }
        }
    }

    struct Tagged {
        _id: i64,
        _name: String,
        _age: i32,
    }

    impl Record for Tagged {
        fn shape() -> RecordShape {
            RecordShape {
                type_name: "Tagged",
                table_name: Some("my_custom_table"),
                fields: unsafe {
                    vec![
                        FieldShape::new::<i64>("Id", Some("column=id_t"), offset_of!(Tagged, _id)),
                        FieldShape::new::<String>("Name", None, offset_of!(Tagged, _name)),
                        FieldShape::new::<i32>("Age", Some(" column = age_t "), offset_of!(Tagged, _age)),
                    ]
                },
            }
        }
    }

    struct BadTag {
        _id: i64,
    }

    impl Record for BadTag {
        fn shape() -> RecordShape {
            RecordShape {
                type_name: "BadTag",
                table_name: None,
                fields: unsafe {
                    vec![FieldShape::new::<i64>("Id", Some("column"), offset_of!(BadTag, _id))]
                },
            }
        }
    }

    struct Empty;

    impl Record for Empty {
        fn shape() -> RecordShape {
            RecordShape {
                type_name: "Empty",
                table_name: None,
                fields: vec![],
            }
        }
    }

    struct Duplicated {
        _first: i64,
        _second: i64,
    }

    impl Record for Duplicated {
        fn shape() -> RecordShape {
            RecordShape {
                type_name: "Duplicated",
                table_name: None,
                fields: unsafe {
                    vec![
                        FieldShape::new::<i64>("First", Some("column=value"), offset_of!(Duplicated, _first)),
                        FieldShape::new::<i64>("Second", Some("column=value"), offset_of!(Duplicated, _second)),
                    ]
                },
            }
        }
    }

    #[test]
    fn default_names() {
        let registry = Registry::new();
        let model = registry.get::<TestModel>().unwrap();
        assert_eq!(model.table_name(), "test_model");
        let columns: Vec<_> = model.fields().iter().map(|f| f.column_name.as_str()).collect();
        assert_eq!(columns, ["id", "name", "age", "address"]);
        assert_eq!(model.field("Age").unwrap().column_name, "age");
        assert_eq!(model.column("address").unwrap().field_name, "Address");
        assert!(model.field("age").is_none());
    }

    #[test]
    fn tags_and_table_override() {
        let registry = Registry::new();
        let model = registry.get::<Tagged>().unwrap();
        assert_eq!(model.table_name(), "my_custom_table");
        assert_eq!(model.field("Id").unwrap().column_name, "id_t");
        assert_eq!(model.field("Name").unwrap().column_name, "name");
        assert_eq!(model.field("Age").unwrap().column_name, "age_t");
        assert_eq!(model.column("age_t").unwrap().type_name(), "i32");
    }

    #[test]
    fn cached_by_type() {
        let registry = Registry::new();
        let first = registry.get::<TestModel>().unwrap();
        let second = registry.get::<TestModel>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        registry.get::<Tagged>().unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn invalid_shapes() {
        let registry = Registry::new();
        let error = registry.get::<BadTag>().unwrap_err();
        assert_eq!(
            ErrorKind::of(&error),
            Some(&ErrorKind::InvalidTags {
                field: "Id".into(),
                tag: "column".into()
            })
        );
        let error = registry.get::<Empty>().unwrap_err();
        assert_eq!(
            ErrorKind::of(&error),
            Some(&ErrorKind::InvalidModel("Empty".into()))
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicated_columns_last_wins() {
        let registry = Registry::new();
        let model = registry.get::<Duplicated>().unwrap();
        assert_eq!(model.column("value").unwrap().field_name, "Second");
        assert_eq!(model.field("First").unwrap().column_name, "value");
    }

    #[test]
    fn tag_pairs() {
        let tags = parse_tags("F", "column=a,size=10").unwrap();
        assert_eq!(tags["column"], "a");
        assert_eq!(tags["size"], "10");
        assert!(parse_tags("F", "").is_err());
        assert!(parse_tags("F", "column=a,").is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolution() {
        let registry = Arc::new(Registry::new());
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get::<TestModel>().map(|m| m.table_name().to_string()) })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "test_model");
        }
        assert_eq!(registry.len(), 1);
    }
}
