use syn::{Error, Fields, Ident, ItemStruct, LitStr, Result, Type, spanned::Spanned};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) tag: Option<String>,
}

pub(crate) struct RecordMetadata {
    pub(crate) table_name: Option<String>,
    pub(crate) fields: Vec<FieldMetadata>,
}

pub(crate) fn decode_record(item: &ItemStruct) -> Result<RecordMetadata> {
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Record cannot be derived for generic structs",
        ));
    }
    let Fields::Named(named) = &item.fields else {
        return Err(Error::new(
            item.ident.span(),
            "Record can only be derived for structs with named fields",
        ));
    };
    let mut table_name = None;
    for attr in item.attrs.iter().filter(|v| v.path().is_ident("sluice")) {
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("table_name") {
                table_name = Some(arg.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(arg.error(
                    "Unknown attribute, use it like: `#[sluice(table_name = \"my_table\")]`",
                ))
            }
        })?;
    }
    let fields = named
        .named
        .iter()
        .map(|field| {
            let ident = field
                .ident
                .clone()
                .ok_or_else(|| Error::new(field.span(), "Expected a named field"))?;
            let mut parts = Vec::new();
            for attr in field.attrs.iter().filter(|v| v.path().is_ident("sluice")) {
                attr.parse_nested_meta(|arg| {
                    if arg.path.is_ident("column") {
                        let value = arg.value()?.parse::<LitStr>()?;
                        let column = value.value();
                        if column.is_empty() || column.contains([',', '=']) {
                            return Err(Error::new(
                                value.span(),
                                "Column name must be non empty and cannot contain `,` or `=`",
                            ));
                        }
                        parts.push(format!("column={column}"));
                        Ok(())
                    } else if arg.path.is_ident("tag") {
                        parts.push(arg.value()?.parse::<LitStr>()?.value());
                        Ok(())
                    } else {
                        Err(arg.error(
                            "Unknown attribute, use it like: `#[sluice(column = \"my_column\")]` or `#[sluice(tag = \"key=value\")]`",
                        ))
                    }
                })?;
            }
            let name = ident.to_string();
            Ok(FieldMetadata {
                name: name.strip_prefix("r#").unwrap_or(&name).to_string(),
                ident,
                ty: field.ty.clone(),
                tag: (!parts.is_empty()).then(|| parts.join(",")),
            })
        })
        .collect::<Result<_>>()?;
    Ok(RecordMetadata { table_name, fields })
}

#[cfg(test)]
mod tests {
    use super::decode_record;
    use syn::{ItemStruct, parse_quote};

    #[test]
    fn tags_from_attributes() {
        let item: ItemStruct = parse_quote! {
            #[sluice(table_name = "people")]
            struct Person {
                #[sluice(column = "person_id")]
                id: i64,
                #[sluice(tag = "column=full_name", column = "name")]
                name: String,
                r#type: u8,
            }
        };
        let metadata = decode_record(&item).unwrap();
        assert_eq!(metadata.table_name.as_deref(), Some("people"));
        let tags: Vec<_> = metadata.fields.iter().map(|v| v.tag.as_deref()).collect();
        assert_eq!(
            tags,
            [
                Some("column=person_id"),
                Some("column=full_name,column=name"),
                None
            ]
        );
        assert_eq!(metadata.fields[2].name, "type");
    }

    #[test]
    fn column_cannot_break_the_tag() {
        for column in ["a,b", "a=b", ""] {
            let item: ItemStruct = parse_quote! {
                struct Person {
                    #[sluice(column = #column)]
                    id: i64,
                }
            };
            let error = decode_record(&item).err().unwrap();
            assert!(error.to_string().contains("cannot contain"));
        }
    }

    #[test]
    fn rejected_shapes() {
        let tuple: ItemStruct = parse_quote!(struct Pair(i32, i32););
        assert!(decode_record(&tuple).is_err());
        let generic: ItemStruct = parse_quote!(struct Wrap<T> { value: T });
        assert!(decode_record(&generic).is_err());
        let unknown: ItemStruct = parse_quote! {
            #[sluice(schema = "x")]
            struct Thing { id: i32 }
        };
        assert!(decode_record(&unknown).is_err());
    }
}
