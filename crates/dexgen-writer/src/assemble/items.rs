//! Data items collected from the class records, deduplicated by content.
//!
//! Items are referenced by their position in the interning sets; the layout
//! pass turns positions into file offsets.

use dexgen_core::leb128::write_uleb128;
use dexgen_format::NO_INDEX;
use indexmap::IndexSet;

use crate::annotation::AnnotationRecord;
use crate::class::ClassRecord;
use crate::code::{self, CodeItem, MethodShape};
use crate::config::WriterConfig;
use crate::error::WriteError;
use crate::field::FieldRecord;
use crate::pool::Resolver;
use crate::value::EncodedValue;

/// `annotations_directory_item` with its references as item positions.
#[derive(Clone, Debug, Default)]
pub(crate) struct Directory {
    pub class: Option<usize>,
    /// `(field index, annotation set)`, by field index.
    pub fields: Vec<(u32, usize)>,
    /// `(method index, annotation set)`, by method index.
    pub methods: Vec<(u32, usize)>,
    /// `(method index, annotation set ref list)`, by method index.
    pub params: Vec<(u32, usize)>,
}

impl Directory {
    pub fn size(&self) -> u32 {
        16 + 8 * (self.fields.len() + self.methods.len() + self.params.len()) as u32
    }
}

#[derive(Clone, Debug)]
pub(crate) struct EncodedMethod {
    pub index: u32,
    pub access: u32,
    pub code: Option<usize>,
}

/// Members of one class, each list sorted by index.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClassData {
    pub static_fields: Vec<(u32, u32)>,
    pub instance_fields: Vec<(u32, u32)>,
    pub direct_methods: Vec<EncodedMethod>,
    pub virtual_methods: Vec<EncodedMethod>,
}

impl ClassData {
    /// Encode with member indices as differences and code positions
    /// replaced by their offsets.
    pub fn encode(&self, code_offsets: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        for len in [
            self.static_fields.len(),
            self.instance_fields.len(),
            self.direct_methods.len(),
            self.virtual_methods.len(),
        ] {
            write_uleb128(&mut out, len as u32);
        }
        for fields in [&self.static_fields, &self.instance_fields] {
            let mut prev = 0;
            for &(index, access) in fields {
                write_uleb128(&mut out, index - prev);
                write_uleb128(&mut out, access);
                prev = index;
            }
        }
        for methods in [&self.direct_methods, &self.virtual_methods] {
            let mut prev = 0;
            for m in methods {
                write_uleb128(&mut out, m.index - prev);
                write_uleb128(&mut out, m.access);
                write_uleb128(&mut out, m.code.map_or(0, |c| code_offsets[c]));
                prev = m.index;
            }
        }
        out
    }
}

/// One `class_def_item` before offsets are known.
#[derive(Clone, Debug)]
pub(crate) struct ClassDef {
    pub class_idx: u32,
    pub access: u32,
    pub superclass: u32,
    pub interfaces: Option<usize>,
    pub source_file: u32,
    pub directory: Option<usize>,
    pub data: Option<ClassData>,
    pub static_values: Option<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct DataItems {
    pub type_lists: IndexSet<Vec<u32>>,
    /// Parameter list of each prototype, in final order.
    pub proto_params: Vec<Option<usize>>,
    pub annotations: IndexSet<Vec<u8>>,
    /// Annotation positions, sorted by annotation type.
    pub annotation_sets: IndexSet<Vec<usize>>,
    pub ref_lists: IndexSet<Vec<Option<usize>>>,
    pub directories: Vec<Directory>,
    pub arrays: IndexSet<Vec<u8>>,
    pub codes: Vec<CodeItem>,
    pub class_defs: Vec<ClassDef>,
}

struct Collector<'r, 'p> {
    resolver: &'r Resolver<'p>,
    config: &'r WriterConfig,
    items: DataItems,
}

/// Collect every data item, visiting classes in `order`.
pub(crate) fn collect(
    classes: &[ClassRecord],
    order: &[usize],
    resolver: &Resolver<'_>,
    config: &WriterConfig,
) -> Result<DataItems, WriteError> {
    let mut c = Collector {
        resolver,
        config,
        items: DataItems::default(),
    };

    for proto in resolver.proto_ids() {
        let params = c.type_list(proto.params);
        c.items.proto_params.push(params);
    }
    for &index in order {
        let def = c.class_def(&classes[index])?;
        c.items.class_defs.push(def);
    }
    Ok(c.items)
}

impl Collector<'_, '_> {
    fn type_list(&mut self, types: Vec<u32>) -> Option<usize> {
        if types.is_empty() {
            return None;
        }
        Some(self.items.type_lists.insert_full(types).0)
    }

    fn annotation_set(&mut self, records: &[AnnotationRecord]) -> Option<usize> {
        if records.is_empty() {
            return None;
        }
        let mut entries: Vec<(u32, usize)> = records
            .iter()
            .map(|r| {
                let ty = self.resolver.type_index(r.annotation.ty);
                let (item, _) = self.items.annotations.insert_full(r.to_bytes(self.resolver));
                (ty, item)
            })
            .collect();
        // one annotation per type; the writers reject a second one
        entries.sort_by_key(|(ty, _)| *ty);
        let set = entries.into_iter().map(|(_, item)| item).collect();
        Some(self.items.annotation_sets.insert_full(set).0)
    }

    fn class_def(&mut self, class: &ClassRecord) -> Result<ClassDef, WriteError> {
        let r = self.resolver;
        let interfaces = self.type_list(
            class
                .interfaces
                .iter()
                .map(|ty| r.type_index(*ty))
                .collect(),
        );

        let mut fields: Vec<(u32, &FieldRecord)> =
            class.fields.iter().map(|f| (r.field(f.field), f)).collect();
        fields.sort_by_key(|(index, _)| *index);
        let mut methods: Vec<(u32, usize)> = class
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| (r.method(m.method), i))
            .collect();
        methods.sort_by_key(|(index, _)| *index);

        let directory = self.directory(class, &fields, &methods);
        let static_values = self.static_values(&fields);

        let data = if class.has_members() {
            let mut data = ClassData::default();
            for (index, field) in &fields {
                let entry = (*index, field.access.bits());
                if field.access.is_static() {
                    data.static_fields.push(entry);
                } else {
                    data.instance_fields.push(entry);
                }
            }
            for &(index, i) in &methods {
                let method = &class.methods[i];
                let code = match &method.code {
                    Some(body) => {
                        let shape = MethodShape {
                            ins: method.ins,
                            params: method.params,
                            param_names: &method.param_names,
                            emit_debug_info: self.config.emit_debug_info(),
                        };
                        let item = code::compile(body, shape, r).map_err(|source| {
                            WriteError::Method {
                                class: class.name.clone(),
                                method: method.name.clone(),
                                source,
                            }
                        })?;
                        self.items.codes.push(item);
                        Some(self.items.codes.len() - 1)
                    }
                    None => None,
                };
                let entry = EncodedMethod {
                    index,
                    access: method.access.bits(),
                    code,
                };
                if method.access.is_direct_method(&method.name) {
                    data.direct_methods.push(entry);
                } else {
                    data.virtual_methods.push(entry);
                }
            }
            Some(data)
        } else {
            None
        };

        Ok(ClassDef {
            class_idx: r.type_index(class.ty),
            access: class.access.bits(),
            superclass: class.super_ty.map_or(NO_INDEX, |ty| r.type_index(ty)),
            interfaces,
            source_file: class.source_file.map_or(NO_INDEX, |s| r.string(s)),
            directory,
            data,
            static_values,
        })
    }

    fn directory(
        &mut self,
        class: &ClassRecord,
        fields: &[(u32, &FieldRecord)],
        methods: &[(u32, usize)],
    ) -> Option<usize> {
        let mut dir = Directory {
            class: self.annotation_set(&class.annotations),
            ..Directory::default()
        };
        for (index, field) in fields {
            if let Some(set) = self.annotation_set(&field.annotations) {
                dir.fields.push((*index, set));
            }
        }
        for &(index, i) in methods {
            let method = &class.methods[i];
            if let Some(set) = self.annotation_set(&method.annotations) {
                dir.methods.push((index, set));
            }
            if method.has_param_annotations() {
                let list: Vec<Option<usize>> = method
                    .param_annotations
                    .iter()
                    .map(|a| self.annotation_set(a))
                    .collect();
                let (list, _) = self.items.ref_lists.insert_full(list);
                dir.params.push((index, list));
            }
        }

        if dir.class.is_none()
            && dir.fields.is_empty()
            && dir.methods.is_empty()
            && dir.params.is_empty()
        {
            return None;
        }
        self.items.directories.push(dir);
        Some(self.items.directories.len() - 1)
    }

    /// Initial values of the static fields, up to the last one with a value.
    fn static_values(&mut self, fields: &[(u32, &FieldRecord)]) -> Option<usize> {
        let statics: Vec<&FieldRecord> = fields
            .iter()
            .map(|(_, f)| *f)
            .filter(|f| f.access.is_static())
            .collect();
        let last = statics.iter().rposition(|f| f.value.is_some())?;

        let mut bytes = Vec::new();
        write_uleb128(&mut bytes, (last + 1) as u32);
        for field in &statics[..=last] {
            match &field.value {
                Some(value) => value.encode(self.resolver, &mut bytes),
                None => EncodedValue::default_for(&field.desc).encode(self.resolver, &mut bytes),
            }
        }
        Some(self.items.arrays.insert_full(bytes).0)
    }
}
