//! Constant pool: deduplicated strings, types, prototypes and member references.
//!
//! Entries are addressed by handles (insertion indices) while the pool is
//! open. Closing sorts every category into the order the container format
//! requires and assigns final indices, which are read through a [`Resolver`].
//!
//! Categories close in dependency order: strings first, since types sort by
//! descriptor string index, then types, prototypes, fields and methods.

use std::cmp::Ordering;
use std::fmt;

use dexgen_core::descriptor::{validate_field_type, validate_type};
use dexgen_core::{MethodDescriptor, mutf8};
use dexgen_format::MemberRef;
use indexmap::IndexSet;

use crate::error::PoolError;

/// Largest entry count for categories addressed by 16-bit indices.
const MAX_U16_ENTRIES: usize = 1 << 16;

macro_rules! handles {
    ($($(#[$doc:meta])* $name:ident;)*) => {$(
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            fn idx(self) -> usize {
                self.0 as usize
            }
        }
    )*};
}

handles! {
    /// Handle of a string entry.
    StringId;
    /// Handle of a type descriptor entry.
    TypeId;
    /// Handle of a prototype entry.
    ProtoId;
    /// Handle of a field reference entry.
    FieldId;
    /// Handle of a method reference entry.
    MethodId;
}

/// Pool category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    String,
    Type,
    Proto,
    Field,
    Method,
}

impl PoolKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "strings",
            Self::Type => "types",
            Self::Proto => "prototypes",
            Self::Field => "fields",
            Self::Method => "methods",
        }
    }
}

/// Input to [`ConstantPool::resolve_or_insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolEntry<'a> {
    String(&'a str),
    /// Type descriptor.
    Type(&'a str),
    /// Method descriptor.
    Proto(&'a str),
    Field(MemberRef<'a>),
    Method(MemberRef<'a>),
}

/// Handle returned by [`ConstantPool::resolve_or_insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    String(StringId),
    Type(TypeId),
    Proto(ProtoId),
    Field(FieldId),
    Method(MethodId),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ProtoKey {
    shorty: StringId,
    ret: TypeId,
    params: Vec<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct FieldKey {
    owner: TypeId,
    name: StringId,
    ty: TypeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct MethodKey {
    owner: TypeId,
    name: StringId,
    proto: ProtoId,
}

/// Handle-to-final-index mapping of one category.
#[derive(Clone, Debug, Default)]
struct Order {
    final_of: Vec<u32>,
    handle_at: Vec<u32>,
}

impl Order {
    fn identity(len: usize) -> Self {
        let ids: Vec<u32> = (0..len as u32).collect();
        Self {
            final_of: ids.clone(),
            handle_at: ids,
        }
    }

    fn sorted_by_key<K: Ord>(keys: Vec<K>) -> Self {
        let mut handle_at: Vec<u32> = (0..keys.len() as u32).collect();
        handle_at.sort_by(|&a, &b| keys[a as usize].cmp(&keys[b as usize]));
        Self::from_handle_order(handle_at)
    }

    fn sorted_by(len: usize, mut cmp: impl FnMut(usize, usize) -> Ordering) -> Self {
        let mut handle_at: Vec<u32> = (0..len as u32).collect();
        handle_at.sort_by(|&a, &b| cmp(a as usize, b as usize));
        Self::from_handle_order(handle_at)
    }

    fn from_handle_order(handle_at: Vec<u32>) -> Self {
        let mut final_of = vec![0; handle_at.len()];
        for (pos, &handle) in handle_at.iter().enumerate() {
            final_of[handle as usize] = pos as u32;
        }
        Self {
            final_of,
            handle_at,
        }
    }

    #[inline]
    fn of(&self, handle: usize) -> u32 {
        self.final_of[handle]
    }
}

#[derive(Clone, Debug)]
struct Remap {
    strings: Order,
    types: Order,
    protos: Order,
    fields: Order,
    methods: Order,
}

/// Entry counts of an open pool at some point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Checkpoint([usize; 5]);

/// Deduplicating constant pool.
#[derive(Clone, Default)]
pub struct ConstantPool {
    strings: IndexSet<String>,
    types: IndexSet<StringId>,
    protos: IndexSet<ProtoKey>,
    fields: IndexSet<FieldKey>,
    methods: IndexSet<MethodKey>,
    /// Category sizes right after seeding; `None` unless seeded.
    seed: Option<[usize; 5]>,
    remap: Option<Remap>,
}

impl fmt::Debug for ConstantPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantPool")
            .field("strings", &self.strings.len())
            .field("types", &self.types.len())
            .field("protos", &self.protos.len())
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("seeded", &self.seed.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open pool holding every entry of the closed `source`, with handles
    /// equal to the source's final indices.
    ///
    /// Closing it skips sorting as long as nothing new was inserted.
    pub fn seeded(source: &ConstantPool) -> Result<Self, PoolError> {
        let src = source.resolver()?;
        let mut pool = Self::new();

        for s in src.strings() {
            pool.intern_string(s);
        }
        for desc in src.type_ids() {
            pool.types.insert(StringId(desc));
        }
        for proto in src.proto_ids() {
            pool.protos.insert(ProtoKey {
                shorty: StringId(proto.shorty),
                ret: TypeId(proto.ret),
                params: proto.params.into_iter().map(TypeId).collect(),
            });
        }
        for field in src.field_ids() {
            pool.fields.insert(FieldKey {
                owner: TypeId(field.owner),
                name: StringId(field.name),
                ty: TypeId(field.kind),
            });
        }
        for method in src.method_ids() {
            pool.methods.insert(MethodKey {
                owner: TypeId(method.owner),
                name: StringId(method.name),
                proto: ProtoId(method.kind),
            });
        }

        pool.seed = Some(pool.lens());
        Ok(pool)
    }

    pub fn is_closed(&self) -> bool {
        self.remap.is_some()
    }

    /// Whether the pool was seeded and nothing has been added since.
    pub fn is_presorted(&self) -> bool {
        self.seed == Some(self.lens())
    }

    pub fn len(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::String => self.strings.len(),
            PoolKind::Type => self.types.len(),
            PoolKind::Proto => self.protos.len(),
            PoolKind::Field => self.fields.len(),
            PoolKind::Method => self.methods.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lens().iter().all(|&n| n == 0)
    }

    fn lens(&self) -> [usize; 5] {
        [
            self.strings.len(),
            self.types.len(),
            self.protos.len(),
            self.fields.len(),
            self.methods.len(),
        ]
    }

    /// Current entry counts, to undo later inserts with [`Self::rollback`].
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.lens())
    }

    /// Drop every entry inserted after `checkpoint`.
    ///
    /// Handles issued after the checkpoint become dangling; callers discard
    /// whatever holds them.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        if self.is_closed() {
            return;
        }
        let [strings, types, protos, fields, methods] = checkpoint.0;
        self.strings.truncate(strings);
        self.types.truncate(types);
        self.protos.truncate(protos);
        self.fields.truncate(fields);
        self.methods.truncate(methods);
    }

    fn ensure_open(&self) -> Result<(), PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    /// Resolve an entry to its handle, inserting it (and everything it
    /// refers to) on first sight.
    pub fn resolve_or_insert(&mut self, entry: PoolEntry<'_>) -> Result<Handle, PoolError> {
        Ok(match entry {
            PoolEntry::String(s) => Handle::String(self.string(s)?),
            PoolEntry::Type(desc) => Handle::Type(self.type_ref(desc)?),
            PoolEntry::Proto(desc) => Handle::Proto(self.proto(desc)?),
            PoolEntry::Field(field) => Handle::Field(self.field(field)?),
            PoolEntry::Method(method) => Handle::Method(self.method(method)?),
        })
    }

    pub fn string(&mut self, s: &str) -> Result<StringId, PoolError> {
        self.ensure_open()?;
        Ok(self.intern_string(s))
    }

    /// Type descriptor; inserts the descriptor string.
    pub fn type_ref(&mut self, desc: &str) -> Result<TypeId, PoolError> {
        self.ensure_open()?;
        validate_type(desc)?;
        Ok(self.intern_type(desc))
    }

    /// Method prototype; inserts its shorty, return type and parameter types.
    pub fn proto(&mut self, desc: &str) -> Result<ProtoId, PoolError> {
        self.ensure_open()?;
        let parsed = MethodDescriptor::parse(desc)?;
        let shorty = self.intern_string(&parsed.shorty());
        let ret = self.intern_type(parsed.ret);
        let params = parsed.params.iter().map(|p| self.intern_type(p)).collect();
        let (idx, _) = self.protos.insert_full(ProtoKey {
            shorty,
            ret,
            params,
        });
        Ok(ProtoId(idx as u32))
    }

    /// Field reference; `field.desc` is the field type.
    pub fn field(&mut self, field: MemberRef<'_>) -> Result<FieldId, PoolError> {
        self.ensure_open()?;
        validate_field_type(field.owner)?;
        validate_field_type(field.desc)?;
        let key = FieldKey {
            owner: self.intern_type(field.owner),
            name: self.intern_string(field.name),
            ty: self.intern_type(field.desc),
        };
        let (idx, _) = self.fields.insert_full(key);
        Ok(FieldId(idx as u32))
    }

    /// Method reference; `method.desc` is the method descriptor.
    pub fn method(&mut self, method: MemberRef<'_>) -> Result<MethodId, PoolError> {
        self.ensure_open()?;
        validate_field_type(method.owner)?;
        let proto = self.proto(method.desc)?;
        let key = MethodKey {
            owner: self.intern_type(method.owner),
            name: self.intern_string(method.name),
            proto,
        };
        let (idx, _) = self.methods.insert_full(key);
        Ok(MethodId(idx as u32))
    }

    fn intern_string(&mut self, s: &str) -> StringId {
        if let Some(idx) = self.strings.get_index_of(s) {
            return StringId(idx as u32);
        }
        let (idx, _) = self.strings.insert_full(s.to_owned());
        StringId(idx as u32)
    }

    fn intern_type(&mut self, desc: &str) -> TypeId {
        let name = self.intern_string(desc);
        let (idx, _) = self.types.insert_full(name);
        TypeId(idx as u32)
    }

    /// String content by handle.
    pub fn string_value(&self, id: StringId) -> &str {
        &self.strings[id.idx()]
    }

    /// Descriptor by type handle.
    pub fn type_descriptor(&self, id: TypeId) -> &str {
        self.string_value(self.types[id.idx()])
    }

    /// `owner->name` of a field reference.
    pub fn field_label(&self, id: FieldId) -> String {
        let key = self.fields[id.idx()];
        let owner = self.type_descriptor(key.owner);
        format!("{owner}->{}", self.string_value(key.name))
    }

    /// `owner->name` of a method reference.
    pub fn method_label(&self, id: MethodId) -> String {
        let key = self.methods[id.idx()];
        let owner = self.type_descriptor(key.owner);
        format!("{owner}->{}", self.string_value(key.name))
    }

    /// Sort every category and freeze the pool.
    pub fn close(&mut self) -> Result<(), PoolError> {
        self.ensure_open()?;
        for kind in [
            PoolKind::Type,
            PoolKind::Proto,
            PoolKind::Field,
            PoolKind::Method,
        ] {
            let count = self.len(kind);
            if count > MAX_U16_ENTRIES {
                return Err(PoolError::TooMany {
                    kind: kind.name(),
                    count,
                });
            }
        }

        let presorted = self.is_presorted();
        let remap = if presorted {
            Remap {
                strings: Order::identity(self.strings.len()),
                types: Order::identity(self.types.len()),
                protos: Order::identity(self.protos.len()),
                fields: Order::identity(self.fields.len()),
                methods: Order::identity(self.methods.len()),
            }
        } else {
            self.sort()
        };

        tracing::debug!(
            strings = self.strings.len(),
            types = self.types.len(),
            protos = self.protos.len(),
            fields = self.fields.len(),
            methods = self.methods.len(),
            presorted,
            "constant pool closed"
        );
        self.remap = Some(remap);
        Ok(())
    }

    fn sort(&self) -> Remap {
        let strings = Order::sorted_by(self.strings.len(), |a, b| {
            mutf8::cmp_utf16(&self.strings[a], &self.strings[b])
        });
        let types = Order::sorted_by_key(
            self.types
                .iter()
                .map(|name| strings.of(name.idx()))
                .collect(),
        );
        let protos = Order::sorted_by_key(
            self.protos
                .iter()
                .map(|p| {
                    let params: Vec<u32> = p.params.iter().map(|t| types.of(t.idx())).collect();
                    (types.of(p.ret.idx()), params)
                })
                .collect(),
        );
        let fields = Order::sorted_by_key(
            self.fields
                .iter()
                .map(|f| {
                    (
                        types.of(f.owner.idx()),
                        strings.of(f.name.idx()),
                        types.of(f.ty.idx()),
                    )
                })
                .collect(),
        );
        let methods = Order::sorted_by_key(
            self.methods
                .iter()
                .map(|m| {
                    (
                        types.of(m.owner.idx()),
                        strings.of(m.name.idx()),
                        protos.of(m.proto.idx()),
                    )
                })
                .collect(),
        );

        Remap {
            strings,
            types,
            protos,
            fields,
            methods,
        }
    }

    /// Final-index view; fails until the pool is closed.
    pub fn resolver(&self) -> Result<Resolver<'_>, PoolError> {
        let remap = self.remap.as_ref().ok_or(PoolError::NotClosed)?;
        Ok(Resolver { pool: self, remap })
    }
}

/// One `proto_id_item` in final indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoIdItem {
    pub shorty: u32,
    pub ret: u32,
    pub params: Vec<u32>,
}

/// One `field_id_item` or `method_id_item` in final indices. `kind` is the
/// field type index or the method prototype index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberIdItem {
    pub owner: u32,
    pub kind: u32,
    pub name: u32,
}

/// Read-only view of a closed pool in final index order.
#[derive(Clone, Copy)]
pub struct Resolver<'p> {
    pool: &'p ConstantPool,
    remap: &'p Remap,
}

impl<'p> Resolver<'p> {
    pub fn string(&self, id: StringId) -> u32 {
        self.remap.strings.of(id.idx())
    }

    pub fn type_index(&self, id: TypeId) -> u32 {
        self.remap.types.of(id.idx())
    }

    pub fn proto(&self, id: ProtoId) -> u32 {
        self.remap.protos.of(id.idx())
    }

    pub fn field(&self, id: FieldId) -> u32 {
        self.remap.fields.of(id.idx())
    }

    pub fn method(&self, id: MethodId) -> u32 {
        self.remap.methods.of(id.idx())
    }

    pub fn len(&self, kind: PoolKind) -> usize {
        self.pool.len(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// String at final index `index`.
    pub fn string_at(&self, index: u32) -> &'p str {
        let handle = self.remap.strings.handle_at[index as usize];
        &self.pool.strings[handle as usize]
    }

    /// Descriptor of the type at final index `index`.
    pub fn type_at(&self, index: u32) -> &'p str {
        let handle = self.remap.types.handle_at[index as usize];
        self.pool.string_value(self.pool.types[handle as usize])
    }

    pub fn strings(&self) -> impl Iterator<Item = &'p str> + 'p {
        let pool = self.pool;
        self.remap
            .strings
            .handle_at
            .iter()
            .map(move |&h| pool.strings[h as usize].as_str())
    }

    /// Descriptor string index of every type, in final order.
    pub fn type_ids(&self) -> impl Iterator<Item = u32> + 'p {
        let (pool, remap) = (self.pool, self.remap);
        remap
            .types
            .handle_at
            .iter()
            .map(move |&h| remap.strings.of(pool.types[h as usize].idx()))
    }

    pub fn proto_ids(&self) -> impl Iterator<Item = ProtoIdItem> + 'p {
        let (pool, remap) = (self.pool, self.remap);
        remap.protos.handle_at.iter().map(move |&h| {
            let p = &pool.protos[h as usize];
            ProtoIdItem {
                shorty: remap.strings.of(p.shorty.idx()),
                ret: remap.types.of(p.ret.idx()),
                params: p.params.iter().map(|t| remap.types.of(t.idx())).collect(),
            }
        })
    }

    pub fn field_ids(&self) -> impl Iterator<Item = MemberIdItem> + 'p {
        let (pool, remap) = (self.pool, self.remap);
        remap.fields.handle_at.iter().map(move |&h| {
            let f = &pool.fields[h as usize];
            MemberIdItem {
                owner: remap.types.of(f.owner.idx()),
                kind: remap.types.of(f.ty.idx()),
                name: remap.strings.of(f.name.idx()),
            }
        })
    }

    pub fn method_ids(&self) -> impl Iterator<Item = MemberIdItem> + 'p {
        let (pool, remap) = (self.pool, self.remap);
        remap.methods.handle_at.iter().map(move |&h| {
            let m = &pool.methods[h as usize];
            MemberIdItem {
                owner: remap.types.of(m.owner.idx()),
                kind: remap.protos.of(m.proto.idx()),
                name: remap.strings.of(m.name.idx()),
            }
        })
    }
}
