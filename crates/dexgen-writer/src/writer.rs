//! Application writer: the root visitor and owner of a build.

use std::fmt;
use std::sync::Arc;

use dexgen_core::AccessFlags;
use dexgen_format::ApplicationVisitor;

use crate::annotation;
use crate::assemble;
use crate::class::{ClassRecord, ClassWriter};
use crate::config::WriterConfig;
use crate::error::{PoolError, WriteError};
use crate::pool::{Checkpoint, ConstantPool};

/// A closed constant pool that a new build can start from.
///
/// Seeding from a reader copies its pool in final index order. While the new
/// build adds no entries, closing keeps that order and the produced container
/// lays out its pool sections exactly as the source did.
pub trait SourceReader {
    fn constant_pool(&self) -> &ConstantPool;
}

impl SourceReader for ConstantPool {
    fn constant_pool(&self) -> &ConstantPool {
        self
    }
}

/// Mutable state shared by the writers of one build.
#[derive(Debug)]
pub(crate) struct BuildState {
    pub pool: ConstantPool,
    pub config: WriterConfig,
    pub classes: Vec<ClassRecord>,
    deferred: Option<WriteError>,
    /// Class writer handed out and not yet committed.
    open_class: Option<OpenClass>,
}

/// What to restore when a class writer is dropped without `visit_end`.
#[derive(Debug, Clone, Copy)]
struct OpenClass {
    checkpoint: Checkpoint,
    had_error: bool,
}

impl BuildState {
    fn new(pool: ConstantPool, config: WriterConfig) -> Self {
        Self {
            pool,
            config,
            classes: Vec::new(),
            deferred: None,
            open_class: None,
        }
    }

    fn begin_class(&mut self, checkpoint: Checkpoint) {
        self.open_class = Some(OpenClass {
            checkpoint,
            had_error: self.deferred.is_some(),
        });
    }

    /// Mark the open class as committed.
    pub fn commit_class(&mut self, record: ClassRecord) {
        self.open_class = None;
        self.classes.push(record);
    }

    /// Undo a class writer that was dropped without `visit_end`: its pool
    /// entries and any error it deferred.
    fn settle(&mut self) {
        let Some(open) = self.open_class.take() else {
            return;
        };
        tracing::trace!("uncommitted class discarded");
        self.pool.rollback(open.checkpoint);
        if !open.had_error {
            self.deferred = None;
        }
    }

    /// Keep the first error raised inside a member visitor.
    pub fn defer(&mut self, error: WriteError) {
        if self.deferred.is_none() {
            self.deferred = Some(error);
        }
    }

    /// Run a pool operation, deferring its error.
    pub fn attempt<T>(
        &mut self,
        op: impl FnOnce(&mut ConstantPool) -> Result<T, PoolError>,
    ) -> Option<T> {
        match op(&mut self.pool) {
            Ok(value) => Some(value),
            Err(error) => {
                self.defer(error.into());
                None
            }
        }
    }
}

/// Builds one container from visitor calls.
///
/// Classes are accumulated until [`visit_end`](ApplicationVisitor::visit_end),
/// which closes the constant pool and assembles the bytes. After that the
/// writer is frozen.
pub struct ApplicationWriter {
    state: BuildState,
    source: Option<Arc<dyn SourceReader>>,
    closed: bool,
    output: Option<Vec<u8>>,
}

impl Default for ApplicationWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApplicationWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationWriter")
            .field("classes", &self.state.classes.len())
            .field("pool", &self.state.pool)
            .field("reuse", &self.source.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl ApplicationWriter {
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            state: BuildState::new(ConstantPool::new(), config),
            source: None,
            closed: false,
            output: None,
        }
    }

    /// Reuse mode: start from the closed pool of `source`.
    pub fn with_source(
        source: Arc<dyn SourceReader>,
        config: WriterConfig,
    ) -> Result<Self, WriteError> {
        let pool = ConstantPool::seeded(source.constant_pool()).map_err(|e| match e {
            PoolError::NotClosed => WriteError::SourceNotClosed,
            other => WriteError::Pool(other),
        })?;
        Ok(Self {
            state: BuildState::new(pool, config),
            source: Some(source),
            closed: false,
            output: None,
        })
    }

    /// The finished container, once `visit_end` succeeded.
    pub fn to_byte_array(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        self.output
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.state.pool
    }

    /// Direct pool access, e.g. to pre-register entries. Inserts fail once
    /// the writer is closed.
    pub fn constant_pool_mut(&mut self) -> &mut ConstantPool {
        self.state.settle();
        &mut self.state.pool
    }

    pub fn source_reader(&self) -> Option<&Arc<dyn SourceReader>> {
        self.source.as_ref()
    }

    pub fn config(&self) -> &WriterConfig {
        &self.state.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ApplicationVisitor for ApplicationWriter {
    type Error = WriteError;
    type Class<'a>
        = ClassWriter<'a>
    where
        Self: 'a;

    fn visit_class(
        &mut self,
        access: AccessFlags,
        name: &str,
        signature: Option<&str>,
        super_name: Option<&str>,
        interfaces: &[&str],
    ) -> Result<Option<ClassWriter<'_>>, WriteError> {
        if self.closed {
            return Err(WriteError::AlreadyClosed);
        }
        self.state.settle();
        let checkpoint = self.state.pool.checkpoint();
        let record = match self.class_record(access, name, signature, super_name, interfaces) {
            Ok(record) => record,
            Err(error) => {
                self.state.pool.rollback(checkpoint);
                return Err(error);
            }
        };
        self.state.begin_class(checkpoint);
        Ok(Some(ClassWriter::new(&mut self.state, record)))
    }

    fn visit_end(&mut self) -> Result<(), WriteError> {
        if self.closed {
            return Err(WriteError::AlreadyClosed);
        }
        self.state.settle();
        self.closed = true;
        if let Some(error) = self.state.deferred.take() {
            return Err(error);
        }

        self.state.pool.close()?;
        let resolver = self.state.pool.resolver()?;
        let bytes = assemble::assemble(&self.state.classes, &resolver, &self.state.config)?;
        tracing::debug!(
            classes = self.state.classes.len(),
            size = bytes.len(),
            reuse = self.source.is_some(),
            "container written"
        );
        self.output = Some(bytes);
        Ok(())
    }
}

impl ApplicationWriter {
    fn class_record(
        &mut self,
        access: AccessFlags,
        name: &str,
        signature: Option<&str>,
        super_name: Option<&str>,
        interfaces: &[&str],
    ) -> Result<ClassRecord, WriteError> {
        let pool = &mut self.state.pool;
        let ty = pool.type_ref(name)?;
        if self.state.classes.iter().any(|c| c.ty == ty) {
            return Err(WriteError::DuplicateClass(name.to_owned()));
        }
        let super_ty = super_name.map(|s| pool.type_ref(s)).transpose()?;
        let interfaces = interfaces
            .iter()
            .map(|i| pool.type_ref(i))
            .collect::<Result<Vec<_>, _>>()?;
        let annotations = match signature {
            Some(sig) => vec![annotation::signature(pool, sig)?],
            None => Vec::new(),
        };

        Ok(ClassRecord {
            name: name.to_owned(),
            ty,
            access,
            super_ty,
            interfaces,
            source_file: None,
            annotations,
            fields: Vec::new(),
            methods: Vec::new(),
        })
    }
}
