//! Document session: one schema document and the tree built over it.
//!
//! A [`DocumentSession`] owns the abstraction tree for one document of a
//! shared [`SchemaSet`] and drives the three directions of traffic:
//!
//! - schema → tree: [`DocumentSession::schema_changed`] and
//!   [`DocumentSession::sync`]
//! - tree → schema: [`DocumentSession::flush`]
//! - whole-document regeneration: [`DocumentSession::transform`]
//!
//! The schema set lock is held for the whole of each operation.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::axi::{AxiError, AxiModel, query};
use crate::base::ModelId;
use crate::generator::{
    GeneratorError, Pattern, SchemaUpdate, TransformConfig, TransformHint, can_transform_schema,
    generator_for, infer_design_pattern,
};
use crate::schema::SchemaSet;
use crate::sync::ModelState;

/// Session options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pattern of the configured generator; `None` uses the default one.
    pub pattern: Option<Pattern>,
    /// Re-sync on relevant schema changes.
    pub auto_sync: bool,
    /// Batch size for transforms; `None` swaps in one transaction.
    pub commit_range: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pattern: None,
            auto_sync: true,
            commit_range: None,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: Option<Pattern>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_auto_sync(mut self, auto_sync: bool) -> Self {
        self.auto_sync = auto_sync;
        self
    }

    pub fn with_commit_range(mut self, commit_range: Option<usize>) -> Self {
        self.commit_range = commit_range;
        self
    }
}

/// The tree over one schema document, plus the shared schema set.
pub struct DocumentSession {
    schemas: Arc<Mutex<SchemaSet>>,
    model: AxiModel,
    config: SessionConfig,
}

impl DocumentSession {
    // ── Construction ─────────────────────────────────────────────────

    /// Open a session over document `schema` of a shared set.
    pub fn new(schemas: Arc<Mutex<SchemaSet>>, schema: ModelId, config: SessionConfig) -> Result<Self, AxiError> {
        let model = {
            let set = schemas.lock();
            AxiModel::new(&set, schema)?
        };
        tracing::debug!("[SESSION] opened document {schema}");
        Ok(Self { schemas, model, config })
    }

    /// Open a session over a set the session will own.
    pub fn open(schemas: SchemaSet, schema: ModelId, config: SessionConfig) -> Result<Self, AxiError> {
        Self::new(Arc::new(Mutex::new(schemas)), schema, config)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn schemas(&self) -> Arc<Mutex<SchemaSet>> {
        Arc::clone(&self.schemas)
    }

    pub fn model(&self) -> &AxiModel {
        &self.model
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn schema_id(&self) -> ModelId {
        self.model.schema_id()
    }

    /// Run `f` against the tree with the schema set locked, for reads that
    /// populate children and for edits that resolve types.
    pub fn with_model<R>(&mut self, f: impl FnOnce(&mut AxiModel, &SchemaSet) -> R) -> R {
        let schemas = Arc::clone(&self.schemas);
        let set = schemas.lock();
        f(&mut self.model, &set)
    }

    // ── Schema → tree ────────────────────────────────────────────────

    /// Reconcile the tree with the current schema.
    pub fn sync(&mut self) -> ModelState {
        let schemas = Arc::clone(&self.schemas);
        let set = schemas.lock();
        let state = self.model.sync(&set);
        tracing::debug!("[SESSION] sync finished: {state:?}");
        state
    }

    /// Drain the document's schema changes. Returns the sync result when a
    /// relevant change triggered an automatic sync.
    pub fn schema_changed(&mut self) -> Option<ModelState> {
        let schemas = Arc::clone(&self.schemas);
        let mut set = schemas.lock();
        let document = set.get_mut(self.model.schema_id())?;
        let changes = document.take_changes();
        let relevant = changes.iter().filter(|c| query::is_relevant(document, c)).count();
        tracing::trace!("[SESSION] {} schema changes, {relevant} relevant", changes.len());
        if relevant == 0 || !self.config.auto_sync || !document.is_auto_sync() {
            return None;
        }
        Some(self.model.sync(&set))
    }

    // ── Tree → schema ────────────────────────────────────────────────

    /// Write pending tree edits into the schema document.
    pub fn flush(&mut self) -> Result<(), GeneratorError> {
        if !self.model.has_pending_changes() {
            return Ok(());
        }
        let schemas = Arc::clone(&self.schemas);
        let mut set = schemas.lock();
        let update = SchemaUpdate::from_changes(self.model.take_pending_changes());
        tracing::debug!("[SESSION] flushing {} update units", update.len());

        let schema = self.model.schema_id();
        let auto_sync = set.model(schema)?.is_auto_sync();
        set.model_mut(schema)?.set_auto_sync(false);
        let result = generator_for(self.config.pattern).update(&mut self.model, &mut set, update);
        let document = set.model_mut(schema)?;
        document.set_auto_sync(auto_sync);
        // Our own writes; the tree already reflects them.
        document.take_changes();
        result
    }

    /// Regenerate the document under `target`, flushing pending edits first.
    pub fn transform(&mut self, target: Pattern) -> Result<(), GeneratorError> {
        self.flush()?;
        let schemas = Arc::clone(&self.schemas);
        let mut set = schemas.lock();
        let config = TransformConfig::new().with_commit_range(self.config.commit_range);
        generator_for(Some(target)).transform(&mut self.model, &mut set, &config)?;
        set.model_mut(self.model.schema_id())?.take_changes();
        self.config.pattern = Some(target);
        tracing::debug!("[SESSION] transformed to {}", target.name());
        Ok(())
    }

    // ── Design patterns ──────────────────────────────────────────────

    pub fn infer_design_pattern(&mut self) -> Option<Pattern> {
        self.with_model(|model, set| infer_design_pattern(model, set))
    }

    /// Advice for transforming the document to `target`. The current pattern
    /// is the configured one, or the inferred one when none is configured.
    pub fn can_transform_schema(&mut self, target: Pattern) -> TransformHint {
        let configured = self.config.pattern;
        self.with_model(|model, set| {
            let current = configured.or_else(|| infer_design_pattern(model, set));
            can_transform_schema(model, set, current, target)
        })
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("schema", &self.model.schema_id())
            .field("nodes", &self.model.live_count())
            .field("config", &self.config)
            .finish()
    }
}
