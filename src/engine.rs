use crate::cache::shape_cache::{CacheStats, ShapeCache};
use crate::codegen::projector::{compile, Projector};
use crate::config::MapperConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{ProjectionError, ProjectionResult};
use crate::lookup::Lookup;
use crate::mapping::compat::{convert, needs_conversion};
use crate::mapping::matcher::{match_source, Flow, MatchOptions};
use crate::metadata::column::Column;
use crate::metadata::member::{Member, MemberDef, Projectable, TargetKind};
use crate::metadata::shape::Shape;
use crate::row::accessor::{RowAccessor, RowSchema};
use crate::row::batch::BatchRows;
use crate::value::Value;
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use std::hash::Hash;
use std::sync::Arc;

/// Main projection interface
///
/// Owns the projector cache and the diagnostics sink. Share one engine
/// (behind an `Arc` if needed) so every caller reuses the same compiled
/// projectors.
pub struct ProjectionEngine {
    config: MapperConfig,
    cache: ShapeCache,
    sink: Arc<dyn DiagnosticSink>,
}

impl ProjectionEngine {
    /// Create an engine with the default configuration, logging diagnostics through `tracing`
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        let sink = Arc::new(TracingSink::new(config.diagnostics.level));
        let cache = ShapeCache::new(config.cache.warn_after_shapes);
        tracing::debug!(
            column_prefix = config.matching.column_prefix.as_deref().unwrap_or(""),
            strip_type_name_prefix = config.matching.strip_type_name_prefix,
            "projection engine created"
        );
        Self { config, cache, sink }
    }

    /// Replace the diagnostics sink
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Projector for `T` over rows shaped like `schema`, built on first use.
    /// Uses the configured column prefix.
    pub fn get_or_build_projector<T: Projectable>(&self, schema: &dyn RowSchema) -> ProjectionResult<Projector<T>> {
        let prefix = self.config.matching.column_prefix.clone();
        self.get_or_build_projector_with_prefix(schema, prefix.as_deref())
    }

    /// Same as `get_or_build_projector` with an explicit column prefix
    /// (`None` disables prefix stripping for this call)
    pub fn get_or_build_projector_with_prefix<T: Projectable>(
        &self,
        schema: &dyn RowSchema,
        prefix: Option<&str>,
    ) -> ProjectionResult<Projector<T>> {
        let shape = Shape::from_schema::<T>(schema).with_prefix(prefix);
        self.cache.get_or_create_projector(&shape, || {
            let descriptor = T::descriptor();
            let options = self.match_options(descriptor.name(), shape.prefix(), Flow::ColumnToMember);
            compile::<T>(&shape, &options, self.sink.as_ref())
        })
    }

    /// Project one row
    pub fn project<T: Projectable, R: RowAccessor>(&self, row: &R) -> ProjectionResult<T> {
        self.get_or_build_projector::<T>(row)?.project(row)
    }

    /// Project every row; the shape comes from the first row
    pub fn project_all<T, R, I>(&self, rows: I) -> ProjectionResult<Vec<T>>
    where
        T: Projectable,
        R: RowAccessor,
        I: IntoIterator<Item = R>,
    {
        let mut rows = rows.into_iter();
        let first = match rows.next() {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        let projector = self.get_or_build_projector::<T>(&first)?;
        let mut out = Vec::with_capacity(rows.size_hint().0 + 1);
        out.push(projector.project(&first)?);
        for row in rows {
            out.push(projector.project(&row)?);
        }
        Ok(out)
    }

    /// Project every row of an Arrow batch, in parallel
    pub fn project_batch<T: Projectable>(&self, batch: &RecordBatch) -> ProjectionResult<Vec<T>> {
        let rows = BatchRows::try_new(batch)?;
        let projector = self.get_or_build_projector::<T>(&rows)?;

        (0..rows.num_rows())
            .into_par_iter()
            .map(|i| projector.project(&rows.row(i)))
            .collect()
    }

    /// Project every row and group the results by `key_of`, in first-seen key order
    pub fn group_by<T, K, R, I, F>(&self, rows: I, key_of: F) -> ProjectionResult<Lookup<K, T>>
    where
        T: Projectable,
        K: Eq + Hash,
        R: RowAccessor,
        I: IntoIterator<Item = R>,
        F: FnMut(&T) -> K,
    {
        let items = self.project_all::<T, R, I>(rows)?;
        Ok(Lookup::from_iter_keyed(items, key_of))
    }

    /// Build an outgoing parameter list from `value`.
    ///
    /// Each parameter takes the readable member that matches it, converted to
    /// the parameter's type. Parameters without a member are sent as null.
    /// Not cached: parameter lists are usually built once per statement.
    pub fn bind_parameters<T: Projectable>(&self, params: &[Column], value: &T) -> ProjectionResult<Vec<Value>> {
        let descriptor = T::descriptor();
        let defs: Vec<&MemberDef<T>> = match descriptor.kind() {
            TargetKind::Composite { members, .. } => members.iter().filter(|m| m.is_readable()).collect(),
            TargetKind::Scalar { .. } => {
                return Err(ProjectionError::config(format!(
                    "scalar type '{}' has no members to bind",
                    descriptor.name()
                )))
            }
        };
        let members: Vec<Member> = defs.iter().map(|d| d.member().clone()).collect();

        let prefix = self.config.matching.column_prefix.clone();
        let options = self.match_options(descriptor.name(), prefix.as_deref(), Flow::MemberToColumn);
        let plan = match_source(descriptor.name(), params, &members, &options, self.sink.as_ref());

        let mut out = vec![Value::Null; params.len()];
        for pair in plan.pairs() {
            let param = &params[pair.column];
            let value = defs[pair.member].read(value).unwrap_or(Value::Null);
            out[pair.column] = if needs_conversion(members[pair.member].type_tag, param.type_tag) {
                convert(value, param.type_tag)?
            } else {
                value
            };
        }
        Ok(out)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn match_options(&self, target: &str, column_prefix: Option<&str>, flow: Flow) -> MatchOptions {
        MatchOptions {
            column_prefix: column_prefix.map(str::to_string),
            member_prefix: self
                .config
                .matching
                .strip_type_name_prefix
                .then(|| short_type_name(target).to_string()),
            flow,
            report_unmapped_members: self.config.diagnostics.report_unmapped_members,
            report_unmapped_columns: self.config.diagnostics.report_unmapped_columns,
        }
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// `my_crate::orders::Order` → `Order`
fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::metadata::column::TypeTag;
    use crate::row::memory::MemoryRowSet;
    use std::sync::Mutex;

    crate::projectable! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Order {
            order_id: i32,
            name: String,
        }
    }

    fn orders() -> MemoryRowSet {
        MemoryRowSet::with_columns(&[("ID", TypeTag::INT32), ("Name", TypeTag::STRING)])
            .with_row(vec![Value::I32(1), Value::String("hello".to_string())])
            .unwrap()
            .with_row(vec![Value::I32(2), Value::String("world".to_string())])
            .unwrap()
    }

    #[test]
    fn test_type_name_prefix_maps_id_column() {
        let engine = ProjectionEngine::new();
        let set = orders();
        let order: Order = engine.project(&set.row(0).unwrap()).unwrap();
        assert_eq!(
            order,
            Order {
                order_id: 1,
                name: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_projector_is_reused() {
        let engine = ProjectionEngine::new();
        let set = orders();

        let all: Vec<Order> = engine.project_all(set.rows()).unwrap();
        assert_eq!(all.len(), 2);
        let again: Vec<Order> = engine.project_all(set.rows()).unwrap();
        assert_eq!(all, again);

        let stats = engine.cache_stats();
        assert_eq!(stats.shapes, 1);
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_prefix_disables_without_type_name_stripping() {
        let mut config = MapperConfig::default();
        config.matching.strip_type_name_prefix = false;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let engine = ProjectionEngine::with_config(config)
            .with_sink(Arc::new(move |d: &Diagnostic| log.lock().unwrap().push(d.name.clone())));

        let order: Order = engine.project(&orders().row(0).unwrap()).unwrap();
        assert_eq!(order.order_id, 0);
        assert_eq!(*seen.lock().unwrap(), vec!["order_id".to_string(), "ID".to_string()]);
    }

    #[test]
    fn test_group_by_keeps_first_seen_order() {
        let engine = ProjectionEngine::new();
        let mut set = MemoryRowSet::with_columns(&[("OrderId", TypeTag::INT32), ("Name", TypeTag::STRING)]);
        for (id, name) in [(1, "b"), (2, "a"), (3, "b")] {
            set.push_row(vec![Value::I32(id), Value::String(name.to_string())]).unwrap();
        }

        let groups = engine.group_by(set.rows(), |o: &Order| o.name.clone()).unwrap();
        let keys: Vec<&String> = groups.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(groups[&"b".to_string()].len(), 2);
    }

    #[test]
    fn test_bind_parameters() {
        let engine = ProjectionEngine::new();
        let params = vec![
            Column::new(0, "Name", TypeTag::STRING),
            Column::new(1, "Id", TypeTag::INT64),
            Column::new(2, "Extra", TypeTag::BOOL),
        ];
        let order = Order {
            order_id: 7,
            name: "x".to_string(),
        };

        let values = engine.bind_parameters(&params, &order).unwrap();
        assert_eq!(
            values,
            vec![Value::String("x".to_string()), Value::I64(7), Value::Null]
        );
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("app::model::Order"), "Order");
        assert_eq!(short_type_name("Order"), "Order");
        assert_eq!(short_type_name("core::option::Option<i32>"), "Option");
    }
}
