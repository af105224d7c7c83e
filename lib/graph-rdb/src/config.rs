use graph_rdb_common::error::GraphError;
use graph_rdb_common::{ReificationBehavior, TableDescriptor, TableKind};
use graph_rdb_driver::{DriverKind, DEFAULT_STATEMENT_CACHE_CAPACITY};
use graph_rdb_query::{QueryOptions, DEFAULT_PIPE_CAPACITY};

/// The table prefix used when none is configured.
pub const DEFAULT_TABLE_PREFIX: &str = "rdb";

/// Configuration of a [GraphRdb](crate::graph::GraphRdb).
///
/// ```
/// use graph_rdb::common::ReificationBehavior;
/// use graph_rdb::config::GraphConfig;
///
/// let config = GraphConfig::new()
///     .with_graph_id(7)
///     .with_reification_behavior(ReificationBehavior::HideOnlyFull);
/// assert_eq!(config.statement_table().name(), "rdb_stmt");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphConfig {
    driver: DriverKind,
    graph_id: i64,
    table_prefix: String,
    reification_behavior: ReificationBehavior,
    skip_duplicate_check: bool,
    statement_cache_capacity: usize,
    pipe_capacity: usize,
    query_options: Option<QueryOptions>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::default(),
            graph_id: 1,
            table_prefix: DEFAULT_TABLE_PREFIX.to_owned(),
            reification_behavior: ReificationBehavior::default(),
            skip_duplicate_check: false,
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            query_options: None,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the SQL dialect.
    #[must_use]
    pub fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = driver;
        self
    }

    /// Several graphs can share the same tables. Their rows are told apart by this id.
    #[must_use]
    pub fn with_graph_id(mut self, graph_id: i64) -> Self {
        self.graph_id = graph_id;
        self
    }

    /// The tables are named `<prefix>_stmt` and `<prefix>_reif`.
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_reification_behavior(mut self, behavior: ReificationBehavior) -> Self {
        self.reification_behavior = behavior;
        self
    }

    /// Stores asserted triples without checking whether they are already present.
    #[must_use]
    pub fn with_skip_duplicate_check(mut self, skip: bool) -> Self {
        self.skip_duplicate_check = skip;
        self
    }

    /// The number of prepared statements kept per connection. Zero disables the cache.
    #[must_use]
    pub fn with_statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// The number of bindings buffered between two query stages.
    #[must_use]
    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    /// Overrides the query options derived from the reification behavior.
    #[must_use]
    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.query_options = Some(options);
        self
    }

    pub fn driver(&self) -> DriverKind {
        self.driver
    }

    pub fn graph_id(&self) -> i64 {
        self.graph_id
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn reification_behavior(&self) -> ReificationBehavior {
        self.reification_behavior
    }

    pub fn skip_duplicate_check(&self) -> bool {
        self.skip_duplicate_check
    }

    pub fn statement_cache_capacity(&self) -> usize {
        self.statement_cache_capacity
    }

    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity
    }

    /// The configured query options, or the defaults of the reification behavior.
    pub fn query_options(&self) -> QueryOptions {
        self.query_options
            .unwrap_or_else(|| QueryOptions::for_behavior(self.reification_behavior))
    }

    pub fn statement_table(&self) -> TableDescriptor {
        TableDescriptor::new(
            format!("{}_stmt", self.table_prefix),
            TableKind::Statements,
            self.graph_id,
        )
    }

    pub fn reification_table(&self) -> TableDescriptor {
        TableDescriptor::new(
            format!("{}_reif", self.table_prefix),
            TableKind::Reifications,
            self.graph_id,
        )
    }

    /// Checks that the table prefix is a plain SQL identifier, as it is spliced into statements.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut chars = self.table_prefix.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(GraphError::InvalidConfig(format!(
                "the table prefix '{}' is not a valid SQL identifier",
                self.table_prefix
            )));
        }
        if self.pipe_capacity == 0 {
            return Err(GraphError::InvalidConfig(
                "the pipe capacity must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_options_follow_behavior() {
        let hidden = GraphConfig::new()
            .with_reification_behavior(ReificationBehavior::HideFullAndPartial);
        assert!(hidden.query_options().only_asserted);
        assert!(!GraphConfig::new().query_options().only_asserted);

        let explicit = hidden.with_query_options(QueryOptions::new().with_only_reified(true));
        assert!(!explicit.query_options().only_asserted);
        assert!(explicit.query_options().only_reified);
    }

    #[test]
    fn table_names_use_prefix() {
        let config = GraphConfig::new().with_table_prefix("kb").with_graph_id(3);

        assert_eq!(config.statement_table().name(), "kb_stmt");
        assert_eq!(config.reification_table().name(), "kb_reif");
        assert_eq!(config.reification_table().graph_id(), 3);
    }

    #[test]
    fn rejects_unsafe_prefix() {
        assert!(GraphConfig::new().validate().is_ok());
        assert!(GraphConfig::new()
            .with_table_prefix("x; DROP TABLE y")
            .validate()
            .is_err());
        assert!(GraphConfig::new().with_table_prefix("").validate().is_err());
        assert!(GraphConfig::new().with_pipe_capacity(0).validate().is_err());
    }
}
