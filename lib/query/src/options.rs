use graph_rdb_common::ReificationBehavior;

/// Restricts which specialized graphs answer a query and which planner shortcuts apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryOptions {
    /// Only asserted statements are queried. The reifier is not consulted.
    pub only_asserted: bool,
    /// Only reification fragments are queried.
    pub only_reified: bool,
    /// Reification patterns only match nodes that reify a complete statement. Patterns on the
    /// same node then share one table alias.
    pub only_full_reifications: bool,
    /// A query of a single pattern without constraints skips the planner.
    pub do_fast_path: bool,
    /// Patterns with the same constant subject are joined into one SQL statement even when they
    /// share no variable.
    pub do_implicit_join: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            only_asserted: false,
            only_reified: false,
            only_full_reifications: false,
            do_fast_path: true,
            do_implicit_join: true,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults for a graph with `behavior`: graphs hiding their reifications answer queries
    /// from asserted statements only.
    pub fn for_behavior(behavior: ReificationBehavior) -> Self {
        Self {
            only_asserted: !behavior.reifier_visible(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_only_asserted(mut self, only_asserted: bool) -> Self {
        self.only_asserted = only_asserted;
        self
    }

    #[must_use]
    pub fn with_only_reified(mut self, only_reified: bool) -> Self {
        self.only_reified = only_reified;
        self
    }

    #[must_use]
    pub fn with_only_full_reifications(mut self, only_full_reifications: bool) -> Self {
        self.only_full_reifications = only_full_reifications;
        self
    }

    #[must_use]
    pub fn with_fast_path(mut self, do_fast_path: bool) -> Self {
        self.do_fast_path = do_fast_path;
        self
    }

    #[must_use]
    pub fn with_implicit_join(mut self, do_implicit_join: bool) -> Self {
        self.do_implicit_join = do_implicit_join;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_are_enabled_by_default() {
        let options = QueryOptions::for_behavior(ReificationBehavior::HideFullAndPartial);

        assert!(options.only_asserted);
        assert!(options.do_fast_path);
        assert!(options.do_implicit_join);
        assert!(!options.with_implicit_join(false).do_implicit_join);
    }
}
