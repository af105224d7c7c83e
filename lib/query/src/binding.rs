use graph_rdb_model::{Term, Variable, VariableRef};
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Assigns every variable of a query a slot in the shared [Binding] array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableMap {
    variables: Vec<Variable>,
    slots: FxHashMap<Variable, usize>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot of `variable`, allocating a new one if it is unknown.
    pub fn insert(&mut self, variable: &Variable) -> usize {
        if let Some(index) = self.slots.get(variable) {
            return *index;
        }
        let index = self.variables.len();
        self.variables.push(variable.clone());
        self.slots.insert(variable.clone(), index);
        index
    }

    pub fn index_of(&self, variable: VariableRef<'_>) -> Option<usize> {
        self.slots.get(&variable.into_owned()).copied()
    }

    pub fn variable(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// The values bound to the slots of a [VariableMap]. Unbound slots hold `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding {
    values: Vec<Option<Term>>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a binding from `(variable, value)` pairs, registering the variables in `variables`.
    pub fn from_pairs<'a>(
        variables: &mut VariableMap,
        pairs: impl IntoIterator<Item = (&'a Variable, &'a Term)>,
    ) -> Self {
        let mut binding = Self::new();
        for (variable, value) in pairs {
            binding.set(variables.insert(variable), value.clone());
        }
        binding
    }

    pub fn get(&self, index: usize) -> Option<&Term> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn is_bound(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn set(&mut self, index: usize, value: Term) {
        if self.values.len() <= index {
            self.values.resize(index + 1, None);
        }
        self.values[index] = Some(value);
    }

    /// The slots that hold a value.
    pub fn bound_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.as_ref().map(|_| index))
    }
}

/// One row of a query result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySolution {
    variables: Arc<[Variable]>,
    binding: Binding,
}

impl QuerySolution {
    pub(crate) fn new(variables: Arc<[Variable]>, binding: Binding) -> Self {
        Self { variables, binding }
    }

    /// The value of the variable named `name`.
    pub fn get(&self, name: &str) -> Option<&Term> {
        let index = self.variables.iter().position(|v| v.as_str() == name)?;
        self.binding.get(index)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The bound `(variable, value)` pairs, in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.variables
            .iter()
            .enumerate()
            .filter_map(|(index, variable)| Some((variable, self.binding.get(index)?)))
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

impl Display for QuerySolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable}={value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rdb_model::NamedNode;

    #[test]
    fn variables_get_stable_slots() {
        let mut variables = VariableMap::new();
        let x = Variable::new_unchecked("x");
        let y = Variable::new_unchecked("y");

        assert_eq!(variables.insert(&x), 0);
        assert_eq!(variables.insert(&y), 1);
        assert_eq!(variables.insert(&x), 0);
        assert_eq!(variables.index_of(y.as_ref()), Some(1));
        assert_eq!(variables.len(), 2);
    }

    #[test]
    fn binding_grows_on_demand() {
        let mut binding = Binding::new();
        binding.set(3, NamedNode::new_unchecked("http://example.com/a").into());

        assert!(binding.is_bound(3));
        assert!(!binding.is_bound(0));
        assert!(!binding.is_bound(10));
        assert_eq!(binding.bound_slots().collect::<Vec<_>>(), vec![3]);
    }
}
