use super::tables::{get_table, ALL_TABLES};
use super::types::{ForeignKey, TableSchema};
use crate::error::{Result, SubsetError};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Resolves hard table dependencies for ordering and reporting
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
    /// Map of table name -> tables that depend on it
    reverse_deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let mut deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for table in ALL_TABLES {
            let table_deps = table.dependencies();
            deps.insert(table.name, table_deps.clone());

            for dep in table_deps {
                reverse_deps.entry(dep).or_default().insert(table.name);
            }
        }

        Self { deps, reverse_deps }
    }

    /// Order the given tables so that parents come before children
    pub fn order(&self, included: &[&str]) -> Result<Vec<&'static TableSchema>> {
        for name in included {
            if get_table(name).is_none() {
                return Err(SubsetError::UnknownTable(name.to_string()));
            }
        }

        let included: HashSet<&str> = included.iter().copied().collect();
        self.topological_sort(&included)
    }

    /// Tables that hard-reference the given table, sorted by name
    pub fn dependents(&self, name: &str) -> Vec<&'static str> {
        self.reverse_deps
            .get(name)
            .map(|set| set.iter().copied().collect::<BTreeSet<_>>().into_iter().collect())
            .unwrap_or_default()
    }

    /// Foreign keys of `schema` whose referenced table is present in `included`
    pub fn active_foreign_keys<'a>(
        &self,
        schema: &'a TableSchema,
        included: &HashSet<&str>,
    ) -> Vec<&'a ForeignKey> {
        schema
            .foreign_keys
            .iter()
            .filter(|fk| included.contains(fk.references_table))
            .collect()
    }

    /// Topological sort of tables by dependencies.
    /// Iterates in declaration order so the result is stable.
    fn topological_sort(&self, included: &HashSet<&str>) -> Result<Vec<&'static TableSchema>> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table in ALL_TABLES {
            if included.contains(table.name) && !visited.contains(table.name) {
                self.visit(
                    table.name,
                    included,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        included: &HashSet<&str>,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<()> {
        if temp_visited.contains(name) {
            return Err(SubsetError::CircularDependency(name.to_string()));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            for dep in deps {
                if *dep != name && included.contains(dep) {
                    self.visit(*dep, included, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        if let Some(table) = get_table(name) {
            result.push(table);
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}
