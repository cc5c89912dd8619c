//! Install plan resolution.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use crate::error::{KilnError, Result};
use crate::options::BuildSelection;
use crate::recipe::{Recipe, RecipeCatalog, Scope};
use crate::requirements::{HostFacts, RequirementSpec, RequirementStatus};

use super::dependency::{DependencyLevel, DependencySpec};
use super::graph::DependencyGraph;

/// One recipe in an install plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub name: String,
    /// Strongest level any activating recipe declared.
    pub level: DependencyLevel,
    /// Variants requested by activating recipes.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub variants: BTreeSet<String>,
    /// Recipes that activated this entry.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub required_by: BTreeSet<String>,
    /// Whether this is the recipe being built.
    pub root: bool,
}

impl PlanEntry {
    fn root(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: DependencyLevel::Required,
            variants: BTreeSet::new(),
            required_by: BTreeSet::new(),
            root: true,
        }
    }

    fn dependency(spec: &DependencySpec) -> Self {
        Self {
            name: spec.name.clone(),
            level: spec.level,
            variants: BTreeSet::new(),
            required_by: BTreeSet::new(),
            root: false,
        }
    }

    fn merge(&mut self, spec: &DependencySpec, activated_by: &str) {
        if spec.level.strength() > self.level.strength() {
            self.level = spec.level;
        }
        if let Some(variant) = &spec.variant {
            self.variants.insert(variant.clone());
        }
        self.required_by.insert(activated_by.to_string());
    }
}

/// Ordered, deduplicated install plan. Dependencies come before the
/// recipes that activate them; the root recipe is last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    root: String,
    entries: Vec<PlanEntry>,
}

impl InstallPlan {
    /// Name of the recipe being built.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// All entries, root last.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Entries other than the root.
    pub fn dependencies(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| !e.root)
    }

    /// Entry names in plan order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Whether a recipe is in the plan.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves a recipe's active dependencies into an [`InstallPlan`].
///
/// Dependencies named in the catalog are expanded transitively using their
/// default options plus the requested variant; anything else is a leaf.
pub struct DependencyResolver<'c> {
    catalog: &'c RecipeCatalog,
}

impl<'c> DependencyResolver<'c> {
    pub fn new(catalog: &'c RecipeCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve the plan for `recipe` built with `selection`.
    ///
    /// Fails on the first unsatisfied requirement without producing a
    /// partial plan, and on any dependency cycle.
    pub fn resolve(
        &self,
        selection: &BuildSelection,
        recipe: &Recipe,
        host: &dyn HostFacts,
    ) -> Result<InstallPlan> {
        let catalog = self.catalog;
        let mut graph = DependencyGraph::builder();
        let mut entries: BTreeMap<String, PlanEntry> = BTreeMap::new();
        // Variant set each catalog recipe was last expanded with. Sets only
        // grow, so a recipe is expanded again only when a new variant arrives.
        let mut expanded: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut queue: VecDeque<(&Recipe, BuildSelection)> = VecDeque::new();
        queue.push_back((recipe, selection.clone()));

        while let Some((current, current_selection)) = queue.pop_front() {
            let scope = Scope::new(&current_selection, host);
            check_requirements(current.requirements(), &scope)?;

            let mut direct = Vec::new();
            for dep in current.dependencies() {
                if !dep.is_active(&scope) {
                    debug!("{}: dependency '{}' not active", current.name(), dep.name);
                    continue;
                }
                check_requirements(&dep.requirements, &scope)?;

                direct.push(dep.name.clone());
                let entry = entries
                    .entry(dep.name.clone())
                    .or_insert_with(|| PlanEntry::dependency(dep));
                entry.merge(dep, current.name());

                if dep.name == recipe.name() {
                    continue;
                }
                let requested = entry.variants.clone();
                if expanded.get(&dep.name) == Some(&requested) {
                    continue;
                }
                match catalog.get(&dep.name) {
                    Some(nested) => {
                        if expanded.contains_key(&dep.name) {
                            debug!("{}: expanding again for variants {:?}", dep.name, requested);
                        }
                        let nested_selection = variant_selection(nested, &requested)?;
                        queue.push_back((nested, nested_selection));
                    }
                    None => graph.insert(dep.name.clone(), Vec::new()),
                }
                expanded.insert(dep.name.clone(), requested);
            }
            graph.insert(current.name(), direct);
        }

        let order = graph.build()?.topological_order()?;
        let mut plan = Vec::with_capacity(order.len());
        for name in order {
            if name == recipe.name() {
                continue;
            }
            if let Some(entry) = entries.remove(&name) {
                plan.push(entry);
            }
        }
        plan.push(PlanEntry::root(recipe.name()));

        debug!(
            "plan for {}: {}",
            recipe.name(),
            plan.iter().map(|e| e.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        Ok(InstallPlan {
            root: recipe.name().to_string(),
            entries: plan,
        })
    }
}

/// Default selection of a nested recipe with every requested variant the
/// recipe declares switched on.
fn variant_selection(recipe: &Recipe, variants: &BTreeSet<String>) -> Result<BuildSelection> {
    let mut selection = recipe.default_selection()?;
    for variant in variants {
        if recipe.options().contains(variant) {
            selection = selection.with(variant, true);
        } else {
            debug!("{} has no variant '{}', using defaults", recipe.name(), variant);
        }
    }
    Ok(selection)
}

fn check_requirements(requirements: &[RequirementSpec], scope: &Scope<'_>) -> Result<()> {
    for requirement in requirements {
        if let RequirementStatus::Unsatisfied { message } = requirement.check(scope) {
            return Err(KilnError::UnsatisfiableRequirement {
                name: requirement.name.clone(),
                message,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionSpec;
    use crate::recipe::{Predicate, RecipeBuilder};
    use crate::requirements::{Arch, StaticHostFacts};
    use crate::assemble::ArgumentTemplate;

    fn recipe(name: &str) -> RecipeBuilder {
        RecipeBuilder::new(name).build_step(ArgumentTemplate::new("true"))
    }

    fn boost() -> Recipe {
        recipe("boost")
            .option(OptionSpec::flag("universal", "Build a universal binary"))
            .option(OptionSpec::flag("icu", "Build regexp engine with icu support"))
            .option(OptionSpec::flag("c++11", "Build using C++11 mode"))
            .depends_on(
                DependencySpec::recommended("python")
                    .requires(RequirementSpec::universal_tool("python").when(Predicate::enabled("universal"))),
            )
            .depends_on(
                DependencySpec::required("icu4c")
                    .variant("c++11")
                    .when(Predicate::enabled("icu").and(Predicate::enabled("c++11"))),
            )
            .depends_on(
                DependencySpec::required("icu4c")
                    .when(Predicate::enabled("icu").and(Predicate::disabled("c++11"))),
            )
            .depends_on(DependencySpec::optional("mpi"))
            .build()
            .unwrap()
    }

    fn resolve(recipe: &Recipe, args: &[&str], host: &StaticHostFacts) -> Result<InstallPlan> {
        let catalog = RecipeCatalog::new();
        let selection = recipe.options().resolve(args)?;
        DependencyResolver::new(&catalog).resolve(&selection, recipe, host)
    }

    #[test]
    fn defaults_plan_python_then_root() {
        let plan = resolve(&boost(), &[], &StaticHostFacts::new()).unwrap();
        assert_eq!(plan.names(), vec!["python", "boost"]);
        assert_eq!(plan.root(), "boost");
        assert!(plan.entries().last().unwrap().root);
    }

    #[test]
    fn declined_dependencies_are_omitted() {
        let plan = resolve(&boost(), &["--without-python"], &StaticHostFacts::new()).unwrap();
        assert_eq!(plan.names(), vec!["boost"]);
    }

    #[test]
    fn optional_dependency_joins_when_requested() {
        let plan = resolve(&boost(), &["--with-mpi"], &StaticHostFacts::new()).unwrap();
        assert_eq!(plan.names(), vec!["mpi", "python", "boost"]);
        assert_eq!(plan.get("mpi").unwrap().level, DependencyLevel::Optional);
    }

    #[test]
    fn variant_is_recorded() {
        let plan = resolve(&boost(), &["--with-icu", "--c++11"], &StaticHostFacts::new()).unwrap();
        let icu = plan.get("icu4c").unwrap();
        assert!(icu.variants.contains("c++11"));
        assert!(icu.required_by.contains("boost"));
    }

    #[test]
    fn unsatisfied_requirement_fails_fast() {
        let host = StaticHostFacts::new().with_tool("python", vec![Arch::X86_64]);
        let err = resolve(&boost(), &["--universal"], &host).unwrap_err();
        match err {
            KilnError::UnsatisfiableRequirement { name, message } => {
                assert_eq!(name, "universal-python");
                assert!(message.contains("not a universal build"));
            }
            other => panic!("expected UnsatisfiableRequirement, got {other:?}"),
        }
    }

    #[test]
    fn universal_without_python_resolves() {
        let host = StaticHostFacts::new().with_tool("python", vec![Arch::X86_64]);
        let plan = resolve(&boost(), &["--universal", "--without-python"], &host).unwrap();
        assert_eq!(plan.names(), vec!["boost"]);
    }

    #[test]
    fn transitive_dependencies_come_first() {
        let mut catalog = RecipeCatalog::new();
        catalog.insert(
            recipe("icu4c")
                .option(OptionSpec::flag("c++11", "Build using C++11 mode"))
                .depends_on(DependencySpec::required("pkg-config"))
                .build()
                .unwrap(),
        );
        let root = recipe("boost")
            .depends_on(DependencySpec::required("icu4c").variant("c++11"))
            .depends_on(DependencySpec::required("bzip2"))
            .build()
            .unwrap();

        let selection = root.default_selection().unwrap();
        let plan = DependencyResolver::new(&catalog)
            .resolve(&selection, &root, &StaticHostFacts::new())
            .unwrap();
        assert_eq!(plan.names(), vec!["bzip2", "pkg-config", "icu4c", "boost"]);
    }

    #[test]
    fn nested_requirements_see_variant() {
        let mut catalog = RecipeCatalog::new();
        catalog.insert(
            recipe("icu4c")
                .option(OptionSpec::flag("c++11", "Build using C++11 mode"))
                .requires(RequirementSpec::tool_present("clang").when(Predicate::enabled("c++11")))
                .build()
                .unwrap(),
        );
        let root = recipe("boost")
            .depends_on(DependencySpec::required("icu4c").variant("c++11"))
            .build()
            .unwrap();

        let selection = root.default_selection().unwrap();
        let err = DependencyResolver::new(&catalog)
            .resolve(&selection, &root, &StaticHostFacts::new())
            .unwrap_err();
        assert!(matches!(err, KilnError::UnsatisfiableRequirement { name, .. } if name == "clang"));
    }

    fn icu4c_with_cxx11_variant() -> Recipe {
        recipe("icu4c")
            .option(OptionSpec::flag("c++11", "Build using C++11 mode"))
            .requires(RequirementSpec::tool_present("clang").when(Predicate::enabled("c++11")))
            .depends_on(DependencySpec::required("libcxx").when(Predicate::enabled("c++11")))
            .build()
            .unwrap()
    }

    fn two_variant_requests() -> (RecipeCatalog, Recipe) {
        let mut catalog = RecipeCatalog::new();
        catalog.insert(icu4c_with_cxx11_variant());
        catalog.insert(
            recipe("harfbuzz")
                .depends_on(DependencySpec::required("icu4c").variant("c++11"))
                .build()
                .unwrap(),
        );
        let root = recipe("boost")
            .depends_on(DependencySpec::required("icu4c"))
            .depends_on(DependencySpec::required("harfbuzz"))
            .build()
            .unwrap();
        (catalog, root)
    }

    #[test]
    fn later_variant_request_checks_its_requirements() {
        let (catalog, root) = two_variant_requests();
        let selection = root.default_selection().unwrap();

        let err = DependencyResolver::new(&catalog)
            .resolve(&selection, &root, &StaticHostFacts::new())
            .unwrap_err();
        assert!(matches!(err, KilnError::UnsatisfiableRequirement { name, .. } if name == "clang"));
    }

    #[test]
    fn later_variant_request_adds_its_dependencies() {
        let (catalog, root) = two_variant_requests();
        let selection = root.default_selection().unwrap();
        let host = StaticHostFacts::new().with_tool("clang", vec![Arch::X86_64]);

        let plan = DependencyResolver::new(&catalog)
            .resolve(&selection, &root, &host)
            .unwrap();
        assert_eq!(plan.names(), vec!["libcxx", "icu4c", "harfbuzz", "boost"]);
        let icu = plan.get("icu4c").unwrap();
        assert_eq!(icu.variants, BTreeSet::from(["c++11".to_string()]));
        assert_eq!(icu.required_by.len(), 2);
    }

    #[test]
    fn duplicate_activation_is_deduplicated() {
        let mut catalog = RecipeCatalog::new();
        catalog.insert(
            recipe("icu4c")
                .depends_on(DependencySpec::required("zlib"))
                .build()
                .unwrap(),
        );
        let root = recipe("boost")
            .depends_on(DependencySpec::required("zlib"))
            .depends_on(DependencySpec::required("icu4c"))
            .build()
            .unwrap();

        let selection = root.default_selection().unwrap();
        let plan = DependencyResolver::new(&catalog)
            .resolve(&selection, &root, &StaticHostFacts::new())
            .unwrap();
        assert_eq!(plan.names(), vec!["zlib", "icu4c", "boost"]);
        let zlib = plan.get("zlib").unwrap();
        assert_eq!(zlib.required_by.len(), 2);
    }

    #[test]
    fn self_reference_is_cyclic() {
        let root = recipe("boost")
            .depends_on(DependencySpec::required("boost"))
            .build()
            .unwrap();
        let err = resolve(&root, &[], &StaticHostFacts::new()).unwrap_err();
        assert!(matches!(err, KilnError::CyclicDependency { cycle } if cycle == "boost -> boost"));
    }

    #[test]
    fn catalog_cycle_is_detected() {
        let mut catalog = RecipeCatalog::new();
        catalog.insert(
            recipe("a")
                .depends_on(DependencySpec::required("b"))
                .build()
                .unwrap(),
        );
        catalog.insert(
            recipe("b")
                .depends_on(DependencySpec::required("a"))
                .build()
                .unwrap(),
        );
        let root = recipe("root")
            .depends_on(DependencySpec::required("a"))
            .build()
            .unwrap();

        let selection = root.default_selection().unwrap();
        let err = DependencyResolver::new(&catalog)
            .resolve(&selection, &root, &StaticHostFacts::new())
            .unwrap_err();
        assert!(matches!(err, KilnError::CyclicDependency { .. }));
    }

    #[test]
    fn resolution_is_deterministic() {
        let recipe = boost();
        let first = resolve(&recipe, &["--with-mpi", "--with-icu"], &StaticHostFacts::new()).unwrap();
        for _ in 0..5 {
            let again = resolve(&recipe, &["--with-mpi", "--with-icu"], &StaticHostFacts::new()).unwrap();
            assert_eq!(again, first);
        }
    }
}
