//! Recipe file discovery and loading.
//!
//! A catalog is loaded from a single recipe file or from every `.yml` /
//! `.yaml` file in a directory (not recursive), in file name order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{KilnError, Result};
use crate::recipe::{Recipe, RecipeCatalog};

use super::schema::RecipeFile;

/// Parse recipe YAML. `path` is only used in error messages.
pub fn parse_recipe(content: &str, path: &Path) -> Result<Recipe> {
    let file: RecipeFile = serde_yaml::from_str(content).map_err(|e| KilnError::RecipeParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    file.into_recipe()
}

/// Load one recipe file.
pub fn load_recipe_file(path: &Path) -> Result<Recipe> {
    let content = fs::read_to_string(path)?;
    let recipe = parse_recipe(&content, path)?;
    tracing::debug!("loaded recipe '{}' from {}", recipe.name(), path.display());
    Ok(recipe)
}

/// Recipe files under `path`, sorted.
pub fn recipe_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        let is_yaml = entry_path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if is_yaml && entry_path.is_file() {
            paths.push(entry_path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load a catalog from a recipe file or directory.
///
/// A later file with an already-loaded name replaces the earlier recipe.
pub fn load_catalog(path: &Path) -> Result<RecipeCatalog> {
    let mut catalog = RecipeCatalog::new();
    for file in recipe_paths(path)? {
        let recipe = load_recipe_file(&file)?;
        if let Some(previous) = catalog.insert(recipe) {
            tracing::warn!(
                "recipe '{}' defined more than once; using {}",
                previous.name(),
                file.display()
            );
        }
    }
    tracing::debug!("catalog holds {} recipe(s)", catalog.len());
    Ok(catalog)
}

/// Look up a recipe by name.
pub fn find_recipe<'c>(catalog: &'c RecipeCatalog, name: &str) -> Result<&'c Recipe> {
    catalog.get(name).ok_or_else(|| KilnError::RecipeNotFound {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, name: &str) {
        fs::write(
            dir.join(file),
            format!("name: {}\nbuild:\n  program: make\n  args: [install]\n", name),
        )
        .unwrap();
    }

    #[test]
    fn loads_directory_in_name_order() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "boost.yml", "boost");
        write(temp.path(), "icu4c.yaml", "icu4c");
        fs::write(temp.path().join("README.md"), "not a recipe").unwrap();

        let catalog = load_catalog(temp.path()).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["boost", "icu4c"]);
    }

    #[test]
    fn loads_single_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "boost.yml", "boost");
        let catalog = load_catalog(&temp.path().join("boost.yml")).unwrap();
        assert!(catalog.contains("boost"));
    }

    #[test]
    fn parse_error_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yml");
        fs::write(&path, "name: [unterminated\n").unwrap();

        let err = load_catalog(temp.path()).unwrap_err();
        match err {
            KilnError::RecipeParse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected RecipeParse, got {other:?}"),
        }
    }

    #[test]
    fn missing_recipe_is_not_found() {
        let catalog = RecipeCatalog::new();
        let err = find_recipe(&catalog, "boost").unwrap_err();
        assert!(matches!(err, KilnError::RecipeNotFound { name } if name == "boost"));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err = load_catalog(Path::new("/nonexistent/kiln/recipes")).unwrap_err();
        assert!(matches!(err, KilnError::Io(_)));
    }
}
