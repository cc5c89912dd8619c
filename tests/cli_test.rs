//! Integration tests for the kiln binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn demos() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos")
}

/// A host description: clang, and a python that is not universal.
fn host_facts(temp: &TempDir) -> PathBuf {
    let path = temp.path().join("host.yml");
    fs::write(
        &path,
        "os: linux\ndefault_compiler: clang\nprefix: /opt/kiln\nmake_jobs: 2\ntools:\n  python: [x86_64]\n",
    )
    .unwrap();
    path
}

fn kiln(temp: &TempDir) -> Command {
    kiln_with(temp, &demos())
}

fn kiln_with(temp: &TempDir, recipes: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("kiln"));
    cmd.arg("--recipes")
        .arg(recipes)
        .env("KILN_HOST_FACTS", host_facts(temp))
        .env_remove("KILN_PREFIX")
        .env_remove("KILN_OPT_ROOT")
        .env_remove("KILN_JOBS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("kiln"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("build recipes from source"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("kiln"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn info_lists_options_and_dependencies() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    kiln(&temp)
        .args(["info", "boost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("==> boost 1.54.0"))
        .stdout(predicate::str::contains(
            "  --without-single: Build single-threading variant",
        ))
        .stdout(predicate::str::contains("  --universal: Build a universal binary"))
        .stdout(predicate::str::contains("  python: recommended"));
    Ok(())
}

#[test]
fn plan_prints_assembled_commands() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    kiln(&temp)
        .args(["plan", "boost", "--without-static"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  install order: python, boost"))
        .stdout(predicate::str::contains(
            "  configure: ./bootstrap.sh --prefix=/opt/kiln --libdir=/opt/kiln/lib --without-icu",
        ))
        .stdout(predicate::str::contains("-j2 --layout=tagged"))
        .stdout(predicate::str::contains("link=shared\n"));
    Ok(())
}

#[test]
fn plan_json_is_machine_readable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = kiln(&temp)
        .args(["plan", "--json", "boost", "--without-python"])
        .output()?;
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(plan["recipe"], "boost");
    assert_eq!(plan["commands"]["build"]["program"], "./b2");
    assert_eq!(plan["environment"]["toolchain"]["compiler"], "clang");
    assert_eq!(plan["environment"]["exclusions"][0], "python");
    Ok(())
}

#[test]
fn prefix_flag_overrides_host_facts() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    kiln(&temp)
        .args(["plan", "--prefix", "/srv/boost", "boost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  prefix: /srv/boost"));
    Ok(())
}

#[test]
fn unknown_option_exits_with_options_code() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    kiln(&temp)
        .args(["plan", "boost", "--with-fortran"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown option '--with-fortran'"));
    Ok(())
}

#[test]
fn unsatisfied_requirement_exits_with_dependency_code() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    kiln(&temp)
        .args(["plan", "boost", "--universal"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("python is not a universal build"));
    Ok(())
}

#[test]
fn incompatible_combination_exits_with_code_4() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    kiln(&temp)
        .args(["plan", "boost", "--with-mpi", "--without-single", "--c++11"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Incompatible option combination"));
    Ok(())
}

#[test]
fn unknown_recipe_is_a_general_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    kiln(&temp)
        .args(["info", "ghostscript"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Recipe not found: ghostscript"));
    Ok(())
}

#[test]
fn schema_describes_recipe_files() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("kiln"));
    let output = cmd.arg("schema").output()?;
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(schema["title"], "RecipeFile");
    Ok(())
}

#[test]
fn completions_for_bash() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("kiln"));
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_kiln"));
    Ok(())
}

#[cfg(unix)]
mod build {
    use super::*;

    fn recipes(temp: &TempDir, build: &str) -> PathBuf {
        let dir = temp.path().join("recipes");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("hello.yml"),
            format!(
                "name: hello\nversion: \"2.10\"\noptions:\n  - key: nls\n    description: Native language support\nbuild:\n  program: env\n  prefix_flag: \"PREFIX={{prefix}}\"\n  libdir_flag: \"LIBDIR={{libdir}}\"\n  args:\n    - sh\n    - \"-c\"\n    - \"{}\"\n",
                build
            ),
        )
        .unwrap();
        dir
    }

    fn kiln_build(temp: &TempDir, build: &str) -> Command {
        let mut cmd = kiln_with(temp, &recipes(temp, build));
        cmd.args(["build", "-C"])
            .arg(temp.path());
        cmd
    }

    #[test]
    fn successful_build_runs_in_workdir() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        kiln_build(&temp, "echo $MAKEFLAGS > built")
            .arg("hello")
            .assert()
            .success()
            .stdout(predicate::str::contains("hello installed in"));

        assert_eq!(fs::read_to_string(temp.path().join("built"))?, "-j2\n");
        Ok(())
    }

    #[test]
    fn failing_step_exits_with_subprocess_code() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        kiln_build(&temp, "exit 7")
            .arg("hello")
            .assert()
            .code(5)
            .stderr(predicate::str::contains("build step failed with exit code Some(7)"));
        Ok(())
    }

    #[test]
    fn timeout_cancels_the_build() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        kiln_build(&temp, "sleep 30")
            .args(["--timeout", "1", "hello"])
            .timeout(std::time::Duration::from_secs(20))
            .assert()
            .code(6);
        Ok(())
    }

    #[test]
    fn flags_after_the_recipe_name_are_recipe_options() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        kiln_build(&temp, "true")
            .args(["hello", "--with-nls", "--jobs=3"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Unknown option '--jobs=3'"));
        Ok(())
    }
}
