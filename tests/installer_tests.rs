mod common;

use std::path::Path;
use common::FakeToolchain;
use gotools::installer::{InstallOptions, Installer, STUB_FILE};
use gotools::manifest::{Manifest, Tool};
use gotools::workspace::MODULE_FILE;
use tempfile::{tempdir, TempDir};

fn options(root: &Path, update: bool) -> InstallOptions {
    InstallOptions {
        workspaces: root.to_path_buf(),
        update,
        copy_replace: true,
    }
}

fn tool(text: &str) -> Tool {
    Manifest::parse(text.lines()).tools.remove(0)
}

fn setup() -> (TempDir, Installer<FakeToolchain>) {
    let root = tempdir().unwrap();
    let installer = Installer::new(FakeToolchain::new(), options(root.path(), false));
    (root, installer)
}

#[test]
fn test_fresh_install_initializes_workspace() {
    let (root, installer) = setup();
    let tool = tool("example.com/cmd/a@v1.2.3\n  tags netgo");

    let installed = installer.install(&tool).unwrap();

    assert_eq!(installed.previous, "");
    assert_eq!(installed.version, "v1.0.0");
    let ws = root.path().join("example.com_cmd_a");
    assert!(ws.join(MODULE_FILE).exists());
    let stub = std::fs::read_to_string(ws.join(STUB_FILE)).unwrap();
    assert!(stub.contains("import _ \"example.com/cmd/a\""));
}

#[test]
fn test_reinstall_skips_initialization() {
    let root = tempdir().unwrap();
    let installer = Installer::new(FakeToolchain::new(), options(root.path(), false));
    let tool = tool("example.com/cmd/a");

    installer.install(&tool).unwrap();
    let first = installer_calls(&installer);
    assert_eq!(
        first,
        vec![
            "init",
            "fetch example.com/cmd/a@upgrade",
            "module_file example.com/cmd/a",
            "tidy",
            "install [] example.com/cmd/a",
            "version example.com/cmd/a",
        ]
    );

    let installed = installer.install(&tool).unwrap();
    assert_eq!(installed.previous, "v1.0.0");
    assert_eq!(
        installer_calls(&installer),
        vec![
            "version example.com/cmd/a",
            "install [] example.com/cmd/a",
            "version example.com/cmd/a",
        ]
    );
}

#[test]
fn test_update_mode_reinitializes() {
    let root = tempdir().unwrap();
    let tool = tool("example.com/cmd/a");
    Installer::new(FakeToolchain::new(), options(root.path(), false))
        .install(&tool)
        .unwrap();

    let fake = FakeToolchain::new();
    fake.set_version("example.com/cmd/a", "v1.1.0");
    let installer = Installer::new(fake, options(root.path(), true));
    let installed = installer.install(&tool).unwrap();

    assert!(installer_calls(&installer).contains(&"init".to_string()));
    assert_eq!(installed.version, "v1.1.0");
}

#[test]
fn test_unchanged_version_prints_plain_line() {
    colored::control::set_override(false);
    let root = tempdir().unwrap();
    let tool = tool("example.com/cmd/a");
    let fake = FakeToolchain::new();
    let installer = Installer::new(fake, options(root.path(), false));

    let first = installer.install(&tool).unwrap();
    assert_eq!(first.progress_line(&tool.name), "example.com/cmd/a v1.0.0");

    let fake = FakeToolchain::new();
    fake.set_version("example.com/cmd/a", "v1.0.0");
    let installer = Installer::new(fake, options(root.path(), true));
    // The old version is read before the update, the new one after.
    let unchanged = installer.install(&tool).unwrap();
    assert_eq!(unchanged.progress_line(&tool.name), "example.com/cmd/a v1.0.0");
}

#[test]
fn test_fetch_failure_leaves_workspace_for_retry() {
    let root = tempdir().unwrap();
    let tool = tool("example.com/broken");
    let installer = Installer::new(
        FakeToolchain::new().failing_fetch("example.com/broken"),
        options(root.path(), false),
    );

    let err = installer.install(&tool).unwrap_err();
    assert!(format!("{err:#}").contains("fetch of example.com/broken@upgrade failed"));

    let calls = installer_calls(&installer);
    assert!(!calls.iter().any(|c| c.starts_with("install")));
    let ws = root.path().join("example.com_broken");
    assert!(ws.join(STUB_FILE).exists());
    assert!(ws.join(MODULE_FILE).exists());
}

#[test]
fn test_stub_is_never_overwritten() {
    let root = tempdir().unwrap();
    let tool = tool("example.com/cmd/a");
    let ws = root.path().join("example.com_cmd_a");
    std::fs::create_dir_all(&ws).unwrap();
    std::fs::write(ws.join(STUB_FILE), "// edited by hand\n").unwrap();

    let installer = Installer::new(FakeToolchain::new(), options(root.path(), true));
    installer.install(&tool).unwrap();

    assert_eq!(std::fs::read_to_string(ws.join(STUB_FILE)).unwrap(), "// edited by hand\n");
}

#[test]
fn test_replace_directives_are_copied() {
    let root = tempdir().unwrap();
    let deps = tempdir().unwrap();
    let tool_mod = deps.path().join("go.mod");
    std::fs::write(
        &tool_mod,
        "module example.com/cmd/a\n\nreplace old.com/x => new.com/x v9.0.0\n\nreplace (\n\tlocal.com/y => ../y\n\tabs.com/z => /src/z\n)\n",
    )
    .unwrap();

    let fake = FakeToolchain::new().with_module_file("example.com/cmd/a", &tool_mod);
    let installer = Installer::new(fake, options(root.path(), false));
    installer.install(&tool("example.com/cmd/a")).unwrap();

    let replaces: Vec<String> = installer_calls(&installer)
        .into_iter()
        .filter(|c| c.starts_with("replace"))
        .collect();
    assert_eq!(replaces, vec!["replace old.com/x=new.com/x@v9.0.0", "replace abs.com/z=/src/z"]);
}

#[test]
fn test_replace_copy_can_be_disabled() {
    let root = tempdir().unwrap();
    let installer = Installer::new(
        FakeToolchain::new(),
        InstallOptions {
            workspaces: root.path().to_path_buf(),
            update: false,
            copy_replace: false,
        },
    );
    installer.install(&tool("example.com/cmd/a")).unwrap();
    assert!(!installer_calls(&installer).iter().any(|c| c.starts_with("module_file")));
}

#[test]
fn test_unparsable_module_file_fails_tool() {
    let root = tempdir().unwrap();
    let deps = tempdir().unwrap();
    let tool_mod = deps.path().join("go.mod");
    std::fs::write(&tool_mod, "module x\nreplace (\n\ta => b v1\n").unwrap();

    let installer = Installer::new(
        FakeToolchain::new().with_module_file("example.com/cmd/a", &tool_mod),
        options(root.path(), false),
    );
    let err = installer.install(&tool("example.com/cmd/a")).unwrap_err();
    assert!(format!("{err:#}").contains("could not parse"));
}

#[cfg(unix)]
#[test]
fn test_setup_commands_run_in_order_only_on_initialization() {
    let root = tempdir().unwrap();
    let tool = tool("example.com/cmd/a\n  run echo one >> setup.log\n  run echo two >> setup.log");
    let installer = Installer::new(FakeToolchain::new(), options(root.path(), false));

    installer.install(&tool).unwrap();
    installer.install(&tool).unwrap();

    let log = root.path().join("example.com_cmd_a").join("setup.log");
    assert_eq!(std::fs::read_to_string(log).unwrap(), "one\ntwo\n");
}

#[cfg(unix)]
#[test]
fn test_failing_setup_command_aborts_before_tidy() {
    let root = tempdir().unwrap();
    let tool = tool("example.com/cmd/a\n  run exit 7");
    let installer = Installer::new(FakeToolchain::new(), options(root.path(), false));

    let err = installer.install(&tool).unwrap_err();
    assert!(format!("{err:#}").contains("setup command failed: exit 7"));
    assert!(!installer_calls(&installer).contains(&"tidy".to_string()));
}

#[test]
fn test_tags_are_passed_to_install() {
    let root = tempdir().unwrap();
    let installer = Installer::new(FakeToolchain::new(), options(root.path(), false));
    installer.install(&tool("example.com/cmd/a\n  tags netgo osusergo")).unwrap();
    assert!(installer_calls(&installer).contains(&"install [netgo osusergo] example.com/cmd/a".to_string()));
}

fn installer_calls(installer: &Installer<FakeToolchain>) -> Vec<String> {
    installer.toolchain().take_calls()
}
