use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_sphinx-autodoc-vyper")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

/// Write an executable stand-in for `sphinx-build` and wait until it can be
/// executed. A test thread that forks while the file is still open for
/// writing keeps a copy of that descriptor until its child execs, and exec
/// fails with ETXTBSY in the meantime.
#[cfg(unix)]
fn fake_sphinx_build(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-sphinx-build");
    let mut file = fs::File::create(&path).unwrap();
    write!(file, "#!/bin/sh\n[ -n \"$FAKE_SPHINX_DRY_RUN\" ] && exit 0\n{}\n", body).unwrap();
    file.sync_all().unwrap();
    drop(file);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    const ETXTBSY: i32 = 26;
    for _ in 0..100 {
        match Command::new(&path).env("FAKE_SPHINX_DRY_RUN", "1").status() {
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(std::time::Duration::from_millis(10))
            }
            _ => break,
        }
    }
    path
}

// -- source generation --

#[test]
fn no_build_writes_sources() {
    let out = TempDir::new().unwrap();

    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Documentation sources written to"));

    let docs = out.path().join("docs");
    assert!(docs.join("conf.py").is_file());
    assert!(docs.join("contracts/Vault.rst").is_file());
    assert!(!docs.join("_build").exists());

    let index = read(docs.join("index.rst"));
    assert!(index.contains("   contracts/Vault\n   contracts/tokens/ERC20\n"), "{}", index);
}

#[test]
fn erc20_page() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .assert()
        .success();

    let page = read(out.path().join("docs/contracts/tokens/ERC20.rst"));
    assert!(page.starts_with("ERC20\n=====\n\n.. py:module:: tokens.ERC20\n"));
    assert!(page.contains("**Title:** Sample ERC20\n"));
    assert!(page.contains(
        ".. py:function:: transfer(to: address, amount: uint256) -> bool\n\n   Transfer tokens to a specified address.\n"
    ));
    assert!(page.contains("   :param to: The recipient address\n   :type to: address\n"));
    assert!(page.contains("   :type amount: uint256\n"));
    assert!(page.contains("   :rtype: bool\n"));
    assert!(page.contains(".. py:function:: __init__(supply: uint256)\n"));
    assert!(page.contains("   :Constructor: yes\n"));
    assert!(page.contains("   .. py:attribute:: sender\n      :type: indexed(address)\n"));

    // three externally visible functions, in source order; _mint is internal
    assert_eq!(page.matches(".. py:function::").count(), 3);
    let init = page.find("__init__").unwrap();
    let transfer = page.find("transfer(").unwrap();
    let name = page.find("name()").unwrap();
    assert!(init < transfer && transfer < name);
    assert!(!page.contains("_mint"));
}

#[test]
fn vault_page_declarations() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .assert()
        .success();

    let page = read(out.path().join("docs/contracts/Vault.rst"));
    assert!(page.contains(".. py:class:: Deposit\n"));
    assert!(page.contains(".. py:class:: Roles\n\n   Flag: members can be combined.\n"));
    assert!(page.contains(".. py:data:: MAX_DEPOSITS\n   :type: uint256\n   :value: 16\n"));
    assert!(page.contains("Declared as ``public(immutable(address))``."));
    assert!(page.contains(".. py:data:: deposits\n   :type: DynArray[Deposit, MAX_DEPOSITS]\n"));
    assert!(page.contains(
        ".. py:function:: history(start: uint256 = 0) -> (uint256, DynArray[Deposit, MAX_DEPOSITS])\n"
    ));
    assert!(page.contains("   :Mutability: payable\n   :Nonreentrant: yes\n"));
}

#[test]
fn include_internal() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .arg("--include-internal")
        .assert()
        .success();

    let page = read(out.path().join("docs/contracts/tokens/ERC20.rst"));
    assert!(page.contains("Internal Functions\n------------------\n"));
    assert!(page.contains(".. py:function:: _mint(to: address, amount: uint256)\n"));
}

#[test]
fn exclude_pattern() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .args(["--exclude", "tokens/*"])
        .assert()
        .success();

    let docs = out.path().join("docs");
    assert!(docs.join("contracts/Vault.rst").is_file());
    assert!(!docs.join("contracts/tokens").exists());
    assert!(!read(docs.join("index.rst")).contains("ERC20"));
}

#[test]
fn project_metadata() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .args(["--project", "Vaults", "--author", "Ops", "--copyright", "2024, Ops"])
        .assert()
        .success();

    let docs = out.path().join("docs");
    let conf = read(docs.join("conf.py"));
    assert!(conf.contains("project = 'Vaults'\n"));
    assert!(conf.contains("author = 'Ops'\n"));
    assert!(conf.contains("copyright = '2024, Ops'\n"));
    assert!(read(docs.join("index.rst")).starts_with("Vaults Documentation\n"));
}

#[test]
fn second_run_is_identical() {
    let out = TempDir::new().unwrap();
    let run = || {
        cmd()
            .arg(fixture_path("contracts"))
            .arg("-o")
            .arg(out.path())
            .arg("--no-build")
            .assert()
            .success();
    };

    run();
    let first = read(out.path().join("docs/contracts/tokens/ERC20.rst"));
    let first_index = read(out.path().join("docs/index.rst"));
    run();
    assert_eq!(read(out.path().join("docs/contracts/tokens/ERC20.rst")), first);
    assert_eq!(read(out.path().join("docs/index.rst")), first_index);
}

// -- failures --

#[test]
fn missing_contracts_dir() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(out.path().join("nope"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid contracts dir"));
}

#[test]
fn invalid_contract_aborts() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("invalid"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.vy:3: unterminated docstring"));

    assert!(!out.path().join("docs").exists());
}

#[test]
fn skip_invalid_continues() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("invalid"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-build")
        .arg("--skip-invalid")
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping broken.vy"));

    let docs = out.path().join("docs");
    assert!(docs.join("contracts/ok.rst").is_file());
    assert!(!docs.join("contracts/broken.rst").exists());
}

#[test]
fn missing_builder() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .args(["--sphinx-build", "/nonexistent/sphinx-build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sphinx build failed"))
        .stderr(predicate::str::contains("not found"));
}

#[cfg(unix)]
#[test]
fn builder_failure_is_forwarded() {
    let out = TempDir::new().unwrap();
    let exe = fake_sphinx_build(out.path(), "echo 'Extension error: broken conf' >&2\nexit 1");

    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--sphinx-build")
        .arg(&exe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("exit code 1: Extension error: broken conf"));
}

#[cfg(unix)]
#[test]
fn builder_success() {
    let out = TempDir::new().unwrap();
    // -b html <src> <dst>
    let exe = fake_sphinx_build(out.path(), "mkdir -p \"$4\" && echo ok > \"$4/index.html\"");

    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--sphinx-build")
        .arg(&exe)
        .assert()
        .success()
        .stdout(predicate::str::contains("Documentation built successfully in"));

    assert!(out.path().join("docs/_build/html/index.html").is_file());
}

// -- serve --

#[test]
fn serve_on_busy_port_fails_fast() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let out = TempDir::new().unwrap();

    cmd()
        .arg(fixture_path("contracts"))
        .arg("-o")
        .arg(out.path())
        .arg("--serve")
        .args(["--port", &port.to_string()])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));

    // the port is checked before anything is written
    assert!(!out.path().join("docs").exists());
}
