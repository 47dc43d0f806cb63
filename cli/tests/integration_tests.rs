use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "merge_openapi_cli_test_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write(&self, name: &str, body: &str) {
        fs::write(self.join(name), body).expect("failed to write input");
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn merge_openapi(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_merge-openapi"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run merge-openapi")
}

fn read_yaml(path: &PathBuf) -> serde_yaml::Value {
    let raw = fs::read_to_string(path).expect("output should exist");
    serde_yaml::from_str(&raw).expect("output should be valid YAML")
}

const SERVICE_A: &str = r##"
openapi: 3.1.0
info: {title: A, version: "1.0"}
tags:
  - {name: items, description: Items of A}
paths:
  /items:
    get:
      operationId: listAItems
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Widget"}
components:
  schemas:
    Widget:
      type: object
      properties:
        id: {type: integer}
"##;

const SERVICE_B: &str = r##"
openapi: 3.1.0
info: {title: B, version: "1.0"}
tags:
  - {name: items, description: Items of B}
paths:
  /items:
    get:
      operationId: listBItems
      responses:
        "200": {description: ok}
components:
  schemas:
    Widget:
      type: object
      properties:
        id: {type: string}
"##;

const DANGLING: &str = r##"
paths:
  /broken:
    get:
      responses:
        "200": {$ref: "#/components/responses/Nowhere"}
"##;

// ---------------------------------------------------------------------------
// Successful merges
// ---------------------------------------------------------------------------

#[test]
fn merge_writes_prefixed_paths_and_aliases() {
    let input = TempDir::new("merge_ok_in");
    let output = TempDir::new("merge_ok_out");
    input.write("serviceA.yml", SERVICE_A);
    input.write("serviceB.yaml", SERVICE_B);
    let out_file = output.join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
    ]);
    assert!(
        result.status.success(),
        "merge failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let doc = read_yaml(&out_file);
    assert_eq!(doc["info"]["title"].as_str(), Some("Mock Server API"));
    assert_eq!(doc["info"]["version"].as_str(), Some("1.0.0"));
    assert!(doc["paths"]["/serviceA/items"].is_mapping());
    assert!(doc["paths"]["/serviceB/items"].is_mapping());
    assert_eq!(
        doc["components"]["schemas"]["Widget"]["properties"]["id"]["type"].as_str(),
        Some("integer")
    );
    assert_eq!(
        doc["components"]["schemas"]["serviceB_Widget"]["properties"]["id"]["type"].as_str(),
        Some("string")
    );
    assert_eq!(doc["tags"].as_sequence().map(Vec::len), Some(2));

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Merged 2 service document(s)"), "{stdout}");
}

#[test]
fn merge_of_empty_directory_succeeds() {
    let input = TempDir::new("empty_in");
    let output = TempDir::new("empty_out");
    let out_file = output.join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
    ]);
    assert!(result.status.success());

    let doc = read_yaml(&out_file);
    assert_eq!(doc["paths"].as_mapping().map(|m| m.len()), Some(0));
    assert!(doc["components"]["requestBodies"].is_mapping());
}

#[test]
fn json_output_selected_by_extension() {
    let input = TempDir::new("json_in");
    let output = TempDir::new("json_out");
    input.write("serviceA.yml", SERVICE_A);
    let out_file = output.join("unified.json");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
    ]);
    assert!(result.status.success());

    let raw = fs::read_to_string(&out_file).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("output should be JSON");
    assert_eq!(parsed["openapi"], "3.1.0");
    assert!(parsed["paths"]["/serviceA/items"].is_object());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let input = TempDir::new("idem_in");
    let output = TempDir::new("idem_out");
    input.write("serviceA.yml", SERVICE_A);
    input.write("serviceB.yml", SERVICE_B);
    let first = output.join("first.yml");
    let second = output.join("second.yml");

    for out in [&first, &second] {
        let result = merge_openapi(&[
            "--input-directory",
            input.path().to_str().unwrap(),
            "--output-file",
            out.to_str().unwrap(),
        ]);
        assert!(result.status.success());
    }

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn verbose_reports_progress_on_stderr() {
    let input = TempDir::new("verbose_in");
    let output = TempDir::new("verbose_out");
    input.write("serviceA.yml", SERVICE_A);
    let out_file = output.join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
        "--verbose",
    ]);
    assert!(result.status.success());

    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Added path: /serviceA/items"), "{stderr}");
    assert!(stderr.contains("Validation successful."), "{stderr}");
}

#[test]
fn quiet_run_still_reports_collisions() {
    let input = TempDir::new("quiet_in");
    let output = TempDir::new("quiet_out");
    input.write("serviceA.yml", SERVICE_A);
    input.write("serviceB.yml", SERVICE_B);
    let out_file = output.join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
    ]);
    assert!(result.status.success());

    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(!stderr.contains("Added path"), "{stderr}");
    assert!(stderr.contains("serviceB_Widget"), "{stderr}");
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn config_file_supplies_options() {
    let input = TempDir::new("config_in");
    let output = TempDir::new("config_out");
    input.write("svc.yml", DANGLING);
    let out_file = output.join("unified.yml");
    let config_path = output.join("merge.yml");
    fs::write(
        &config_path,
        format!(
            "input-directory: {}\noutput-file: {}\nvalidate: false\n",
            input.path().display(),
            out_file.display()
        ),
    )
    .unwrap();

    let result = merge_openapi(&["--config", config_path.to_str().unwrap()]);
    assert!(
        result.status.success(),
        "merge failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert!(out_file.exists());
}

#[test]
fn flag_overrides_config_file() {
    let input = TempDir::new("override_in");
    let output = TempDir::new("override_out");
    input.write("svc.yml", DANGLING);
    let out_file = output.join("unified.yml");
    let config_path = output.join("merge.yml");
    fs::write(
        &config_path,
        format!(
            "input-directory: {}\noutput-file: {}\nvalidate: false\n",
            input.path().display(),
            out_file.display()
        ),
    )
    .unwrap();

    let result = merge_openapi(&["--config", config_path.to_str().unwrap(), "--validate"]);
    assert_eq!(result.status.code(), Some(3));
    assert!(!out_file.exists());
}

#[test]
fn no_verbose_overrides_config_file() {
    let input = TempDir::new("noverbose_in");
    let output = TempDir::new("noverbose_out");
    input.write("serviceA.yml", SERVICE_A);
    let out_file = output.join("unified.yml");
    let config_path = output.join("merge.yml");
    fs::write(
        &config_path,
        format!(
            "input-directory: {}\noutput-file: {}\nverbose: true\n",
            input.path().display(),
            out_file.display()
        ),
    )
    .unwrap();

    let verbose = merge_openapi(&["--config", config_path.to_str().unwrap()]);
    assert!(verbose.status.success());
    let stderr = String::from_utf8_lossy(&verbose.stderr);
    assert!(stderr.contains("Added path: /serviceA/items"), "{stderr}");

    let quiet = merge_openapi(&["--config", config_path.to_str().unwrap(), "--no-verbose"]);
    assert!(quiet.status.success());
    let stderr = String::from_utf8_lossy(&quiet.stderr);
    assert!(!stderr.contains("Added path"), "{stderr}");
}

#[test]
fn missing_input_directory_option_fails() {
    let result = merge_openapi(&[]);
    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("input directory is required"), "{stderr}");
}

// ---------------------------------------------------------------------------
// Failure exit codes
// ---------------------------------------------------------------------------

#[test]
fn validation_failure_exits_3_without_output() {
    let input = TempDir::new("invalid_in");
    let output = TempDir::new("invalid_out");
    input.write("svc.yml", DANGLING);
    let out_file = output.join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
    ]);
    assert_eq!(result.status.code(), Some(3));
    assert!(!out_file.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("#/components/responses/Nowhere"), "{stderr}");
}

#[test]
fn no_validate_writes_invalid_document() {
    let input = TempDir::new("novalidate_in");
    let output = TempDir::new("novalidate_out");
    input.write("svc.yml", DANGLING);
    let out_file = output.join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
        "--no-validate",
    ]);
    assert!(result.status.success());
    assert!(out_file.exists());
}

#[test]
fn missing_output_directory_exits_4() {
    let input = TempDir::new("nodir_in");
    let output = TempDir::new("nodir_out");
    input.write("serviceA.yml", SERVICE_A);
    let out_file = output.join("missing").join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
    ]);
    assert_eq!(result.status.code(), Some(4));
    assert!(!out_file.exists());
}

#[test]
fn directory_as_output_exits_6() {
    let input = TempDir::new("isdir_in");
    let output = TempDir::new("isdir_out");
    input.write("serviceA.yml", SERVICE_A);

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        output.path().to_str().unwrap(),
    ]);
    assert_eq!(result.status.code(), Some(6));
}

#[test]
fn malformed_input_exits_1_and_names_file() {
    let input = TempDir::new("malformed_in");
    let output = TempDir::new("malformed_out");
    input.write("broken.yml", "paths: [unclosed\n");
    let out_file = output.join("unified.yml");

    let result = merge_openapi(&[
        "--input-directory",
        input.path().to_str().unwrap(),
        "--output-file",
        out_file.to_str().unwrap(),
    ]);
    assert_eq!(result.status.code(), Some(1));
    assert!(!out_file.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("broken.yml"), "{stderr}");
}
