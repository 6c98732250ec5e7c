/// End-to-end tests for the CLI
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Command running inside an empty directory so no config file is discovered
fn scanner_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sbom-vuln-scanner");
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("custom.yml");
    fs::write(&path, content).unwrap();
    path
}

// Exit code tests for CLI
mod exit_code_tests {
    use super::*;

    /// Exit code 0: scan without any vulnerability data
    #[test]
    fn test_exit_code_success_without_findings() {
        let dir = TempDir::new().unwrap();
        scanner_cmd(&dir)
            .arg("scan")
            .arg(fixture("cyclonedx.json"))
            .assert()
            .code(0);
    }

    /// Exit code 1: vulnerable components found
    #[test]
    fn test_exit_code_vulnerabilities_detected() {
        let dir = TempDir::new().unwrap();
        scanner_cmd(&dir)
            .arg("scan")
            .arg(fixture("cyclonedx.json"))
            .arg("--feed")
            .arg(fixture("nvd_feed.json"))
            .assert()
            .code(1);
    }

    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("sbom-vuln-scanner")
            .arg("--help")
            .assert()
            .code(0);
    }

    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("sbom-vuln-scanner")
            .arg("--version")
            .assert()
            .code(0);
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_argument() {
        cargo_bin_cmd!("sbom-vuln-scanner")
            .arg("--invalid-option")
            .assert()
            .code(2);
    }

    /// Exit code 2: Invalid format value
    #[test]
    fn test_exit_code_invalid_format() {
        cargo_bin_cmd!("sbom-vuln-scanner")
            .args(["scan", "bom.json", "-f", "markdown"])
            .assert()
            .code(2);
    }

    /// Exit code 3: unparsable SBOM
    #[test]
    fn test_exit_code_application_error_invalid_sbom() {
        let dir = TempDir::new().unwrap();
        scanner_cmd(&dir)
            .arg("scan")
            .arg(fixture("invalid.json"))
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Unknown SBOM format"));
    }

    /// Exit code 3: missing input file
    #[test]
    fn test_exit_code_application_error_missing_file() {
        let dir = TempDir::new().unwrap();
        scanner_cmd(&dir)
            .args(["scan", "/nonexistent/bom.json"])
            .assert()
            .code(3);
    }

    /// Exit code 3: unsupported extension
    #[test]
    fn test_exit_code_application_error_bad_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bom.txt");
        fs::copy(fixture("cyclonedx.json"), &path).unwrap();
        scanner_cmd(&dir)
            .arg("scan")
            .arg(&path)
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Upload rejected"));
    }
}

#[test]
fn test_json_report_on_stdout() {
    let dir = TempDir::new().unwrap();
    let output = scanner_cmd(&dir)
        .arg("scan")
        .arg(fixture("cyclonedx.json"))
        .arg("--feed")
        .arg(fixture("nvd_feed.json"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["report_metadata"]["format"], "json");
    assert_eq!(report["scan_summary"]["status"], "completed");
    assert_eq!(report["scan_summary"]["total_components"], 3);
    assert_eq!(report["scan_summary"]["vulnerable_count"], 2);
    assert_eq!(report["risk_summary"]["risk_level"], "CRITICAL");

    let cves: Vec<&str> = report["vulnerabilities"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["cve_id"].as_str())
        .collect();
    assert!(cves.contains(&"CVE-2021-44228"));
    assert!(cves.contains(&"CVE-2018-25032"));
    assert!(!cves.contains(&"CVE-2023-32681"));
}

#[test]
fn test_csv_report_written_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("report.csv");

    scanner_cmd(&dir)
        .arg("scan")
        .arg(fixture("spdx.json"))
        .arg("--feed")
        .arg(fixture("nvd_feed.json"))
        .args(["--format", "csv", "--output"])
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());

    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("CVE ID,Severity,CVSS Score"));
    assert!(csv.contains("CVE-2018-25032,HIGH,7.5,zlib,1.2.11"));
    assert!(csv.contains("Total Components,2"));
}

#[test]
fn test_xml_inputs_are_accepted() {
    let dir = TempDir::new().unwrap();
    scanner_cmd(&dir)
        .arg("scan")
        .arg(fixture("cyclonedx.xml"))
        .arg("--feed")
        .arg(fixture("nvd_feed.json"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("CVE-2021-44228"));

    scanner_cmd(&dir)
        .arg("scan")
        .arg(fixture("spdx.xml"))
        .arg("--feed")
        .arg(fixture("nvd_feed.json"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"vulnerable_count\": 0"));
}

#[test]
fn test_empty_sbom_report() {
    let dir = TempDir::new().unwrap();
    scanner_cmd(&dir)
        .arg("scan")
        .arg(fixture("empty.json"))
        .arg("--feed")
        .arg(fixture("nvd_feed.json"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"total_components\": 0"));
}

#[test]
fn test_upload_limit_from_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "max_upload_bytes: 16\n");
    scanner_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg(fixture("cyclonedx.json"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("too large").or(predicate::str::contains("exceeds")));
}

#[test]
fn test_invalid_config_reports_hint() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "workers: 0\n");
    scanner_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg(fixture("cyclonedx.json"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("workers must be at least 1"))
        .stderr(predicate::str::contains("💡 Hint:"));
}

#[test]
fn test_discovered_config_is_applied() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sbom-vuln-scanner.config.yml"),
        "engine: external\nscanner:\n  command: /nonexistent/trivy\n",
    )
    .unwrap();

    scanner_cmd(&dir)
        .arg("scan")
        .arg(fixture("cyclonedx.json"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Scan tool not available"));
}

#[test]
fn test_check_tool_missing_command() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "scanner:\n  command: /nonexistent/trivy\n");
    scanner_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .arg("check-tool")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("is not installed"));
}

#[test]
fn test_refresh_db_failure_reported_as_status() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "scanner:\n  command: /nonexistent/trivy\n");
    let output = scanner_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .arg("refresh-db")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["status"], "failed");
}

#[cfg(unix)]
mod fake_trivy {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const REPORT: &str = r#"{
  "SchemaVersion": 2,
  "Results": [
    {
      "Target": "sbom.json",
      "Vulnerabilities": [
        {
          "VulnerabilityID": "CVE-2022-37434",
          "PkgName": "zlib",
          "InstalledVersion": "1.2.11",
          "FixedVersion": "1.2.13",
          "Severity": "CRITICAL",
          "Description": "zlib through 1.2.12 has a heap-based buffer over-read",
          "CVSS": { "nvd": { "V3Score": 9.8, "V3Vector": "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H" } }
        }
      ]
    }
  ]
}"#;

    fn install(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("trivy");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config_for(dir: &TempDir, command: &PathBuf) -> PathBuf {
        write_config(
            dir,
            &format!(
                "engine: external\nscanner:\n  command: {}\n  cache_dir: {}\n",
                command.display(),
                dir.path().join("cache").display()
            ),
        )
    }

    #[test]
    fn test_external_engine_findings() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("report.json");
        fs::write(&report, REPORT).unwrap();
        let command = install(&dir, &format!("cat '{}'\nexit 1", report.display()));
        let config = config_for(&dir, &command);

        scanner_cmd(&dir)
            .arg("--config")
            .arg(&config)
            .arg("scan")
            .arg(fixture("spdx.json"))
            .assert()
            .code(1)
            .stdout(predicate::str::contains("CVE-2022-37434"));
    }

    #[test]
    fn test_external_engine_unexpected_exit() {
        let dir = TempDir::new().unwrap();
        let command = install(&dir, "echo 'database corrupt' >&2\nexit 2");
        let config = config_for(&dir, &command);

        scanner_cmd(&dir)
            .arg("--config")
            .arg(&config)
            .arg("scan")
            .arg(fixture("spdx.json"))
            .assert()
            .code(3)
            .stderr(predicate::str::contains("unexpected status 2"));
    }

    #[test]
    fn test_engine_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let command = install(&dir, "exit 2");
        let config = config_for(&dir, &command);

        scanner_cmd(&dir)
            .arg("--config")
            .arg(&config)
            .arg("scan")
            .arg(fixture("spdx.json"))
            .args(["--engine", "matcher"])
            .assert()
            .code(0);
    }

    #[test]
    fn test_check_tool_and_refresh_with_fake_tool() {
        let dir = TempDir::new().unwrap();
        let command = install(&dir, "echo 'Version: 0.50.0'\nexit 0");
        let config = config_for(&dir, &command);

        scanner_cmd(&dir)
            .arg("--config")
            .arg(&config)
            .arg("check-tool")
            .assert()
            .code(0)
            .stderr(predicate::str::contains("is available"));

        scanner_cmd(&dir)
            .arg("--config")
            .arg(&config)
            .arg("refresh-db")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("\"status\": \"success\""));
    }
}
