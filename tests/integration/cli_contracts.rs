use std::fs;

use collabx::tooling::cli::{CliContext, Commands};
use tempfile::TempDir;

use crate::integration::support::{with_xdg_env, write_tree};

#[test]
fn global_config_file_is_honored() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let config_dir = temp_dir.path().join("config").join("collabx");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "[session]\nmin_room_id_len = 8\n",
        )
        .unwrap();

        let cli = CliContext::new(None).unwrap();
        let err = cli
            .execute(&Commands::Validate {
                username: "ada".to_string(),
                room_id: "abcdefg".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "ROOM Id must be at least 8 characters long");
    });
}

#[test]
fn explicit_config_overrides_global() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let explicit = temp_dir.path().join("explicit.toml");
        fs::write(&explicit, "[ingest]\nexclusions = [\"vendor\"]\n").unwrap();
        let project = temp_dir.path().join("project");
        write_tree(
            &project,
            &[("vendor/x.txt", b"x"), ("node_modules/y.txt", b"y")],
        );

        let cli = CliContext::new(Some(explicit)).unwrap();
        let output = cli
            .execute(&Commands::Export {
                path: project,
                flat: false,
                format: "text".to_string(),
            })
            .unwrap();
        assert_eq!(output, "node_modules/\nnode_modules/y.txt\t1");
    });
}

#[test]
fn ingest_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let project = temp_dir.path().join("project");
        write_tree(&project, &[("src/main.rs", b"fn main() {}")]);

        let cli = CliContext::new(None).unwrap();
        let output = cli
            .execute(&Commands::Ingest {
                path: project,
                flat: false,
                format: "json".to_string(),
            })
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["report"]["files"], 1);
        assert_eq!(parsed["report"]["directories"], 1);
        assert_eq!(parsed["fingerprint"].as_str().unwrap().len(), 64);
        let top = &parsed["fileStructure"][0];
        assert_eq!(top["type"], "directory");
        assert_eq!(top["name"], "src");
        assert_eq!(top["isOpen"], false);
        assert_eq!(top["children"][0]["type"], "file");
        assert_eq!(top["children"][0]["content"], "fn main() {}");
    });
}

#[test]
fn export_json_lists_directories_without_content() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let project = temp_dir.path().join("project");
        write_tree(&project, &[("docs/a.md", b"# a")]);

        let cli = CliContext::new(None).unwrap();
        let output = cli
            .execute(&Commands::Export {
                path: project,
                flat: true,
                format: "json".to_string(),
            })
            .unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        let paths: Vec<&str> = parsed.iter().map(|e| e["path"].as_str().unwrap()).collect();
        assert_eq!(paths, vec!["project", "project/docs", "project/docs/a.md"]);
        assert!(parsed[0].get("content").is_none());
        assert_eq!(parsed[2]["content"], "# a");
    });
}
