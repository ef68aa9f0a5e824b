//! Tool configuration (`Config`) with defaults and the field metadata
//! used to generate a commented `config.yml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // remote origin
    #[serde(default = "default_base_url")]
    pub base_url: String,

    // local layout
    #[serde(default = "default_files_dir")]
    pub files_dir: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    #[serde(default = "default_progress_file")]
    pub progress_file: String,

    // network behaviour
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_min_wait_time")]
    pub min_wait_time: u64,
    #[serde(default = "default_max_wait_time")]
    pub max_wait_time: u64,
    #[serde(default = "default_download_delay")]
    pub download_delay: u64,

    // link rewriting
    #[serde(default = "default_old_host")]
    pub old_host: String,
    #[serde(default = "default_site_path")]
    pub site_path: String,
    #[serde(default = "default_new_base_url")]
    pub new_base_url: String,
    #[serde(default = "default_legacy_page")]
    pub legacy_page: String,
    #[serde(default = "default_modern_page")]
    pub modern_page: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            files_dir: default_files_dir(),
            manifest_file: default_manifest_file(),
            progress_file: default_progress_file(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            min_wait_time: default_min_wait_time(),
            max_wait_time: default_max_wait_time(),
            download_delay: default_download_delay(),
            old_host: default_old_host(),
            site_path: default_site_path(),
            new_base_url: default_new_base_url(),
            legacy_page: default_legacy_page(),
            modern_page: default_modern_page(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 14] = [
            FieldMeta {
                name: "base_url",
                description: "Remote origin the manifest entries are fetched from",
            },
            FieldMeta {
                name: "files_dir",
                description: "Local directory the downloads land in",
            },
            FieldMeta {
                name: "manifest_file",
                description: "JSON manifest listing the files to fetch",
            },
            FieldMeta {
                name: "progress_file",
                description: "Append-only log of completed downloads (one name per line)",
            },
            FieldMeta {
                name: "request_timeout",
                description: "Connect and per-attempt request timeout in seconds",
            },
            FieldMeta {
                name: "max_retries",
                description: "Automatic retries per file on transient failures",
            },
            FieldMeta {
                name: "min_wait_time",
                description: "Initial retry backoff in ms (doubles per attempt)",
            },
            FieldMeta {
                name: "max_wait_time",
                description: "Retry backoff cap in ms",
            },
            FieldMeta {
                name: "download_delay",
                description: "Pause between files in ms, keeps load off the remote host",
            },
            FieldMeta {
                name: "old_host",
                description: "Legacy hosting domain links are rewritten away from",
            },
            FieldMeta {
                name: "site_path",
                description: "Subdirectory the site lived under on the legacy host",
            },
            FieldMeta {
                name: "new_base_url",
                description: "Self-hosted base URL links are retargeted to",
            },
            FieldMeta {
                name: "legacy_page",
                description: "Landing page of the legacy site copy",
            },
            FieldMeta {
                name: "modern_page",
                description: "Landing page of the redesigned site (served from a subdirectory)",
            },
        ];
        &FIELDS
    }
}

impl Config {
    pub fn files_path(&self) -> PathBuf {
        PathBuf::from(&self.files_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.manifest_file)
    }

    pub fn progress_path(&self) -> PathBuf {
        PathBuf::from(&self.progress_file)
    }
}

fn default_base_url() -> String {
    "https://abdikamalov.narod.ru/abdikamalov/".to_string()
}

fn default_files_dir() -> String {
    "files".to_string()
}

fn default_manifest_file() -> String {
    "files.json".to_string()
}

fn default_progress_file() -> String {
    "download_progress.txt".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_min_wait_time() -> u64 {
    500
}

fn default_max_wait_time() -> u64 {
    4000
}

fn default_download_delay() -> u64 {
    500
}

fn default_old_host() -> String {
    "abdikamalov.narod.ru".to_string()
}

fn default_site_path() -> String {
    "abdikamalov".to_string()
}

fn default_new_base_url() -> String {
    "https://abdikamalov.com".to_string()
}

fn default_legacy_page() -> String {
    "index.htm".to_string()
}

fn default_modern_page() -> String {
    "new/index.html".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_table_matches_serialized_keys() {
        let value = serde_yaml::to_value(Config::default()).unwrap();
        let serde_yaml::Value::Mapping(map) = value else {
            panic!("config must serialize to a mapping");
        };
        assert_eq!(map.len(), Config::fields().len());
        for field in Config::fields() {
            assert!(
                map.contains_key(&serde_yaml::Value::String(field.name.to_string())),
                "field {} missing from serialization",
                field.name
            );
        }
    }
}
