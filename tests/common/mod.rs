#![allow(dead_code)]

use hangar::DatabaseService;
use hangar::models::{
    NewPackageDescriptor, NewVersionDescriptor, PackageType, Repository, UserProfile,
};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub struct TestDatabase {
    pub service: DatabaseService,
    _temp_dir: TempDir, // Keep alive for cleanup
}

/// Fresh registry store in its own temporary directory
pub fn create_test_database() -> TestDatabase {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let database_url = temp_dir
        .path()
        .join(format!("registry_{test_id}.db"))
        .to_string_lossy()
        .to_string();

    let service = DatabaseService::new(&database_url, 8).expect("Failed to initialize database");

    TestDatabase {
        service,
        _temp_dir: temp_dir,
    }
}

pub fn version_descriptor(semver: &str) -> NewVersionDescriptor {
    NewVersionDescriptor {
        semver: semver.to_string(),
        license: Some("MIT".to_string()),
        engines: serde_json::json!({"atom": ">=1.0.0 <2.0.0"}),
        metadata: serde_json::json!({"name": "placeholder", "version": semver}),
        tarball_url: Some(format!(
            "https://codeload.example.test/archive/v{semver}.tar.gz"
        )),
        sha: Some("0123456789abcdef".to_string()),
    }
}

pub fn package_descriptor(name: &str, semver: &str) -> NewPackageDescriptor {
    NewPackageDescriptor {
        name: name.to_string(),
        repository: Repository {
            kind: "git".to_string(),
            url: format!("https://github.com/hangar-test/{name}"),
        },
        readme: format!("# {name}"),
        creation_method: "User Made Package".to_string(),
        owner: "hangar-test".to_string(),
        package_type: PackageType::Package,
        metadata: serde_json::json!({"name": name, "version": semver}),
        version: version_descriptor(semver),
    }
}

pub fn user_profile(node_id: &str, username: &str) -> UserProfile {
    UserProfile {
        node_id: node_id.to_string(),
        username: username.to_string(),
        avatar: format!("https://avatars.example.test/{username}"),
        data: serde_json::json!({}),
    }
}
