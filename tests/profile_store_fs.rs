use std::fs;

use patchwork::core::{
    AppSettings, ConfigProfile, EngineError, FsProfileStore, PROFILE_VERSION, ProfileMode,
    ProfileStore, local_profile_file,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn store() -> (tempfile::TempDir, tempfile::TempDir, FsProfileStore) {
    let home = tempdir().expect("home");
    let project = tempdir().expect("project");
    let store = FsProfileStore::new(home.path());
    (home, project, store)
}

#[test]
fn missing_profiles_read_as_absent() {
    let (_h, project, store) = store();
    let pair = store.read_profiles(project.path()).expect("read");
    assert!(pair.global.is_none());
    assert!(pair.local.is_none());
}

#[test]
fn local_profile_round_trips() {
    let (_h, project, store) = store();
    let profile = ConfigProfile {
        include_file_types: ".rs,.toml".into(),
        exclude_dirs: ["target".to_string(), "docs/build".to_string()].into(),
        previous_files: vec!["src/lib.rs".into()],
        ..ConfigProfile::default()
    };
    store
        .write_profile(project.path(), ProfileMode::Local, &profile)
        .expect("write");

    let pair = store.read_profiles(project.path()).expect("read");
    assert_eq!(pair.local, Some(profile));
    assert!(local_profile_file(project.path()).is_file());
}

#[test]
fn exclude_dirs_is_stored_as_a_comma_string() {
    let (_h, project, store) = store();
    let profile = ConfigProfile {
        exclude_dirs: ["b".to_string(), "a/x".to_string()].into(),
        ..ConfigProfile::default()
    };
    store
        .write_profile(project.path(), ProfileMode::Local, &profile)
        .expect("write");

    let raw = fs::read_to_string(local_profile_file(project.path())).expect("read");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(json["exclude_dirs"], "a/x,b");
}

#[test]
fn global_profile_never_stores_previous_files() {
    let (_h, project, store) = store();
    let profile = ConfigProfile {
        previous_files: vec!["a.txt".into()],
        ..ConfigProfile::default()
    };
    store
        .write_profile(project.path(), ProfileMode::Global, &profile)
        .expect("write");

    let raw = fs::read_to_string(store.global_profile_file()).expect("read");
    assert!(!raw.contains("previous_files"));
    let pair = store.read_profiles(project.path()).expect("read");
    assert_eq!(pair.global.map(|p| p.previous_files), Some(Vec::new()));
}

#[test]
fn corrupt_profile_is_treated_as_absent() {
    let (_h, project, store) = store();
    let path = local_profile_file(project.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, "{ not json").expect("write");

    let pair = store.read_profiles(project.path()).expect("read");
    assert!(pair.local.is_none());
}

#[test]
fn old_profiles_are_migrated_on_read() {
    let (_h, project, store) = store();
    let path = local_profile_file(project.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(
        &path,
        r#"{"version":0,"previous_files":["a.txt"],"show_ignored_in_tree":true,"exclude_dirs":"target"}"#,
    )
    .expect("write");

    let local = store
        .read_profiles(project.path())
        .expect("read")
        .local
        .expect("local");
    assert_eq!(local.version, PROFILE_VERSION);
    assert!(local.previous_files.is_empty());
    assert!(!local.show_ignored_in_tree);
    assert!(local.exclude_dirs.contains("target"));
    // Missing fields fall back to defaults.
    assert_eq!(local.output_file, ConfigProfile::default().output_file);
}

#[test]
fn saving_the_same_profile_twice_is_byte_identical() {
    let (_h, project, store) = store();
    let profile = ConfigProfile {
        exclude_dirs: ["node_modules".to_string()].into(),
        ..ConfigProfile::default()
    };
    let path = local_profile_file(project.path());

    store
        .write_profile(project.path(), ProfileMode::Local, &profile)
        .expect("write");
    let first = fs::read(&path).expect("read");
    store
        .write_profile(project.path(), ProfileMode::Local, &profile)
        .expect("write");
    assert_eq!(first, fs::read(&path).expect("read"));
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn write_failure_is_a_persistence_error() {
    let (home, project, _store) = store();
    // A file where the app directory should be makes every write fail.
    let blocker = home.path().join("blocked");
    fs::write(&blocker, "").expect("write");
    let store = FsProfileStore::new(&blocker);

    let err = store
        .write_profile(project.path(), ProfileMode::Global, &ConfigProfile::default())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Persistence {
            mode: ProfileMode::Global,
            ..
        }
    ));
}

#[test]
fn mode_hint_and_last_project_are_remembered() {
    let (_h, project, store) = store();
    assert_eq!(store.active_mode_hint(), None);

    store.set_active_mode_hint(ProfileMode::Local);
    store.remember_project(project.path());

    assert_eq!(store.active_mode_hint(), Some(ProfileMode::Local));
    let session = store.load_session_state();
    assert_eq!(session.last_directory.as_deref(), Some(project.path()));
}

#[test]
fn app_settings_default_and_round_trip() {
    let (_h, _p, store) = store();
    assert_eq!(store.load_app_settings(), AppSettings::default());

    let settings = AppSettings {
        default_to_local_config: true,
        prompt_for_directory_on_startup: false,
    };
    store.save_app_settings(&settings).expect("save");
    assert_eq!(store.load_app_settings(), settings);
}
