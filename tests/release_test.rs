mod common;

use tempfile::tempdir;

use barbican::error::CharmError;
use barbican::release::{
    reset_release, select_release, Host, Release, SystemHost, OPENSTACK_RELEASE_KEY,
    RELEASE_PACKAGE,
};
use barbican::unitdata::{KeyValueStore, MemoryStore, UnitState};

use common::{FakeHost, FakeRunner};

#[test]
fn release_from_installed_package() {
    let mut store = MemoryStore::default();
    let host = FakeHost::new("bionic").with_package(RELEASE_PACKAGE, "1:9.0.0-0ubuntu1~cloud0");

    let release = select_release(&mut store, &host, "distro").unwrap();

    assert_eq!(release, Release::Train);
    assert_eq!(store.get(OPENSTACK_RELEASE_KEY), Some("train".into()));
}

#[test]
fn cached_release_outlives_package_changes() {
    let mut store = MemoryStore::default();
    let host = FakeHost::new("focal").with_package(RELEASE_PACKAGE, "1:10.0.0-0ubuntu1");

    assert_eq!(
        select_release(&mut store, &host, "distro").unwrap(),
        Release::Ussuri
    );

    host.install(RELEASE_PACKAGE, "1:11.0.0-0ubuntu1");
    let queries = host.queries.get();

    assert_eq!(
        select_release(&mut store, &host, "distro").unwrap(),
        Release::Ussuri
    );
    assert_eq!(host.queries.get(), queries);
}

#[test]
fn reset_release_detects_again() {
    let mut store = MemoryStore::default();
    let host = FakeHost::new("focal").with_package(RELEASE_PACKAGE, "1:10.0.0-0ubuntu1");
    select_release(&mut store, &host, "distro").unwrap();

    host.install(RELEASE_PACKAGE, "1:11.0.0-0ubuntu1");
    reset_release(&mut store).unwrap();

    assert_eq!(store.get(OPENSTACK_RELEASE_KEY), None);
    assert_eq!(
        select_release(&mut store, &host, "distro").unwrap(),
        Release::Victoria
    );
}

#[test]
fn unknown_package_version_is_an_error() {
    let mut store = MemoryStore::default();
    let host = FakeHost::new("focal").with_package(RELEASE_PACKAGE, "2:42.0.0-0ubuntu1");

    match select_release(&mut store, &host, "distro") {
        Err(CharmError::ReleaseResolution(_)) => {}
        other => panic!("Expected a release resolution error, got {:?}", other),
    }
    assert_eq!(store.get(OPENSTACK_RELEASE_KEY), None);
}

#[test]
fn release_too_old_from_origin_is_not_cached() {
    let mut store = MemoryStore::default();
    let host = FakeHost::new("bionic");

    match select_release(&mut store, &host, "distro") {
        Err(CharmError::ReleaseResolution(message)) => assert!(message.contains("queens")),
        other => panic!("Expected a release resolution error, got {:?}", other),
    }
    assert_eq!(store.get(OPENSTACK_RELEASE_KEY), None);

    assert_eq!(
        select_release(&mut store, &host, "cloud:bionic-stein").unwrap(),
        Release::Stein
    );
    assert_eq!(store.get(OPENSTACK_RELEASE_KEY), Some("stein".into()));
}

#[test]
fn release_too_old_from_package_is_not_cached() {
    let mut store = MemoryStore::default();
    let host = FakeHost::new("bionic").with_package(RELEASE_PACKAGE, "1:6.0.0-0ubuntu1");

    assert!(select_release(&mut store, &host, "cloud:bionic-stein").is_err());
    assert_eq!(store.get(OPENSTACK_RELEASE_KEY), None);
}

#[test]
fn unsupported_cached_release_is_detected_again() {
    let mut store = MemoryStore::default();
    store.set(OPENSTACK_RELEASE_KEY, "queens").unwrap();
    let host = FakeHost::new("bionic");

    assert_eq!(
        select_release(&mut store, &host, "cloud:bionic-train").unwrap(),
        Release::Train
    );
    assert_eq!(store.get(OPENSTACK_RELEASE_KEY), Some("train".into()));
}

#[test]
fn garbage_package_version_is_an_error() {
    let mut store = MemoryStore::default();
    let host = FakeHost::new("focal").with_package(RELEASE_PACKAGE, "latest");

    assert!(select_release(&mut store, &host, "distro").is_err());
}

#[test]
fn release_from_origin_before_install() {
    let host = FakeHost::new("bionic");

    let mut store = MemoryStore::default();
    assert_eq!(
        select_release(&mut store, &host, "cloud:bionic-stein").unwrap(),
        Release::Stein
    );

    let mut store = MemoryStore::default();
    assert_eq!(
        select_release(&mut store, &host, "cloud:bionic-train/proposed").unwrap(),
        Release::Train
    );

    let mut store = MemoryStore::default();
    assert_eq!(
        select_release(&mut store, &FakeHost::new("focal"), "distro").unwrap(),
        Release::Ussuri
    );
}

#[test]
fn unsupported_origin_is_an_error() {
    let host = FakeHost::new("bionic");
    let mut store = MemoryStore::default();

    assert!(select_release(&mut store, &host, "ppa:someone/barbican").is_err());
    assert!(select_release(&mut store, &host, "cloud:bionic-zed").is_err());
    assert!(select_release(&mut store, &FakeHost::new("trusty"), "distro").is_err());
}

#[test]
fn corrupt_cache_is_an_error() {
    let host = FakeHost::new("focal");
    let mut store = MemoryStore::default();
    store.set(OPENSTACK_RELEASE_KEY, "grizzly").unwrap();

    assert!(select_release(&mut store, &host, "distro").is_err());
}

#[test]
fn releases_are_ordered() {
    let all: Vec<_> = Release::all().collect();

    assert_eq!(all.first(), Some(&Release::Liberty));
    assert_eq!(all.last(), Some(&Release::Victoria));
    assert!(all.windows(2).all(|w| w[0] < w[1]));
    assert_eq!("rocky".parse::<Release>().unwrap(), Release::Rocky);
}

#[test]
fn unit_state_persists_between_hooks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit-state.yaml");

    let mut state = UnitState::load(&path).unwrap();
    assert_eq!(state.get(OPENSTACK_RELEASE_KEY), None);
    state.set(OPENSTACK_RELEASE_KEY, "stein").unwrap();
    state.set("charm.installed", "true").unwrap();

    let mut state = UnitState::load(&path).unwrap();
    assert_eq!(state.get(OPENSTACK_RELEASE_KEY), Some("stein".into()));
    assert_eq!(state.get_or("missing", "fallback"), "fallback");

    state.unset(OPENSTACK_RELEASE_KEY).unwrap();
    let state = UnitState::load(&path).unwrap();
    assert_eq!(state.get(OPENSTACK_RELEASE_KEY), None);
    assert_eq!(state.get("charm.installed"), Some("true".into()));
}

#[test]
fn system_host_asks_dpkg() {
    let runner = FakeRunner::default()
        .with_output("dpkg-query", "installed 1:8.0.0-0ubuntu1\n")
        .with_output("lsb_release", "focal\n");
    let host = SystemHost::new(&runner);

    assert_eq!(
        host.installed_version(RELEASE_PACKAGE).unwrap(),
        Some("1:8.0.0-0ubuntu1".into())
    );
    assert_eq!(host.series().unwrap(), "focal");
    assert_eq!(
        runner.calls_to("dpkg-query"),
        vec![vec![
            "--show".to_string(),
            "--showformat=${db:Status-Status} ${Version}".to_string(),
            RELEASE_PACKAGE.to_string(),
        ]]
    );
}

#[test]
fn system_host_ignores_removed_packages() {
    let runner = FakeRunner::default().with_output("dpkg-query", "config-files 1:8.0.0-0ubuntu1");
    let host = SystemHost::new(&runner);
    assert_eq!(host.installed_version(RELEASE_PACKAGE).unwrap(), None);

    let runner = FakeRunner::failing("dpkg-query");
    let host = SystemHost::new(&runner);
    assert_eq!(host.installed_version(RELEASE_PACKAGE).unwrap(), None);
}
