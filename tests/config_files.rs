use belledonne::interop::cow::{Provenance, ReferenceConvertible};
use belledonne::linphone::{Address, Config, Factory};
use std::fs;

#[test]
fn sync_writes_back_to_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linphonerc");

    let mut config = Config::open(&path).unwrap();
    assert!(config.sections().is_empty());

    config.set_string("sip", "contact", Some("sip:toto@titi")).unwrap();
    config.set_int("rtp", "audio_rtp_port", 7078).unwrap();
    config.sync().unwrap();

    let reopened = Config::open(&path).unwrap();
    assert_eq!(Some("sip:toto@titi".to_owned()), reopened.string("sip", "contact"));
    assert_eq!(7078, reopened.int("rtp", "audio_rtp_port", 0));
    assert_eq!(config.dump(), fs::read_to_string(&path).unwrap());
}

#[test]
fn user_file_overrides_factory_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let factory_path = dir.path().join("factoryrc");
    let path = dir.path().join("linphonerc");

    fs::write(&factory_path, "[sip]\nsip_port=5060\ncontact=sip:default@localhost\n").unwrap();
    fs::write(&path, "# user settings\n[sip]\nsip_port=5070\n").unwrap();

    let config = Config::open_with_factory(&path, &factory_path).unwrap();

    assert_eq!(5070, config.int("sip", "sip_port", 0));
    assert_eq!(Some("sip:default@localhost".to_owned()), config.string("sip", "contact"));
}

#[test]
fn merging_another_file() {
    let dir = tempfile::tempdir().unwrap();
    let extra = dir.path().join("extra");
    fs::write(&extra, "[video]\nenabled=1\n").unwrap();

    let mut config = Config::from_buffer("[sip]\nsip_port=5060\n").unwrap();
    config.read_file(&extra).unwrap();

    assert_eq!(vec!["sip", "video"], config.sections());
    assert!(config.read_file(dir.path().join("missing")).is_err());
}

#[test]
fn core_configuration_syncs_without_copying() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linphonerc");

    let core = Factory::shared().core_builder().config_path(&path).build().unwrap();
    core.set_primary_contact(&Address::parse("sip:toto@titi").unwrap()).unwrap();

    let config = core.config();
    config.sync().unwrap();
    assert_eq!(Provenance::ExternallyRetained, config.internal_reference().provenance());

    let reopened = Config::open(&path).unwrap();
    assert_eq!(Some("sip:toto@titi".to_owned()), reopened.string("sip", "contact"));
}

#[test]
fn copies_have_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linphonerc");

    let original = Config::open(&path).unwrap();
    let mut copy = original.clone();
    copy.set_int("sip", "sip_port", 5070).unwrap();

    assert!(copy.sync().is_err());
    assert!(original.sync().is_ok());
    assert!(!Config::open(&path).unwrap().has_entry("sip", "sip_port"));
}
