use super::*;
use nestegg::backend::AuthIdentity;

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("nestegg-cli-{}", uuid::Uuid::new_v4())).join("session.json")
}

fn sample_session() -> Session {
    Session {
        access_token: "access".to_owned(),
        refresh_token: "refresh".to_owned(),
        token_type: "bearer".to_owned(),
        expires_in: Some(3600),
        expires_at: Some(1_700_000_000),
        user: AuthIdentity { id: uuid::Uuid::new_v4(), email: Some("jane@example.com".to_owned()) },
    }
}

#[test]
fn missing_file_loads_nothing() {
    assert!(SessionFile::new(scratch_path()).load().is_none());
}

#[test]
fn saved_session_is_restored_then_cleared() {
    let path = scratch_path();
    let file = SessionFile::new(&path);
    let session = sample_session();

    file.save(&session);
    assert_eq!(SessionFile::new(&path).load(), Some(session));

    file.clear();
    assert!(!path.exists());
    file.clear();
}

#[test]
fn corrupt_file_is_ignored() {
    let path = scratch_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{not json").unwrap();

    assert!(SessionFile::new(&path).load().is_none());
}
