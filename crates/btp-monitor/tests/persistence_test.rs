//! File-backed store: reopen and read pool visibility

use btp_monitor::prelude::*;

#[test]
fn test_state_survives_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("monitor.db");
    let src = NetworkId::parse("0x1.icon-cx01").unwrap();
    let dst = NetworkId::parse("0x2.eth2-0x02").unwrap();

    let (stored, record) = {
        let db = MonitorDb::open(&path).unwrap();
        let stored = db
            .store()
            .set_connection_state(&src, &dst, &ConnectionState::with_label("online"))
            .unwrap();
        let record = db
            .store()
            .add_tx_record(stored.id.unwrap(), 5, Utc::now())
            .unwrap();
        db.store()
            .write_log(Utc::now(), "", "", LogKind::Log, &"started".into())
            .unwrap();
        db.close().unwrap();
        (stored, record)
    };

    let db = MonitorDb::open(&path).unwrap();
    assert_eq!(
        db.store().get_connection_state(&src, &dst).unwrap(),
        Some(stored.clone())
    );
    assert_eq!(
        db.store().get_tx_records(stored.id.unwrap()).unwrap(),
        vec![record]
    );
    assert_eq!(db.store().query_logs(&[LogKind::Log]).unwrap().len(), 1);

    // New rows keep getting fresh identities after reopening
    let other = db
        .store()
        .set_connection_state(&dst, &src, &ConnectionState::default())
        .unwrap();
    assert_ne!(other.id, stored.id);
}

#[test]
fn test_pooled_reads_see_committed_batches() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cfg = StoreConfig::new(temp_dir.path().join("monitor.db"))
        .with_read_pool(ReadPoolConfig::enabled(2).with_timeout(1000));
    let db = MonitorDb::open_with_config(cfg).unwrap();
    let src = NetworkId::parse("0x1.icon-cx01").unwrap();
    let dst = NetworkId::parse("0x2.eth2-0x02").unwrap();

    for label in ["unknown", "online", "bad"] {
        db.store()
            .run_batch(|b| {
                b.set_connection_state(&src, &dst, &ConnectionState::with_label(label))?;
                Ok::<_, MonitorError>(())
            })
            .unwrap();
        let seen = db.store().get_connection_state(&src, &dst).unwrap().unwrap();
        assert_eq!(seen.state, label);
    }
}

#[test]
fn test_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("from-config.db");
    let cfg_path = temp_dir.path().join("store.json");
    std::fs::write(
        &cfg_path,
        format!(
            r#"{{"path": {:?}, "synchronous": "Full", "read_pool": {{"pool_size": 2}}}}"#,
            db_path.to_str().unwrap()
        ),
    )
    .unwrap();

    let cfg = StoreConfig::from_json_file(&cfg_path).unwrap();
    assert_eq!(cfg.synchronous, SynchronousMode::Full);
    assert_eq!(cfg.read_pool.pool_size, 2);
    assert!(cfg.read_pool.enabled);

    let db = MonitorDb::open_with_config(cfg).unwrap();
    assert_eq!(db.store().stats().unwrap(), StoreStats::default());
    assert!(db_path.exists());
}

#[test]
fn test_close_refused_while_store_is_shared() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db = MonitorDb::open(temp_dir.path().join("monitor.db")).unwrap();
    let src = NetworkId::parse("0x1.icon-cx01").unwrap();
    let dst = NetworkId::parse("0x2.eth2-0x02").unwrap();

    let shared = Arc::clone(db.store());
    assert!(matches!(db.close(), Err(MonitorError::InvalidState(_))));

    // The remaining owner is untouched and can still close the store
    shared
        .set_connection_state(&src, &dst, &ConnectionState::default())
        .unwrap();
    shared.close().unwrap();

    assert!(matches!(
        shared.set_connection_state(&src, &dst, &ConnectionState::default()),
        Err(MonitorError::InvalidState(_))
    ));
    assert!(matches!(
        shared.get_connection_state(&src, &dst),
        Err(MonitorError::InvalidState(_))
    ));
}
