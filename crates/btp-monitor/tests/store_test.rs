//! Integration tests for the monitor state store

use btp_monitor::prelude::*;

fn open_store() -> MonitorDb {
    MonitorDb::open_in_memory().unwrap()
}

fn link() -> (NetworkId, NetworkId) {
    (
        NetworkId::from_address("btp://0x1.icon/cx0000000000000000000000000000000000000001")
            .unwrap(),
        NetworkId::from_address("btp://0x32.eth2/0x0000000000000000000000000000000000000002")
            .unwrap(),
    )
}

fn unknown_state() -> ConnectionState {
    ConnectionState::with_label("unknown")
}

#[test]
fn test_get_unknown_pair_returns_none() {
    let db = open_store();
    let (src, dst) = link();

    assert!(db.store().get_connection_state(&src, &dst).unwrap().is_none());
    // Direction matters
    db.store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap();
    assert!(db.store().get_connection_state(&dst, &src).unwrap().is_none());
}

#[test]
fn test_set_then_get_returns_same_record() {
    let db = open_store();
    let (src, dst) = link();

    let mut cs = unknown_state();
    cs.tx_seq = Some(10);
    cs.tx_ts = Some(Utc::now());
    cs.tx_height = Some(1_234_567);
    cs.rx_seq = Some(9);
    cs.rx_height = Some(88);

    let stored = db.store().set_connection_state(&src, &dst, &cs).unwrap();
    assert!(stored.id.is_some());
    assert!(stored.same_observation(&cs));

    let fetched = db.store().get_connection_state(&src, &dst).unwrap().unwrap();
    assert_eq!(fetched, stored);
}

#[test]
fn test_identity_is_stable_across_updates() {
    let db = open_store();
    let (src, dst) = link();

    let first = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap();

    let mut online = unknown_state();
    online.tx_state = "online".into();
    assert!(online.id.is_none());
    let second = db.store().set_connection_state(&src, &dst, &online).unwrap();
    assert_eq!(second.id, first.id);

    // A wrong identity supplied by the caller is ignored too
    let bogus = online.clone().with_id(first.id.unwrap() + 100);
    let third = db.store().set_connection_state(&src, &dst, &bogus).unwrap();
    assert_eq!(third.id, first.id);

    let fetched = db.store().get_connection_state(&src, &dst).unwrap().unwrap();
    assert_eq!(fetched, online.with_id(first.id.unwrap()));
}

#[test]
fn test_identities_are_unique_per_pair() {
    let db = open_store();
    let (src, dst) = link();

    let forward = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap();
    let backward = db
        .store()
        .set_connection_state(&dst, &src, &unknown_state())
        .unwrap();
    assert_ne!(forward.id, backward.id);

    let links = db.store().list_connection_states().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].src, src);
    assert_eq!(links[0].dst, dst);
    assert_eq!(links[1].src, dst);
    assert_eq!(links[0].state, forward);
}

#[test]
fn test_tx_history() {
    let db = open_store();
    let (src, dst) = link();
    let cs = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap();
    let id = cs.id.unwrap();

    assert!(db.store().get_tx_records(id).unwrap().is_empty());

    let rec1 = db.store().add_tx_record(id, 3, Utc::now()).unwrap();
    assert_eq!(db.store().get_tx_records(id).unwrap(), vec![rec1.clone()]);

    let rec2 = db.store().add_tx_record(id, 4, Utc::now()).unwrap();
    assert_ne!(rec1.sn, rec2.sn);
    assert_eq!(
        db.store().get_tx_records(id).unwrap(),
        vec![rec1.clone(), rec2.clone()]
    );
    assert_eq!(db.store().count_tx_records(id).unwrap(), 2);

    assert!(db.store().delete_tx_record(rec1.sn).unwrap());
    assert!(db.store().delete_tx_record(rec2.sn).unwrap());
    assert!(db.store().get_tx_records(id).unwrap().is_empty());
}

#[test]
fn test_sn_is_unique_across_connections() {
    let db = open_store();
    let (src, dst) = link();
    let a = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap()
        .id
        .unwrap();
    let b = db
        .store()
        .set_connection_state(&dst, &src, &unknown_state())
        .unwrap()
        .id
        .unwrap();

    let mut sns = Vec::new();
    for i in 0..5 {
        sns.push(db.store().add_tx_record(a, i, Utc::now()).unwrap().sn);
        sns.push(db.store().add_tx_record(b, i, Utc::now()).unwrap().sn);
    }
    let mut deduped = sns.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), sns.len());

    // Each connection only sees its own records, oldest first
    let seqs: Vec<u64> = db
        .store()
        .get_tx_records(a)
        .unwrap()
        .iter()
        .map(|r| r.seq)
        .collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_add_to_unknown_connection_fails() {
    let db = open_store();
    let err = db.store().add_tx_record(42, 1, Utc::now()).unwrap_err();
    assert!(matches!(err, MonitorError::UnknownConnection(42)));
}

#[test]
fn test_delete_is_idempotent() {
    let db = open_store();
    let (src, dst) = link();
    let id = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap()
        .id
        .unwrap();

    let keep = db.store().add_tx_record(id, 1, Utc::now()).unwrap();
    let gone = db.store().add_tx_record(id, 2, Utc::now()).unwrap();

    assert!(db.store().delete_tx_record(gone.sn).unwrap());
    assert!(!db.store().delete_tx_record(gone.sn).unwrap());
    assert!(!db.store().delete_tx_record(9_999).unwrap());

    assert_eq!(db.store().get_tx_records(id).unwrap(), vec![keep]);
}

#[test]
fn test_failed_batch_rolls_back_everything() {
    let db = open_store();
    let (src, dst) = link();

    let result: std::result::Result<(), MonitorError> = db.store().run_batch(|batch| {
        let cs = batch.set_connection_state(&src, &dst, &unknown_state())?;
        batch.add_tx_record(cs.id.unwrap(), 3, Utc::now())?;
        batch.write_log(Utc::now(), "", "", LogKind::Log, &"staged".into())?;
        Err(MonitorError::InvalidState("poller failed".into()))
    });

    match result {
        Err(MonitorError::InvalidState(msg)) => assert_eq!(msg, "poller failed"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(db.store().get_connection_state(&src, &dst).unwrap().is_none());
    assert_eq!(db.store().stats().unwrap(), StoreStats::default());

    // Plain writes still work afterwards
    let mut v2 = ConnectionState::with_label("unknown2");
    let stored = db.store().set_connection_state(&src, &dst, &v2).unwrap();
    v2.id = stored.id;
    assert_eq!(
        db.store().get_connection_state(&src, &dst).unwrap(),
        Some(v2)
    );
}

#[test]
fn test_rollback_restores_previous_values() {
    let db = open_store();
    let (src, dst) = link();

    let before = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap();
    let id = before.id.unwrap();
    let existing = db.store().add_tx_record(id, 1, Utc::now()).unwrap();

    let result: std::result::Result<(), MonitorError> = db.store().run_batch(|batch| {
        batch.set_connection_state(&src, &dst, &ConnectionState::with_label("online"))?;
        batch.delete_tx_record(existing.sn)?;
        batch.add_tx_record(id, 2, Utc::now())?;
        Err(MonitorError::InvalidState("abort".into()))
    });
    assert!(result.is_err());

    assert_eq!(
        db.store().get_connection_state(&src, &dst).unwrap(),
        Some(before)
    );
    assert_eq!(db.store().get_tx_records(id).unwrap(), vec![existing]);
}

#[test]
fn test_successful_batch_commits_together() {
    let db = open_store();
    let (src, dst) = link();

    let initial = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap();

    let v2 = ConnectionState::with_label("unknown2");
    let (stored, record) = db
        .store()
        .run_batch(|batch| {
            let stored = batch.set_connection_state(&src, &dst, &v2)?;
            // Reads inside the batch see staged writes
            assert_eq!(
                batch.get_connection_state(&src, &dst)?.as_ref(),
                Some(&stored)
            );
            let record = batch.add_tx_record(stored.id.unwrap(), 3, Utc::now())?;
            Ok::<_, MonitorError>((stored, record))
        })
        .unwrap();

    assert_eq!(stored.id, initial.id);
    assert_eq!(
        db.store().get_connection_state(&src, &dst).unwrap(),
        Some(stored.clone())
    );
    assert_eq!(
        db.store().get_tx_records(stored.id.unwrap()).unwrap(),
        vec![record]
    );
}

#[test]
fn test_batch_returns_value() {
    let db = open_store();
    let n: usize = db
        .store()
        .run_batch(|batch| {
            for i in 0..3 {
                batch.write_log(Utc::now(), "", "", LogKind::Log, &Scalar::Int(i).into())?;
            }
            Ok::<_, MonitorError>(batch.writes())
        })
        .unwrap();
    assert_eq!(n, 3);
}

#[test]
fn test_logs() {
    let db = open_store();
    let now = Utc::now();

    db.store()
        .write_log(
            now,
            "0x7.icon",
            "0xaa36a7.eth2",
            LogKind::Tx,
            &LogPayload::map([("count", 3_i64)]),
        )
        .unwrap();
    db.store()
        .write_log(
            now,
            "0x7.icon",
            "0xaa36a7.eth2",
            LogKind::Rx,
            &LogPayload::map([("count", Scalar::Int(3)), ("delta", Scalar::Float(30.3))]),
        )
        .unwrap();
    db.store()
        .write_log(
            now,
            "0x7.icon",
            "0xaa36a7.eth2",
            LogKind::State,
            &LogPayload::map([("before", "good"), ("after", "bad")]),
        )
        .unwrap();
    db.store()
        .write_log(now, "", "", LogKind::Log, &"yahoo".into())
        .unwrap();

    let logs = db
        .store()
        .query_logs(&[LogKind::Tx, LogKind::Rx, LogKind::State, LogKind::Log])
        .unwrap();
    assert_eq!(logs.len(), 4);
    let logs = db.store().query_logs(&[LogKind::Tx, LogKind::Rx]).unwrap();
    assert_eq!(logs.len(), 2);
    let logs = db.store().query_logs(&[LogKind::State, LogKind::Log]).unwrap();
    assert_eq!(logs.len(), 2);

    // Insertion order and payloads survive storage
    assert_eq!(logs[0].kind, LogKind::State);
    assert_eq!(logs[0].payload.get("before"), Some(&Scalar::from("good")));
    assert_eq!(logs[1].payload, LogPayload::from("yahoo"));
    assert_eq!(logs[1].ts, now);
    assert!(logs[0].seq < logs[1].seq);

    assert!(db.store().query_logs(&[]).unwrap().is_empty());
}

#[test]
fn test_filtered_log_query() {
    let db = open_store();
    let t0 = Utc::now();
    let t1 = t0 + chrono::Duration::seconds(10);

    db.store()
        .write_log(t0, "a.icon-cx1", "b.eth2-0x1", LogKind::Tx, &"first".into())
        .unwrap();
    db.store()
        .write_log(t1, "a.icon-cx1", "b.eth2-0x1", LogKind::Tx, &"second".into())
        .unwrap();
    db.store()
        .write_log(t1, "b.eth2-0x1", "a.icon-cx1", LogKind::Tx, &"reverse".into())
        .unwrap();

    let q = LogQuery::kinds(&[LogKind::Tx]).with_link("a.icon-cx1", "b.eth2-0x1");
    assert_eq!(db.store().query_logs_filtered(&q).unwrap().len(), 2);

    let q = q.with_since(t1);
    let logs = db.store().query_logs_filtered(&q).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].payload, LogPayload::from("second"));

    let q = LogQuery::kinds(&[LogKind::Tx]).with_limit(1);
    let logs = db.store().query_logs_filtered(&q).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].payload, LogPayload::from("first"));
}

#[test]
fn test_stats() {
    let db = open_store();
    let (src, dst) = link();
    let id = db
        .store()
        .set_connection_state(&src, &dst, &unknown_state())
        .unwrap()
        .id
        .unwrap();
    db.store().add_tx_record(id, 1, Utc::now()).unwrap();
    db.store()
        .write_log(Utc::now(), "", "", LogKind::Log, &"hi".into())
        .unwrap();

    assert_eq!(
        db.store().stats().unwrap(),
        StoreStats {
            connections: 1,
            tx_records: 1,
            log_entries: 1,
        }
    );
}
