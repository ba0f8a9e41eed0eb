use bastion_core::models::{
    AuditKind, AuditRecord, Collection, DocumentChunk, DocumentMetadata, EmbeddingFingerprint, Phase,
    PhaseRecord, Session, SessionStatus,
};
use bastion_core::traits::{IAuditSink, IChunkStore, ISessionStore};
use bastion_storage::migrations::LATEST_VERSION;
use bastion_storage::StorageEngine;
use chrono::Utc;

fn chunk(collection: Collection, source: &str, offset: usize, text: &str) -> DocumentChunk {
    DocumentChunk {
        chunk_id: DocumentChunk::derive_id(collection, source, offset),
        collection,
        source_id: source.to_string(),
        text: text.to_string(),
        embedding_vector: vec![0.6, 0.8, 0.0],
        offset_in_source: offset,
        ingested_at: Utc::now(),
        metadata: Default::default(),
    }
}

// ── Migrations ──

#[tokio::test]
async fn migrations_reach_latest_version() {
    let engine = StorageEngine::open_in_memory().unwrap();
    assert_eq!(engine.schema_version().await.unwrap(), LATEST_VERSION);
}

#[tokio::test]
async fn reopening_a_file_does_not_reapply_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bastion.db");
    {
        let engine = StorageEngine::open(&path).unwrap();
        engine
            .replace_source("cve-2021-44228", &[chunk(Collection::Vulnerabilities, "cve-2021-44228", 0, "log4shell")])
            .await
            .unwrap();
    }
    let engine = StorageEngine::open(&path).unwrap();
    assert_eq!(engine.schema_version().await.unwrap(), LATEST_VERSION);
    assert_eq!(engine.chunk_count().await.unwrap(), 1);
}

// ── Chunks ──

#[tokio::test]
async fn replace_source_swaps_all_chunks() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let first = vec![
        chunk(Collection::Techniques, "kerberoast", 0, "request service tickets"),
        chunk(Collection::Techniques, "kerberoast", 20, "crack offline"),
        chunk(Collection::Techniques, "kerberoast", 40, "use rc4 downgrade"),
    ];
    engine.replace_source("kerberoast", &first).await.unwrap();
    assert_eq!(engine.chunk_count().await.unwrap(), 3);

    let second = vec![chunk(Collection::Techniques, "kerberoast", 0, "rewritten")];
    engine.replace_source("kerberoast", &second).await.unwrap();

    let loaded = engine.load_chunks().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "rewritten");
    assert_eq!(loaded[0].embedding_vector, vec![0.6, 0.8, 0.0]);
}

#[tokio::test]
async fn purge_and_remove_are_scoped() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine
        .replace_source("a", &[chunk(Collection::Tools, "a", 0, "nmap")])
        .await
        .unwrap();
    engine
        .replace_source("b", &[chunk(Collection::Reports, "b", 0, "q3 report")])
        .await
        .unwrap();
    engine
        .replace_source("c", &[chunk(Collection::Tools, "c", 0, "ffuf")])
        .await
        .unwrap();

    assert_eq!(engine.purge_collection(Collection::Tools).await.unwrap(), 2);
    assert_eq!(engine.remove_source("missing").await.unwrap(), 0);
    assert_eq!(engine.remove_source("b").await.unwrap(), 1);
    assert_eq!(engine.chunk_count().await.unwrap(), 0);
}

#[tokio::test]
async fn reset_clears_chunks_and_stamps_fingerprint() {
    let engine = StorageEngine::open_in_memory().unwrap();
    assert!(engine.load_fingerprint().await.unwrap().is_none());

    let old = EmbeddingFingerprint::new("hashed", "v1", 128);
    engine.store_fingerprint(&old).await.unwrap();
    engine
        .replace_source("a", &[chunk(Collection::General, "a", 0, "x")])
        .await
        .unwrap();

    let new = EmbeddingFingerprint::new("hashed", "v1", 256);
    engine.reset(&new).await.unwrap();
    assert_eq!(engine.chunk_count().await.unwrap(), 0);
    assert_eq!(engine.load_fingerprint().await.unwrap(), Some(new));
}

#[tokio::test]
async fn chunk_metadata_survives_reload() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let meta = DocumentMetadata::default()
        .with_title("Apache path traversal")
        .with_origin("nvd")
        .with_tags(["web", "apache"]);
    let mut tagged = chunk(Collection::ThreatIntel, "cve-2021-41773", 0, "traversal");
    tagged.metadata = meta.clone();
    engine.replace_source("cve-2021-41773", &[tagged]).await.unwrap();
    engine
        .replace_source("b", &[chunk(Collection::General, "b", 0, "y")])
        .await
        .unwrap();

    let loaded = engine.load_chunks().await.unwrap();
    let by_source = |id: &str| loaded.iter().find(|c| c.source_id == id).unwrap();
    assert_eq!(by_source("cve-2021-41773").metadata, meta);
    assert_eq!(by_source("b").metadata, DocumentMetadata::default());
}

// ── Sessions ──

#[tokio::test]
async fn session_transcript_persists_in_order() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut session = Session::new("target.com");
    engine.save_session(&session).await.unwrap();

    let records = [
        PhaseRecord::completed(Phase::Reconnaissance, "map hosts", "3 hosts"),
        PhaseRecord::skipped(Phase::VulnerabilityIdentification),
        PhaseRecord::completed(Phase::ExploitationAnalysis, "assess", "rce likely"),
    ];
    engine.append_phases(&session, 0, &records).await.unwrap();

    let active = engine.load_active_sessions().await.unwrap();
    assert_eq!(active.len(), 1);
    let phases: Vec<Phase> = active[0].phase_history.iter().map(|r| r.phase_name).collect();
    assert_eq!(
        phases,
        vec![
            Phase::Reconnaissance,
            Phase::VulnerabilityIdentification,
            Phase::ExploitationAnalysis
        ]
    );
    assert!(active[0].phase_history[1].skipped);

    session.status = SessionStatus::Completed;
    session.final_report = Some("report".into());
    engine.save_session(&session).await.unwrap();
    assert!(engine.load_active_sessions().await.unwrap().is_empty());

    let loaded = engine
        .load_session(&session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status, SessionStatus::Completed);
    assert_eq!(loaded.final_report.as_deref(), Some("report"));
    assert_eq!(loaded.phase_history.len(), 3);
}

#[tokio::test]
async fn duplicate_transcript_position_is_rejected() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let session = Session::new("10.0.0.5");
    engine.save_session(&session).await.unwrap();
    let record = PhaseRecord::completed(Phase::Reconnaissance, "d", "a");
    engine.append_phases(&session, 0, &[record.clone()]).await.unwrap();
    assert!(engine.append_phases(&session, 0, &[record]).await.is_err());
}

#[tokio::test]
async fn failed_append_writes_nothing() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let session = Session::new("10.0.0.6");
    engine.save_session(&session).await.unwrap();
    engine
        .append_phases(
            &session,
            1,
            &[PhaseRecord::completed(Phase::VulnerabilityIdentification, "d", "a")],
        )
        .await
        .unwrap();

    // seq 0 inserts, seq 1 collides: the whole batch and header roll back.
    let mut touched = session.clone();
    touched.final_report = Some("partial".into());
    let batch = [
        PhaseRecord::completed(Phase::Reconnaissance, "d", "a"),
        PhaseRecord::completed(Phase::VulnerabilityIdentification, "d", "a"),
    ];
    assert!(engine.append_phases(&touched, 0, &batch).await.is_err());

    let loaded = engine
        .load_session(&session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.phase_history.len(), 1);
    assert_eq!(loaded.final_report, None);
}

// ── Audit ──

#[tokio::test]
async fn audit_records_are_queryable_by_subject() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine
        .record(AuditRecord::new(
            AuditKind::RoutingDecision,
            "task-1",
            serde_json::json!({"selections": ["pentest_reasoning"]}),
        ))
        .await
        .unwrap();
    engine
        .record(AuditRecord::new(
            AuditKind::CombinedResult,
            "task-1",
            serde_json::json!({"status": "ok"}),
        ))
        .await
        .unwrap();

    let trail = engine.audit_trail("task-1").await.unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].kind, AuditKind::RoutingDecision);
    assert_eq!(trail[1].payload["status"], "ok");
    assert_eq!(engine.audit_count(AuditKind::CombinedResult).await.unwrap(), 1);
}

#[tokio::test]
async fn audit_log_and_transcript_reject_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.db");
    let engine = StorageEngine::open(&path).unwrap();
    let session = Session::new("target.com");
    engine.save_session(&session).await.unwrap();
    engine
        .append_phases(
            &session,
            0,
            &[PhaseRecord::completed(Phase::Reconnaissance, "d", "a")],
        )
        .await
        .unwrap();
    engine
        .record(AuditRecord::new(AuditKind::SessionTransition, &session.session_id, serde_json::json!({})))
        .await
        .unwrap();

    let raw = rusqlite::Connection::open(&path).unwrap();
    assert!(raw.execute("UPDATE audit_log SET kind = 'x'", []).is_err());
    assert!(raw.execute("DELETE FROM audit_log", []).is_err());
    assert!(raw
        .execute("UPDATE phase_records SET output_analysis = 'tampered'", [])
        .is_err());
    assert!(raw.execute("DELETE FROM phase_records", []).is_err());
}
