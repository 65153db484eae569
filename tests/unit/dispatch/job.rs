use super::*;
use crate::identity::fingerprint::fingerprint_rows;

fn job(row: Row) -> RenderJob {
    RenderJob {
        row_num: row,
        run_id: RunId::from_token("0badc0de").unwrap(),
        rows_hash: fingerprint_rows([Row::Unpositioned, Row::At(0)]),
        compositor: COMBINED_COMPOSITOR.to_string(),
        key: "c+s+auto.json".to_string(),
        definition_key: "c+s+auto.json".to_string(),
        scene_id: 1,
        scene_scoped: false,
    }
}

#[test]
fn payload_matches_wire_shape() {
    let payload = job(Row::Unpositioned).to_payload().unwrap();
    let obj = payload.as_object().unwrap();
    let mut keys = obj.keys().map(String::as_str).collect::<Vec<_>>();
    keys.sort();
    assert_eq!(
        keys,
        vec!["compositor", "definition_key", "key", "row_num", "rows_hash", "run_id"]
    );
    assert_eq!(payload["row_num"], -1);
    assert_eq!(payload["run_id"], "0badc0de");
    assert_eq!(payload["compositor"], "combined");
}

#[test]
fn row_part_key_comes_from_definition_key() {
    let j = job(Row::At(0));
    let key = j.row_part_key().unwrap().to_string();
    assert_eq!(key, format!("c+s+auto+0badc0de+0@{}.nut", j.rows_hash));
}

#[test]
fn recording_invoker_hands_out_distinct_activation_ids() {
    let invoker = RecordingInvoker::new();
    let a = invoker.submit(&job(Row::At(0))).unwrap();
    let b = invoker.submit(&job(Row::Unpositioned)).unwrap();
    assert_ne!(a, b);
    assert_eq!(invoker.jobs().len(), 2);
}

#[test]
fn spool_invoker_writes_one_payload_file_per_job() {
    let dir = PathBuf::from("target").join("spool_tests").join("one_file");
    let _ = std::fs::remove_dir_all(&dir);
    let invoker = SpoolInvoker::new(&dir);
    let id = invoker.submit(&job(Row::At(0))).unwrap();
    let body = std::fs::read(dir.join(&id.0)).unwrap();
    let back: RenderJob = serde_json::from_slice(&body).unwrap();
    assert_eq!(back.row_num, Row::At(0));
    assert_eq!(back.definition_key, "c+s+auto.json");
}
