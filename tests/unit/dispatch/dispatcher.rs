use super::*;
use crate::dispatch::job::RecordingInvoker;
use crate::foundation::core::Row;
use crate::io::store::MemoryStore;
use crate::scene::model::{InputSpec, OutputSpec, Scene};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn input(id: &str, position: Option<[i64; 2]>) -> InputSpec {
    InputSpec {
        part_id: id.to_string(),
        size: [640, 360],
        volume: 1.0,
        panning: 0.0,
        offset: 0,
        position,
        pan: position.map(|_| 0.0),
    }
}

fn definition(inputs: Vec<InputSpec>, scenes: Option<Vec<Scene>>) -> SceneDefinition {
    SceneDefinition {
        choir_id: "c".to_string(),
        song_id: "s".to_string(),
        output: OutputSpec {
            size: [1920, 1080],
            reverb: 0.1,
            reverb_type: "hall".to_string(),
            panning: true,
            watermark: None,
        },
        inputs,
        scenes,
    }
}

fn three_rows() -> Vec<InputSpec> {
    vec![
        input("a", Some([0, 0])),
        input("b", Some([640, 0])),
        input("c", Some([0, 360])),
        input("d", None),
        input("e", None),
    ]
}

fn dispatcher(invoker: Arc<dyn JobInvoker>) -> Dispatcher {
    Dispatcher::new(Arc::new(MemoryStore::new()), invoker, &DispatchOpts::default()).unwrap()
}

#[test]
fn implicit_scene_yields_one_job_per_distinct_row() {
    let run = RunId::new();
    let jobs = plan_jobs("c+s+auto.json", &definition(three_rows(), None), &run);
    let rows = jobs.iter().map(|j| j.row_num).collect::<Vec<_>>();
    assert_eq!(rows, vec![Row::Unpositioned, Row::At(0), Row::At(360)]);
    assert!(jobs.iter().all(|j| j.scene_id == 1));
    assert!(jobs.iter().all(|j| j.run_id == run));
    assert!(jobs.iter().all(|j| j.compositor == "combined"));
    assert!(jobs.iter().all(|j| j.key == "c+s+auto.json" && j.definition_key == j.key));
    let expected = fingerprint_rows([Row::At(360), Row::Unpositioned, Row::At(0)]);
    assert!(jobs.iter().all(|j| j.rows_hash == expected));
}

#[test]
fn each_scene_gets_its_own_fingerprint() {
    let two_rows = vec![input("a", Some([0, 0])), input("b", Some([0, 540]))];
    let scenes = vec![
        Scene {
            scene_id: 1,
            inputs: two_rows.clone(),
        },
        Scene {
            scene_id: 2,
            inputs: three_rows(),
        },
    ];
    let def = definition(three_rows(), Some(scenes));
    let jobs = plan_jobs("c+s+auto.json", &def, &RunId::new());
    assert_eq!(jobs.len(), 5);

    let first = fingerprint_rows([Row::At(0), Row::At(540)]);
    let second = fingerprint_rows([Row::Unpositioned, Row::At(0), Row::At(360)]);
    for job in &jobs {
        let want = if job.scene_id == 1 { &first } else { &second };
        assert_eq!(&job.rows_hash, want);
    }
    assert_eq!(jobs.iter().filter(|j| j.scene_id == 1).count(), 2);
}

#[test]
fn row_at_minus_one_shares_the_unpositioned_job() {
    let inputs = vec![
        input("a", Some([460, -1])),
        input("b", Some([460, 545])),
        input("h", None),
    ];
    let jobs = plan_jobs("c+s+auto.json", &definition(inputs, None), &RunId::new());
    let rows = jobs.iter().map(|j| j.row_num.wire()).collect::<Vec<_>>();
    assert_eq!(rows, vec![-1, 545]);
    // printf '%s' '-1-545' | sha1sum
    assert!(jobs.iter().all(|j| j.rows_hash.as_str() == "bea3232c"));
    let keys = jobs
        .iter()
        .map(|j| j.row_part_key().unwrap().to_string())
        .collect::<HashSet<_>>();
    assert_eq!(keys.len(), 2);
}

#[test]
fn negative_rows_plan_in_numeric_order() {
    let inputs = vec![
        input("a", Some([0, 0])),
        input("h", None),
        input("b", Some([0, -5])),
    ];
    let jobs = plan_jobs("c+s+auto.json", &definition(inputs, None), &RunId::new());
    let rows = jobs.iter().map(|j| j.row_num.wire()).collect::<Vec<_>>();
    assert_eq!(rows, vec![-5, -1, 0]);
}

#[test]
fn scenes_with_equal_rows_write_distinct_row_parts() {
    let one_row = vec![input("a", Some([0, 10]))];
    let scenes = vec![
        Scene {
            scene_id: 1,
            inputs: one_row.clone(),
        },
        Scene {
            scene_id: 2,
            inputs: one_row.clone(),
        },
    ];
    let def = definition(one_row.clone(), Some(scenes));
    let jobs = plan_jobs("c+s+auto.json", &def, &RunId::new());
    let keys = jobs
        .iter()
        .map(|j| j.row_part_key().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].def_id, "auto-s1");
    assert_eq!(keys[1].def_id, "auto-s2");

    // a single scene keeps the bare definition id
    let single = plan_jobs("c+s+auto.json", &definition(one_row, None), &RunId::new());
    assert_eq!(single[0].row_part_key().unwrap().def_id, "auto");
}

#[test]
fn duplicate_scene_ids_are_rejected() {
    let scenes = vec![
        Scene {
            scene_id: 3,
            inputs: three_rows(),
        },
        Scene {
            scene_id: 3,
            inputs: three_rows(),
        },
    ];
    let invoker = Arc::new(RecordingInvoker::new());
    let err = dispatcher(invoker.clone())
        .dispatch("c+s+auto.json", &definition(vec![], Some(scenes)))
        .unwrap_err();
    assert!(matches!(err, RenderError::Validation(_)));
    assert!(invoker.jobs().is_empty());
}

#[test]
fn fingerprint_does_not_depend_on_run() {
    let def = definition(three_rows(), None);
    let a = plan_jobs("k+s+auto.json", &def, &RunId::new());
    let b = plan_jobs("k+s+auto.json", &def, &RunId::new());
    assert_eq!(a[0].rows_hash, b[0].rows_hash);
    assert_ne!(a[0].run_id, b[0].run_id);
}

#[test]
fn dispatch_acknowledges_every_job_under_one_run() {
    let invoker = Arc::new(RecordingInvoker::new());
    let receipt = dispatcher(invoker.clone())
        .dispatch("c+s+auto.json", &definition(three_rows(), None))
        .unwrap();
    assert_eq!(receipt.activation_ids.len(), 3);
    assert_eq!(receipt.jobs.len(), 3);
    assert_eq!(
        receipt.activation_ids.iter().collect::<HashSet<_>>().len(),
        3
    );
    let submitted = invoker.jobs();
    assert_eq!(submitted.len(), 3);
    assert!(submitted.iter().all(|j| j.run_id == receipt.run_id));
}

#[test]
fn each_dispatch_mints_a_fresh_run() {
    let d = dispatcher(Arc::new(RecordingInvoker::new()));
    let def = definition(three_rows(), None);
    let a = d.dispatch("c+s+auto.json", &def).unwrap();
    let b = d.dispatch("c+s+auto.json", &def).unwrap();
    assert_ne!(a.run_id, b.run_id);
}

struct RejectRow {
    row: Row,
    accepted: Mutex<Vec<Row>>,
}

impl JobInvoker for RejectRow {
    fn submit(&self, job: &RenderJob) -> RenderResult<ActivationId> {
        if job.row_num == self.row {
            return Err(RenderError::submission("transport refused"));
        }
        self.accepted.lock().unwrap().push(job.row_num);
        Ok(ActivationId(format!("ok-{}", job.row_num)))
    }
}

#[test]
fn one_rejection_fails_the_whole_dispatch() {
    let invoker = Arc::new(RejectRow {
        row: Row::At(360),
        accepted: Mutex::new(Vec::new()),
    });
    let err = dispatcher(invoker.clone())
        .dispatch("c+s+auto.json", &definition(three_rows(), None))
        .unwrap_err();
    assert!(matches!(err, RenderError::Submission(_)));
    assert!(err.to_string().contains("1 of 3"));
    // siblings that were accepted are not retracted
    assert_eq!(invoker.accepted.lock().unwrap().len(), 2);
}

struct SlowInvoker {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl JobInvoker for SlowInvoker {
    fn submit(&self, job: &RenderJob) -> RenderResult<ActivationId> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(40));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ActivationId(job.row_num.to_string()))
    }
}

#[test]
fn submissions_run_concurrently() {
    let inputs = (0..8)
        .map(|i| input(&format!("p{i}"), Some([0, i * 100])))
        .collect();
    let invoker = Arc::new(SlowInvoker {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let d = Dispatcher::new(
        Arc::new(MemoryStore::new()),
        invoker.clone(),
        &DispatchOpts { threads: Some(4) },
    )
    .unwrap();
    let receipt = d.dispatch("c+s+auto.json", &definition(inputs, None)).unwrap();
    assert_eq!(receipt.activation_ids.len(), 8);
    assert!(invoker.peak.load(Ordering::SeqCst) >= 2);
}

#[test]
fn empty_definition_dispatches_nothing() {
    let invoker = Arc::new(RecordingInvoker::new());
    let receipt = dispatcher(invoker.clone())
        .dispatch("c+s+auto.json", &definition(vec![], None))
        .unwrap();
    assert!(receipt.activation_ids.is_empty());
    assert!(invoker.jobs().is_empty());
}

#[test]
fn dispatch_key_reads_the_stored_definition() {
    let store = Arc::new(MemoryStore::new());
    store
        .put("c+s+auto.json", &definition(three_rows(), None).to_vec().unwrap())
        .unwrap();
    let d = Dispatcher::new(
        store,
        Arc::new(RecordingInvoker::new()),
        &DispatchOpts::default(),
    )
    .unwrap();
    let receipt = d.dispatch_key("c+s+auto.json").unwrap();
    assert_eq!(receipt.definition_key, "c+s+auto.json");
    assert_eq!(receipt.activation_ids.len(), 3);
}

#[test]
fn dispatch_key_error_taxonomy() {
    let store = Arc::new(MemoryStore::new());
    store.put("bad+s+auto.json", b"not json").unwrap();
    let d = Dispatcher::new(
        store,
        Arc::new(RecordingInvoker::new()),
        &DispatchOpts::default(),
    )
    .unwrap();
    assert!(matches!(
        d.dispatch_key("").unwrap_err(),
        RenderError::MissingParameter("definition_key")
    ));
    assert!(matches!(
        d.dispatch_key("gone+s+auto.json").unwrap_err(),
        RenderError::Storage(_)
    ));
    assert!(matches!(
        d.dispatch_key("bad+s+auto.json").unwrap_err(),
        RenderError::Serde(_)
    ));
}

#[test]
fn zero_threads_is_rejected() {
    let err = Dispatcher::new(
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingInvoker::new()),
        &DispatchOpts { threads: Some(0) },
    )
    .err()
    .unwrap();
    assert!(matches!(err, RenderError::Validation(_)));
}
