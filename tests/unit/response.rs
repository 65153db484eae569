use super::*;
use crate::foundation::error::RenderError;
use crate::identity::fingerprint::RunId;
use crate::dispatch::job::ActivationId;

#[test]
fn nothing_to_do_is_not_ok_but_not_an_error() {
    let resp = ActionResponse::from_layout(Ok(StoredLayout::NothingToDo)).unwrap();
    assert!(!resp.ok);
    assert_eq!(resp.message.as_deref(), Some("nothing to do"));
}

#[test]
fn missing_parameters_are_not_ok() {
    let resp =
        ActionResponse::from_layout(Err(RenderError::MissingParameter("song_id"))).unwrap();
    assert!(!resp.ok);
    assert!(resp.message.unwrap().contains("song_id"));

    let resp =
        ActionResponse::from_dispatch(Err(RenderError::MissingParameter("definition_key")))
            .unwrap();
    assert!(!resp.ok);
}

#[test]
fn unexpected_errors_propagate() {
    let err = ActionResponse::from_dispatch(Err(RenderError::submission("refused"))).unwrap_err();
    assert!(matches!(err, RenderError::Submission(_)));
    let err = ActionResponse::from_layout(Err(RenderError::storage("down"))).unwrap_err();
    assert!(matches!(err, RenderError::Storage(_)));
}

#[test]
fn dispatch_response_flattens_receipt() {
    let receipt = DispatchReceipt {
        run_id: RunId::from_token("abcd0123").unwrap(),
        definition_key: "c+s+auto.json".to_string(),
        activation_ids: vec![ActivationId("a1".to_string())],
        jobs: vec![],
    };
    let resp = ActionResponse::from_dispatch(Ok(receipt)).unwrap();
    let v = serde_json::to_value(&resp).unwrap();
    assert_eq!(v["ok"], true);
    assert_eq!(v["message"], "spawned children");
    assert_eq!(v["run_id"], "abcd0123");
    assert_eq!(v["definition_key"], "c+s+auto.json");
    assert_eq!(v["activation_ids"][0], "a1");
    assert!(v.get("jobs").is_none());
}
