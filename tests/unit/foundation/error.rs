use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RenderError::MissingParameter("song_id")
            .to_string()
            .contains("missing parameter: song_id")
    );
    assert!(
        RenderError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        RenderError::submission("x")
            .to_string()
            .contains("submission error:")
    );
    assert!(
        RenderError::storage("x")
            .to_string()
            .contains("storage error:")
    );
    assert!(
        RenderError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn only_missing_parameter_is_expected() {
    assert!(RenderError::MissingParameter("choir_id").is_expected());
    assert!(!RenderError::submission("rejected").is_expected());
    assert!(!RenderError::storage("gone").is_expected());
}

#[test]
fn json_errors_map_to_serde() {
    let err: RenderError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, RenderError::Serde(_)));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RenderError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
