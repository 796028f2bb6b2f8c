use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RevlapseError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        RevlapseError::timestamp("x")
            .to_string()
            .contains("timestamp error:")
    );
    assert!(RevlapseError::fetch("x").to_string().contains("fetch error:"));
    assert!(
        RevlapseError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        RevlapseError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn unsupported_format_lists_sorted_extensions() {
    let err = RevlapseError::unsupported_format(".docx", [".png", ".pdf"]);
    assert_eq!(
        err.to_string(),
        "unsupported file type '.docx'. Must be one of: .pdf, .png"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RevlapseError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
