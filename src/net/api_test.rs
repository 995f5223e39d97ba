use super::*;
use serde_json::json;

fn envelope<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Envelope<T> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn endpoints_format_expected_paths() {
    assert_eq!(course_endpoint(3), "/courses/3");
    assert_eq!(course_student_endpoint(3, 9), "/courses/3/students/9");
    assert_eq!(homework_endpoint(12), "/assignments/12");
    assert_eq!(resource_download_endpoint(5), "/resource/5/download");
    assert_eq!(submit_endpoint(12), "/assignments/student/12/submit");
    assert_eq!(grade_endpoint(40), "/homework-submissions/40/grade");
}

#[test]
fn into_data_unwraps_ok_envelope() {
    let env: Envelope<Vec<String>> = envelope(json!({ "code": 200, "data": ["CS-1", "CS-2"] }));
    assert_eq!(into_data(env).unwrap(), vec!["CS-1".to_owned(), "CS-2".to_owned()]);
}

#[test]
fn into_data_rejects_failure_code() {
    let env: Envelope<Course> = envelope(json!({ "code": 500, "message": "course name taken" }));
    let err = into_data(env).unwrap_err();
    assert!(matches!(err, ApiError::Rejected { code: 500, ref message } if message.as_deref() == Some("course name taken")));
}

#[test]
fn into_data_requires_data() {
    let env: Envelope<Course> = envelope(json!({ "code": 200, "message": "ok" }));
    assert!(matches!(into_data(env), Err(ApiError::Decode(_))));
}

#[test]
fn into_unit_ignores_missing_data() {
    let env: Envelope<Value> = envelope(json!({ "code": 200, "message": "操作成功" }));
    assert!(into_unit(env).is_ok());
}

#[test]
fn not_enrolled_query_skips_empty_filters() {
    assert!(not_enrolled_query(None, None).is_empty());
    assert_eq!(not_enrolled_query(Some("li"), Some("")), vec![("keyword", "li")]);
    assert_eq!(
        not_enrolled_query(Some("li"), Some("CS-2")),
        vec![("keyword", "li"), ("classname", "CS-2")]
    );
}
