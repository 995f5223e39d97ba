use super::*;
use serde_json::json;

#[test]
fn role_wire_names_are_screaming_case() {
    assert_eq!(serde_json::to_value(Role::Teacher).unwrap(), json!("TEACHER"));
    let role: Role = serde_json::from_value(json!("STUDENT")).unwrap();
    assert_eq!(role, Role::Student);
    assert!(serde_json::from_value::<Role>(json!("JANITOR")).is_err());
}

#[test]
fn role_parse_is_case_insensitive() {
    assert_eq!(Role::parse("admin"), Some(Role::Admin));
    assert_eq!(Role::parse(" Teacher "), Some(Role::Teacher));
    assert_eq!(Role::parse("guest"), None);
    assert_eq!(Role::Student.to_string(), "STUDENT");
}

#[test]
fn user_decodes_camel_case_and_ignores_extras() {
    let user: User = serde_json::from_value(json!({
        "id": 7,
        "username": "lwang",
        "role": "TEACHER",
        "realName": "Li Wang",
        "enabled": true,
        "createTime": "2024-01-01 08:00:00"
    }))
    .unwrap();
    assert_eq!(user.id, Some(7));
    assert_eq!(user.real_name.as_deref(), Some("Li Wang"));
    assert_eq!(user.display_name(), "Li Wang");
}

#[test]
fn user_with_only_role_decodes() {
    let user: User = serde_json::from_value(json!({ "role": "TEACHER" })).unwrap();
    assert_eq!(user.role, Role::Teacher);
    assert_eq!(user.id, None);
    assert_eq!(user.display_name(), "");
}

#[test]
fn login_payload_accepts_user_info_alias() {
    let payload: LoginPayload = serde_json::from_value(json!({
        "token": "T",
        "userInfo": { "id": 1, "username": "admin", "role": "ADMIN" }
    }))
    .unwrap();
    assert_eq!(payload.token.as_deref(), Some("T"));
    assert_eq!(payload.user.map(|u| u.role), Some(Role::Admin));
}

#[test]
fn envelope_without_data_decodes() {
    let env: Envelope<Course> = serde_json::from_value(json!({ "code": 500, "message": "boom" })).unwrap();
    assert!(!env.is_ok());
    assert_eq!(env.data, None);
    assert_eq!(env.message.as_deref(), Some("boom"));
}

fn decode_envelope<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Envelope<T> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn envelope_decodes_payloads_without_default() {
    let env: Envelope<Course> = decode_envelope(json!({ "code": 200, "data": { "id": 3, "name": "Compilers" } }));
    assert_eq!(env.data.map(|c| c.name).as_deref(), Some("Compilers"));

    let env: Envelope<User> = decode_envelope(json!({ "code": 200, "data": null }));
    assert!(env.is_ok());
    assert_eq!(env.data, None);
}

#[test]
fn course_input_skips_absent_fields() {
    let input = CourseInput { name: "Compilers".into(), description: None, teacher_id: Some(3) };
    assert_eq!(serde_json::to_value(&input).unwrap(), json!({ "name": "Compilers", "teacherId": 3 }));
}

#[test]
fn submission_accepts_homework_id_alias() {
    let sub: Submission = serde_json::from_value(json!({ "id": 4, "homeworkId": 9, "score": 88 })).unwrap();
    assert_eq!(sub.assignment_id, Some(9));
    assert_eq!(sub.score, Some(88));
}
