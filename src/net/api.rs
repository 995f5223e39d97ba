//! Typed REST bindings for courses, homework, resources and submissions.
//!
//! Every call goes through [`ApiClient`], so auth injection and failure
//! classification apply uniformly. JSON replies arrive wrapped in
//! [`Envelope`]; a non-200 envelope code becomes [`ApiError::Rejected`].

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::state::session::AuthBackend;

use super::download::BinaryResponse;
use super::error::ApiError;
use super::http::ApiClient;
use super::types::{
    Course, CourseInput, Credentials, Envelope, GradeInput, Homework, HomeworkInput, LoginPayload, Registration,
    Resource, Student, Submission, SubmissionInput, User,
};

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Credential check. A 401 here means bad credentials, not an expired session.
pub const LOGIN_ENDPOINT: &str = "/auth/login";

fn course_endpoint(course_id: i64) -> String {
    format!("/courses/{course_id}")
}

fn course_student_endpoint(course_id: i64, student_id: i64) -> String {
    format!("/courses/{course_id}/students/{student_id}")
}

fn homework_endpoint(homework_id: i64) -> String {
    format!("/assignments/{homework_id}")
}

fn resource_download_endpoint(resource_id: i64) -> String {
    format!("/resource/{resource_id}/download")
}

fn submit_endpoint(homework_id: i64) -> String {
    format!("/assignments/student/{homework_id}/submit")
}

fn grade_endpoint(submission_id: i64) -> String {
    format!("/homework-submissions/{submission_id}/grade")
}

// =============================================================================
// ENVELOPES
// =============================================================================

fn check<T>(envelope: Envelope<T>) -> Result<Option<T>, ApiError> {
    if envelope.is_ok() {
        return Ok(envelope.data);
    }
    tracing::warn!(code = envelope.code, server_message = envelope.message.as_deref(), "request rejected");
    Err(ApiError::Rejected { code: envelope.code, message: envelope.message })
}

fn into_data<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    check(envelope)?.ok_or_else(|| ApiError::Decode("response envelope carried no data".to_owned()))
}

fn into_unit(envelope: Envelope<Value>) -> Result<(), ApiError> {
    check(envelope).map(|_| ())
}

// =============================================================================
// AUTH
// =============================================================================

/// Post credentials to `/auth/login` and return the raw envelope.
///
/// # Errors
///
/// Returns a classified [`ApiError`] if the request fails.
pub async fn login(client: &ApiClient, credentials: &Credentials) -> Result<Envelope<LoginPayload>, ApiError> {
    client.post(LOGIN_ENDPOINT, credentials).await
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Envelope<LoginPayload>, ApiError> {
        login(self, credentials).await
    }
}

/// Create an account via `/auth/register`.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn register(client: &ApiClient, registration: &Registration) -> Result<(), ApiError> {
    into_unit(client.post("/auth/register", registration).await?)
}

/// Fetch the account behind the current token.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn current_user(client: &ApiClient) -> Result<User, ApiError> {
    into_data(client.get("/auth/current-user").await?)
}

/// Tell the backend the session is over, then clear it locally.
///
/// The local logout happens even when the backend call fails.
pub async fn logout(client: &ApiClient) {
    if client.session().is_authenticated() {
        if let Err(error) = client.post_empty::<Envelope<Value>>("/auth/logout").await {
            tracing::warn!(%error, "backend logout failed; clearing local session anyway");
        }
    }
    client.session().logout();
}

// =============================================================================
// COURSES
// =============================================================================

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn list_courses(client: &ApiClient) -> Result<Vec<Course>, ApiError> {
    into_data(client.get("/courses/all").await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn get_course(client: &ApiClient, course_id: i64) -> Result<Course, ApiError> {
    into_data(client.get(&course_endpoint(course_id)).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn create_course(client: &ApiClient, input: &CourseInput) -> Result<Course, ApiError> {
    into_data(client.post("/courses", input).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn update_course(client: &ApiClient, course_id: i64, input: &CourseInput) -> Result<Course, ApiError> {
    into_data(client.put(&course_endpoint(course_id), input).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn delete_course(client: &ApiClient, course_id: i64) -> Result<(), ApiError> {
    into_unit(client.delete(&course_endpoint(course_id)).await?)
}

/// Enroll the current student in a course.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn select_course(client: &ApiClient, course_id: i64) -> Result<(), ApiError> {
    into_unit(client.post_empty(&format!("{}/select", course_endpoint(course_id))).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn drop_course(client: &ApiClient, course_id: i64) -> Result<(), ApiError> {
    into_unit(client.post_empty(&format!("{}/drop", course_endpoint(course_id))).await?)
}

/// Courses a student is enrolled in.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn student_courses(client: &ApiClient, student_id: i64) -> Result<Vec<Course>, ApiError> {
    into_data(client.get(&format!("/courses/student/{student_id}")).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn course_students(client: &ApiClient, course_id: i64) -> Result<Vec<Student>, ApiError> {
    into_data(client.get(&format!("{}/students", course_endpoint(course_id))).await?)
}

/// Students not yet in the course, optionally filtered by keyword and class.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn students_not_in_course(
    client: &ApiClient,
    course_id: i64,
    keyword: Option<&str>,
    classname: Option<&str>,
) -> Result<Vec<Student>, ApiError> {
    let query = not_enrolled_query(keyword, classname);
    let path = format!("{}/students/not-enrolled", course_endpoint(course_id));
    into_data(client.get_with_query(&path, &query).await?)
}

fn not_enrolled_query<'a>(keyword: Option<&'a str>, classname: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
    [("keyword", keyword), ("classname", classname)]
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
        .collect()
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn add_student(client: &ApiClient, course_id: i64, student_id: i64) -> Result<(), ApiError> {
    into_unit(client.post_empty(&course_student_endpoint(course_id, student_id)).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn remove_student(client: &ApiClient, course_id: i64, student_id: i64) -> Result<(), ApiError> {
    into_unit(client.delete(&course_student_endpoint(course_id, student_id)).await?)
}

/// Enroll every student of a class in one call.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn add_students_by_class(client: &ApiClient, course_id: i64, classname: &str) -> Result<(), ApiError> {
    let body = serde_json::json!({ "classname": classname });
    into_unit(client.post(&format!("{}/students/class", course_endpoint(course_id)), &body).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn class_names(client: &ApiClient) -> Result<Vec<String>, ApiError> {
    into_data(client.get("/courses/classnames").await?)
}

// =============================================================================
// HOMEWORK
// =============================================================================

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn list_course_homework(client: &ApiClient, course_id: i64) -> Result<Vec<Homework>, ApiError> {
    into_data(client.get(&format!("/assignments/course/{course_id}")).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn get_homework(client: &ApiClient, homework_id: i64) -> Result<Homework, ApiError> {
    into_data(client.get(&homework_endpoint(homework_id)).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn create_homework(client: &ApiClient, input: &HomeworkInput) -> Result<Homework, ApiError> {
    into_data(client.post("/assignments", input).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn update_homework(client: &ApiClient, homework_id: i64, input: &HomeworkInput) -> Result<Homework, ApiError> {
    into_data(client.put(&homework_endpoint(homework_id), input).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn delete_homework(client: &ApiClient, homework_id: i64) -> Result<(), ApiError> {
    into_unit(client.delete(&homework_endpoint(homework_id)).await?)
}

// =============================================================================
// RESOURCES
// =============================================================================

/// File contents for an upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn list_course_resources(client: &ApiClient, course_id: i64) -> Result<Vec<Resource>, ApiError> {
    into_data(client.get(&format!("/resource/course/{course_id}")).await?)
}

/// Upload a course resource as `multipart/form-data`.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn upload_resource(
    client: &ApiClient,
    course_id: i64,
    name: &str,
    description: Option<&str>,
    file: UploadFile,
) -> Result<Resource, ApiError> {
    let part = Part::bytes(file.bytes).file_name(file.file_name);
    let mut form = Form::new()
        .part("file", part)
        .text("courseId", course_id.to_string())
        .text("name", name.to_owned());
    if let Some(description) = description {
        form = form.text("description", description.to_owned());
    }
    into_data(client.send_multipart("/resource", form).await?)
}

/// Download a resource file. Headers are kept so the caller can name it.
///
/// # Errors
///
/// Returns a classified [`ApiError`]; JSON error bodies are decoded.
pub async fn download_resource(client: &ApiClient, resource_id: i64) -> Result<BinaryResponse, ApiError> {
    client.download(&resource_download_endpoint(resource_id)).await
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn delete_resource(client: &ApiClient, resource_id: i64) -> Result<(), ApiError> {
    into_unit(client.delete(&format!("/resource/{resource_id}")).await?)
}

// =============================================================================
// SUBMISSIONS
// =============================================================================

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn submit_homework(
    client: &ApiClient,
    homework_id: i64,
    input: &SubmissionInput,
) -> Result<Submission, ApiError> {
    into_data(client.post(&submit_endpoint(homework_id), input).await?)
}

/// A student's own submissions, with grades once marked.
///
/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn student_submissions(client: &ApiClient, student_id: i64) -> Result<Vec<Submission>, ApiError> {
    into_data(client.get(&format!("/assignments/student/{student_id}/submissions")).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn homework_submissions(client: &ApiClient, homework_id: i64) -> Result<Vec<Submission>, ApiError> {
    into_data(client.get(&format!("/homework-submissions/homework/{homework_id}")).await?)
}

/// # Errors
///
/// Returns an error if the request fails or the backend rejects it.
pub async fn grade_submission(client: &ApiClient, submission_id: i64, input: &GradeInput) -> Result<(), ApiError> {
    into_unit(client.put(&grade_endpoint(submission_id), input).await?)
}
