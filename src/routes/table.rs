//! Static route configuration and path matching.
//!
//! DESIGN
//! ======
//! Records nest like the view tree: a child inherits every ancestor in its
//! `matched` chain, and the guard inspects the whole chain. Relative child
//! paths are appended to the parent's; a leading `/` makes a path absolute.

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;

use std::collections::BTreeMap;

use crate::net::types::Role;

#[derive(Debug, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub requires_auth: bool,
    pub roles: Option<&'static [Role]>,
    pub redirect: Option<&'static str>,
    pub children: &'static [RouteRecord],
}

impl RouteRecord {
    const fn leaf(path: &'static str, name: &'static str, roles: Option<&'static [Role]>) -> Self {
        Self { path, name: Some(name), requires_auth: false, roles, redirect: None, children: &[] }
    }
}

/// The application's navigable views.
pub static ROUTES: &[RouteRecord] = &[
    RouteRecord {
        path: "/login",
        name: Some("Login"),
        requires_auth: false,
        roles: None,
        redirect: None,
        children: &[],
    },
    RouteRecord {
        path: "/",
        name: None,
        requires_auth: true,
        roles: None,
        redirect: Some("/dashboard"),
        children: &[
            RouteRecord::leaf("dashboard", "Dashboard", None),
            RouteRecord::leaf("userManagement", "UserManagement", Some(&[Role::Admin])),
            RouteRecord::leaf("studentManagement", "StudentManagement", Some(&[Role::Teacher])),
            RouteRecord::leaf("courses", "Courses", Some(&[Role::Admin])),
            RouteRecord::leaf("resources", "Resources", Some(&[Role::Admin, Role::Teacher, Role::Student])),
            RouteRecord::leaf("assignments", "Assignments", Some(&[Role::Teacher, Role::Student])),
            RouteRecord::leaf("assignment-submissions/:id", "AssignmentSubmissions", Some(&[Role::Teacher])),
            RouteRecord::leaf("student-assignments", "StudentAssignments", Some(&[Role::Student])),
            RouteRecord::leaf("homework-submission/:id", "HomeworkSubmission", Some(&[Role::Student])),
            RouteRecord::leaf("graded-assignment-detail/:id", "GradedAssignmentDetail", Some(&[Role::Student])),
        ],
    },
];

/// A path resolved against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Normalized path that was matched.
    pub path: String,
    /// Root-first chain of records; the last one is the matched view.
    pub matched: Vec<&'static RouteRecord>,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        self.matched.last().and_then(|r| r.name)
    }

    /// Static redirect declared by the matched record itself.
    #[must_use]
    pub fn redirect(&self) -> Option<&'static str> {
        self.matched.last().and_then(|r| r.redirect)
    }

    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|r| r.requires_auth)
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Normalize a path: drop query and fragment, ensure a leading `/`, collapse
/// empty segments.
#[must_use]
pub fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Resolve `path` against `routes`.
#[must_use]
pub fn resolve(routes: &'static [RouteRecord], path: &str) -> Option<RouteMatch> {
    let path = normalize(path);
    let target: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut chain = Vec::new();
    let params = match_records(routes, &[], &target, &mut chain)?;
    Some(RouteMatch { path, matched: chain, params })
}

fn match_records(
    records: &'static [RouteRecord],
    parent: &[&'static str],
    target: &[&str],
    chain: &mut Vec<&'static RouteRecord>,
) -> Option<BTreeMap<String, String>> {
    for record in records {
        let own = record.path.split('/').filter(|s| !s.is_empty());
        let pattern: Vec<&'static str> = if record.path.starts_with('/') {
            own.collect()
        } else {
            parent.iter().copied().chain(own).collect()
        };

        chain.push(record);
        if let Some(params) = match_records(record.children, &pattern, target, chain) {
            return Some(params);
        }
        if let Some(params) = match_pattern(&pattern, target) {
            return Some(params);
        }
        chain.pop();
    }
    None
}

fn match_pattern(pattern: &[&str], target: &[&str]) -> Option<BTreeMap<String, String>> {
    if pattern.len() != target.len() {
        return None;
    }
    let mut params = BTreeMap::new();
    for (expected, actual) in pattern.iter().zip(target) {
        if let Some(name) = expected.strip_prefix(':') {
            params.insert(name.to_owned(), (*actual).to_owned());
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}
