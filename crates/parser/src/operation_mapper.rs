//! HTTP method and link relation to SQL verb mapping
//!
//! The mapping is a pure function of `(method, rel)`:
//!
//! | method      | rel                                   | verb   |
//! |-------------|---------------------------------------|--------|
//! | GET         | any                                   | SELECT |
//! | POST        | create, instances, self, update,      | INSERT |
//! |             | destroy, delete, list, info           |        |
//! | POST        | anything else (scale, empty, ...)     | EXEC   |
//! | PATCH, PUT  | any                                   | UPDATE |
//! | DELETE      | any                                   | DELETE |
//! | other       | any                                   | EXEC   |
//!
//! Methods are compared case-insensitively. A blank method has no verb.

use hyperschema_stackql_common::SqlVerb;

/// Relations treated as plain CRUD when sent with POST
pub const CRUD_RELS: &[&str] = &[
    "create",
    "instances",
    "self",
    "update",
    "destroy",
    "delete",
    "list",
    "info",
];

/// Classifies links into SQL verbs
pub struct VerbMapper;

impl VerbMapper {
    /// Map a link's HTTP method and relation to a SQL verb
    ///
    /// # Examples
    /// ```
    /// use hyperschema_stackql_parser::VerbMapper;
    /// use hyperschema_stackql_common::SqlVerb;
    ///
    /// assert_eq!(VerbMapper::classify("GET", "instances"), Some(SqlVerb::Select));
    /// assert_eq!(VerbMapper::classify("POST", "create"), Some(SqlVerb::Insert));
    /// assert_eq!(VerbMapper::classify("POST", "scale"), Some(SqlVerb::Exec));
    /// ```
    pub fn classify(method: &str, rel: &str) -> Option<SqlVerb> {
        let method = method.trim().to_uppercase();
        if method.is_empty() {
            return None;
        }

        let verb = match method.as_str() {
            "GET" => SqlVerb::Select,
            "POST" if Self::is_crud_rel(rel) => SqlVerb::Insert,
            "POST" => SqlVerb::Exec,
            "PATCH" | "PUT" => SqlVerb::Update,
            "DELETE" => SqlVerb::Delete,
            _ => SqlVerb::Exec,
        };

        Some(verb)
    }

    /// Whether a relation name is one of the standard CRUD relations
    pub fn is_crud_rel(rel: &str) -> bool {
        let lower = rel.trim().to_lowercase();
        CRUD_RELS.contains(&lower.as_str())
    }

    /// Whether the method carries a request body
    pub fn has_body(method: &str) -> bool {
        matches!(
            method.trim().to_uppercase().as_str(),
            "POST" | "PATCH" | "PUT"
        )
    }
}
