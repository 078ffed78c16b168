//! Raw route inputs handed to the authorization gate.

/// The handler that matched a request and its id parameters, unparsed.
///
/// The HTTP layer fills `id` / `institution_id` from the path, the query
/// string or the form, in that order of preference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteParams {
    handler: String,
    id: Option<String>,
    institution_id: Option<String>,
}

impl RouteParams {
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_institution_id(mut self, institution_id: impl Into<String>) -> Self {
        self.institution_id = Some(institution_id.into());
        self
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// The `id` param, with empty values treated as absent.
    pub fn id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }

    pub fn institution_id(&self) -> Option<&str> {
        non_empty(self.institution_id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
