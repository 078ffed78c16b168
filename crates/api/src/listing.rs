//! List-view loading: filters, tenant scoping, default order, paging.

use thiserror::Error;

use registry_auth::AuthorizationSubject;
use registry_core::ResourceType;
use registry_query::{
    CompareOp, ExecutorError, FilterAllowList, FilterCollection, FilterError, Pager, PagerConfig,
    Query, QueryExecutor, SortDirection,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// One page of rows plus the pager describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub pager: Pager,
}

/// An index request for one resource type, as received from the client.
#[derive(Debug, Clone)]
pub struct ListRequest {
    subject: AuthorizationSubject,
    resource_type: ResourceType,
    path: String,
    query_pairs: Vec<(String, String)>,
    default_order: (String, SortDirection),
    pager_config: PagerConfig,
}

impl ListRequest {
    pub fn new(
        subject: AuthorizationSubject,
        resource_type: ResourceType,
        path: impl Into<String>,
        query_pairs: Vec<(String, String)>,
    ) -> Self {
        Self {
            subject,
            resource_type,
            path: path.into(),
            query_pairs,
            default_order: ("id".to_string(), SortDirection::Asc),
            pager_config: PagerConfig::default(),
        }
    }

    /// Order applied when the client sent no `sort` param.
    pub fn default_order(mut self, column: &str, direction: SortDirection) -> Self {
        self.default_order = (column.to_string(), direction);
        self
    }

    pub fn pager_config(mut self, config: PagerConfig) -> Self {
        self.pager_config = config;
        self
    }

    /// Validate the query string and compile it into a scoped, paged query.
    pub fn compile(&self) -> Result<(Query, Pager), ListError> {
        let allow_list = FilterAllowList::for_resource(self.resource_type);
        FilterCollection::new(allow_list.clone())
            .validate_keys(self.query_pairs.iter().map(|(k, _)| k.as_str()))?;

        let filters = FilterCollection::from_query_pairs(
            allow_list,
            self.query_pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        let mut query = filters.to_query()?;

        if !self.subject.is_elevated() {
            query.and_where("institution_id", CompareOp::Eq, self.subject.institution_id);
            if self.resource_type == ResourceType::Alert {
                query.and_where("user_id", CompareOp::Eq, self.subject.user_id);
            }
        }
        if !filters.has_explicit_sorting() {
            let (column, direction) = &self.default_order;
            query.order_by(column, *direction);
        }

        let pager = Pager::new(&self.path, self.query_pairs.iter().cloned(), self.pager_config)?;
        query
            .offset(i64::try_from(pager.query_offset).unwrap_or(i64::MAX))
            .limit(i64::try_from(pager.per_page).unwrap_or(i64::MAX));
        Ok((query, pager))
    }

    /// Run the list query against `source` and count the full result set.
    pub async fn load<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        source: &str,
    ) -> Result<ListPage<E::Row>, ListError> {
        let (query, mut pager) = self.compile()?;
        let items = query.select(executor, source).await?;
        let total = query.count(executor, source).await?;
        pager.set_counts(total, items.len() as u64);
        tracing::debug!(
            resource_type = %self.resource_type,
            actor_id = %self.subject.user_id,
            where_clause = %query.where_clause(),
            total,
            "loaded resource list"
        );
        Ok(ListPage { items, pager })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_auth::Role;
    use registry_core::{InstitutionId, UserId};
    use registry_query::{Param, RecordingExecutor};
    use serde_json::json;

    fn pairs(p: &[(&str, &str)]) -> Vec<(String, String)> {
        p.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn inst_user() -> AuthorizationSubject {
        AuthorizationSubject::new(UserId::new(7), Role::InstUser, InstitutionId::new(2))
    }

    #[tokio::test]
    async fn scopes_non_admins_to_their_institution() {
        let exec = RecordingExecutor::with_rows(vec![json!({"id": 1}), json!({"id": 2})]);
        exec.set_total(12);
        let req = ListRequest::new(
            inst_user(),
            ResourceType::GenericFile,
            "/files",
            pairs(&[("state", "A"), ("page", "1"), ("per_page", "2")]),
        )
        .default_order("updated_at", SortDirection::Desc);

        let page = req.load(&exec, "generic_files").await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pager.total_items, 12);
        assert_eq!(page.pager.next_link.as_deref(), Some("/files?page=2&per_page=2&state=A"));

        let stmt = &exec.statements()[0];
        assert_eq!(stmt.where_clause, "(state = ?) AND (institution_id = ?)");
        assert_eq!(stmt.params, vec![Param::from("A"), Param::Int(2)]);
        assert_eq!(stmt.order_by, vec!["updated_at desc".to_string()]);
        assert_eq!(stmt.limit, Some(2));
        assert_eq!(stmt.offset, Some(0));
    }

    #[tokio::test]
    async fn alerts_are_also_scoped_to_the_user() {
        let exec = RecordingExecutor::new();
        let req = ListRequest::new(inst_user(), ResourceType::Alert, "/alerts", Vec::new());
        req.load(&exec, "alerts_view").await.unwrap();
        assert_eq!(
            exec.statements()[0].where_clause,
            "(institution_id = ?) AND (user_id = ?)"
        );
    }

    #[test]
    fn sys_admins_are_not_scoped_and_explicit_sort_wins() {
        let admin = AuthorizationSubject::new(UserId::new(1), Role::SysAdmin, InstitutionId::new(1));
        let req = ListRequest::new(
            admin,
            ResourceType::WorkItem,
            "/work_items",
            pairs(&[("sort", "name__desc"), ("institution_id", "3")]),
        )
        .default_order("date_processed", SortDirection::Desc);
        let (query, _) = req.compile().unwrap();
        assert_eq!(query.where_clause(), "(institution_id = ?)");
        let order: Vec<String> = query.get_order_by().iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["name desc"]);
    }

    #[test]
    fn blank_form_fields_are_ignored() {
        let req = ListRequest::new(
            inst_user(),
            ResourceType::GenericFile,
            "/files",
            pairs(&[("institution_id", ""), ("state", ""), ("page", ""), ("per_page", "")]),
        );
        let (query, pager) = req.compile().unwrap();
        assert_eq!(query.where_clause(), "(institution_id = ?)");
        assert_eq!(query.params(), vec![Param::Int(2)]);
        assert_eq!(pager.page, 1);
        assert_eq!(query.get_offset(), Some(0));
    }

    #[test]
    fn out_of_range_pages_are_bad_requests() {
        let req = ListRequest::new(
            inst_user(),
            ResourceType::GenericFile,
            "/files",
            pairs(&[("page", "18446744073709551615")]),
        );
        assert!(matches!(
            req.compile(),
            Err(ListError::Filter(FilterError::InvalidPage(_)))
        ));
    }

    #[test]
    fn unknown_keys_reject_the_request() {
        let req = ListRequest::new(
            inst_user(),
            ResourceType::User,
            "/users",
            pairs(&[("encrypted_password__starts_with", "$2a")]),
        );
        assert_eq!(
            req.compile().unwrap_err(),
            ListError::Filter(FilterError::UnknownParams(vec![
                "encrypted_password__starts_with".into()
            ]))
        );
    }

    #[tokio::test]
    async fn executor_failures_surface_as_list_errors() {
        let exec = RecordingExecutor::new();
        exec.fail_with(ExecutorError::Backend("down".into()));
        let req = ListRequest::new(inst_user(), ResourceType::WorkItem, "/work_items", Vec::new());
        assert!(matches!(
            req.load(&exec, "work_items").await,
            Err(ListError::Executor(ExecutorError::Backend(_)))
        ));
    }
}
