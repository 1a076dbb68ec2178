//! Listing service: filtered reads, relation expansion, and validated
//! writes over every entity kind.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;

use propdesk_domain::error::{NotFoundError, PropdeskError};
use propdesk_domain::expansion::Expansion;
use propdesk_domain::id::{CorrelationId, ListingId};
use propdesk_domain::listing::Listing;
use propdesk_domain::query::{ListRequest, Page};
use propdesk_domain::schema::EntityKind;
use propdesk_domain::time::now;
use propdesk_domain::value::Fields;

use crate::ports::ListingRepository;

/// Largest page a caller can get, whatever `limit` they ask for.
pub const DEFAULT_MAX_LIMIT: u32 = 100;

/// Application service for listing reads and writes.
///
/// Stateless apart from the injected repository; share it behind an `Arc`.
/// Storage failures are logged here with a fresh [`CorrelationId`] and
/// surface to callers only as [`PropdeskError::Backend`].
pub struct ListingService<R> {
    repo: R,
    max_limit: u32,
}

type ExpandFuture<'a> = Pin<Box<dyn Future<Output = Result<(), PropdeskError>> + Send + 'a>>;

impl<R: ListingRepository + Sync> ListingService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }

    /// Override the page size ceiling. Zero is treated as one.
    #[must_use]
    pub fn with_max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    /// List one page of `kind` matching every filter of `request`.
    ///
    /// # Errors
    ///
    /// Returns [`PropdeskError::Validation`] for a bad filter, sort,
    /// expansion, or page window, and [`PropdeskError::Backend`] when the
    /// repository fails.
    pub async fn list(
        &self,
        kind: EntityKind,
        request: &ListRequest,
    ) -> Result<Page<Listing>, PropdeskError> {
        let plan = Expansion::parse_all(kind, request.expand.as_slice())?;
        let query = request.resolve(kind.schema(), self.max_limit)?;

        let mut page = self
            .repo
            .find_many(kind, &query)
            .await
            .map_err(|err| conceal(err, kind, "list", None))?;
        self.expand(&mut page.items, &plan)
            .await
            .map_err(|err| conceal(err, kind, "expand", None))?;

        tracing::debug!(
            %kind,
            total = page.total,
            returned = page.items.len(),
            limit = page.limit,
            offset = page.offset,
            "listed"
        );
        Ok(page)
    }

    /// Look up a listing by id, resolving the requested relations.
    ///
    /// # Errors
    ///
    /// Returns [`PropdeskError::NotFound`] when no listing of `kind` with
    /// `id` exists, [`PropdeskError::Validation`] for an unknown expansion,
    /// or [`PropdeskError::Backend`].
    pub async fn get<S: AsRef<str>>(
        &self,
        kind: EntityKind,
        id: ListingId,
        expand: &[S],
    ) -> Result<Listing, PropdeskError> {
        let plan = Expansion::parse_all(kind, expand)?;
        let listing = self.fetch(kind, id, "get").await?;

        let mut items = [listing];
        self.expand(&mut items, &plan)
            .await
            .map_err(|err| conceal(err, kind, "expand", Some(id)))?;
        let [listing] = items;
        Ok(listing)
    }

    /// Validate and store a new listing.
    ///
    /// # Errors
    ///
    /// Returns [`PropdeskError::Validation`] if the fields break the schema,
    /// or [`PropdeskError::Backend`].
    pub async fn create(&self, kind: EntityKind, fields: Fields) -> Result<Listing, PropdeskError> {
        let listing = Listing::draft(kind, fields, now())?;
        let id = listing.id;
        let created = self
            .repo
            .create(listing)
            .await
            .map_err(|err| conceal(err, kind, "create", Some(id)))?;

        tracing::info!(%kind, %id, "listing created");
        Ok(created)
    }

    /// Merge `patch` over an existing listing and store the result.
    ///
    /// # Errors
    ///
    /// Returns [`PropdeskError::NotFound`] if the listing does not exist (or
    /// disappears before the write), [`PropdeskError::Validation`] if the
    /// patch breaks the schema, or [`PropdeskError::Backend`].
    pub async fn update(
        &self,
        kind: EntityKind,
        id: ListingId,
        patch: Fields,
    ) -> Result<Listing, PropdeskError> {
        let mut listing = self.fetch(kind, id, "update").await?;
        listing.apply_patch(patch, now())?;

        let updated = self
            .repo
            .update(listing)
            .await
            .map_err(|err| conceal(err, kind, "update", Some(id)))?
            .ok_or_else(|| not_found(kind, id))?;

        tracing::info!(%kind, %id, "listing updated");
        Ok(updated)
    }

    /// Hard-delete a listing.
    ///
    /// # Errors
    ///
    /// Returns [`PropdeskError::NotFound`] when nothing was deleted, or
    /// [`PropdeskError::Backend`].
    pub async fn delete(&self, kind: EntityKind, id: ListingId) -> Result<(), PropdeskError> {
        let removed = self
            .repo
            .delete(kind, id)
            .await
            .map_err(|err| conceal(err, kind, "delete", Some(id)))?;
        if !removed {
            return Err(not_found(kind, id));
        }

        tracing::info!(%kind, %id, "listing deleted");
        Ok(())
    }

    async fn fetch(
        &self,
        kind: EntityKind,
        id: ListingId,
        operation: &'static str,
    ) -> Result<Listing, PropdeskError> {
        self.repo
            .get_by_id(kind, id)
            .await
            .map_err(|err| conceal(err, kind, operation, Some(id)))?
            .ok_or_else(|| not_found(kind, id))
    }

    /// Resolve `plan` onto `items`, one batched lookup per relation and level.
    fn expand<'a>(&'a self, items: &'a mut [Listing], plan: &'a [Expansion]) -> ExpandFuture<'a> {
        Box::pin(async move {
            for node in plan {
                let relation = node.relation;
                let ids: BTreeSet<ListingId> = items
                    .iter()
                    .filter_map(|item| item.reference(relation.field))
                    .collect();

                let mut related = if ids.is_empty() {
                    Vec::new()
                } else {
                    self.repo
                        .find_by_ids(relation.target, ids.into_iter().collect())
                        .await?
                };
                self.expand(&mut related, &node.nested).await?;

                let by_id: HashMap<ListingId, Listing> = related
                    .into_iter()
                    .map(|listing| (listing.id, listing))
                    .collect();
                for item in items.iter_mut() {
                    let resolved = item
                        .reference(relation.field)
                        .and_then(|id| by_id.get(&id).cloned())
                        .map(Box::new);
                    item.expanded.insert(relation.name.to_string(), resolved);
                }
            }
            Ok(())
        })
    }
}

fn not_found(kind: EntityKind, id: ListingId) -> PropdeskError {
    NotFoundError {
        kind,
        id: id.to_string(),
    }
    .into()
}

/// Log a raw storage failure and replace it with an opaque one.
fn conceal(
    err: PropdeskError,
    kind: EntityKind,
    operation: &'static str,
    id: Option<ListingId>,
) -> PropdeskError {
    match err {
        PropdeskError::Storage(source) => {
            let correlation_id = CorrelationId::new();
            tracing::error!(
                %correlation_id,
                %kind,
                operation,
                id = ?id,
                error = %source,
                "backend failure"
            );
            PropdeskError::Backend(correlation_id)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propdesk_domain::error::ValidationError;
    use propdesk_domain::query::{Direction, Filter, ListQuery, Sort};
    use propdesk_domain::value::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryListingRepo {
        store: Mutex<HashMap<ListingId, Listing>>,
    }

    impl ListingRepository for InMemoryListingRepo {
        fn create(
            &self,
            listing: Listing,
        ) -> impl Future<Output = Result<Listing, PropdeskError>> + Send {
            let mut store = self.store.lock().unwrap();
            store.insert(listing.id, listing.clone());
            async move { Ok(listing) }
        }

        fn get_by_id(
            &self,
            kind: EntityKind,
            id: ListingId,
        ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send {
            let store = self.store.lock().unwrap();
            let result = store.get(&id).filter(|l| l.kind == kind).cloned();
            async move { Ok(result) }
        }

        fn find_by_ids(
            &self,
            kind: EntityKind,
            ids: Vec<ListingId>,
        ) -> impl Future<Output = Result<Vec<Listing>, PropdeskError>> + Send {
            let store = self.store.lock().unwrap();
            let result: Vec<Listing> = ids
                .iter()
                .filter_map(|id| store.get(id))
                .filter(|l| l.kind == kind)
                .cloned()
                .collect();
            async move { Ok(result) }
        }

        fn find_many(
            &self,
            kind: EntityKind,
            query: &ListQuery,
        ) -> impl Future<Output = Result<Page<Listing>, PropdeskError>> + Send {
            let store = self.store.lock().unwrap();
            let mut matching: Vec<Listing> = store
                .values()
                .filter(|l| l.kind == kind && query.matches(l))
                .cloned()
                .collect();
            matching.sort_by(|a, b| query.sort.compare(a, b));
            let page = Page {
                total: matching.len() as u64,
                items: matching
                    .into_iter()
                    .skip(query.window.offset as usize)
                    .take(query.window.limit as usize)
                    .collect(),
                limit: query.window.limit,
                offset: query.window.offset,
            };
            async move { Ok(page) }
        }

        fn update(
            &self,
            listing: Listing,
        ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send {
            let mut store = self.store.lock().unwrap();
            let result = store.get_mut(&listing.id).map(|slot| {
                slot.fields = listing.fields.clone();
                slot.updated_at = listing.updated_at;
                listing
            });
            async move { Ok(result) }
        }

        fn delete(
            &self,
            kind: EntityKind,
            id: ListingId,
        ) -> impl Future<Output = Result<bool, PropdeskError>> + Send {
            let mut store = self.store.lock().unwrap();
            let removed = match store.get(&id) {
                Some(listing) if listing.kind == kind => store.remove(&id).is_some(),
                _ => false,
            };
            async move { Ok(removed) }
        }
    }

    struct BrokenRepo;

    fn broken() -> PropdeskError {
        PropdeskError::Storage(Box::new(std::io::Error::other(
            "relation \"listings\" does not exist",
        )))
    }

    impl ListingRepository for BrokenRepo {
        async fn create(&self, _listing: Listing) -> Result<Listing, PropdeskError> {
            Err(broken())
        }
        async fn get_by_id(
            &self,
            _kind: EntityKind,
            _id: ListingId,
        ) -> Result<Option<Listing>, PropdeskError> {
            Err(broken())
        }
        async fn find_by_ids(
            &self,
            _kind: EntityKind,
            _ids: Vec<ListingId>,
        ) -> Result<Vec<Listing>, PropdeskError> {
            Err(broken())
        }
        async fn find_many(
            &self,
            _kind: EntityKind,
            _query: &ListQuery,
        ) -> Result<Page<Listing>, PropdeskError> {
            Err(broken())
        }
        async fn update(&self, _listing: Listing) -> Result<Option<Listing>, PropdeskError> {
            Err(broken())
        }
        async fn delete(&self, _kind: EntityKind, _id: ListingId) -> Result<bool, PropdeskError> {
            Err(broken())
        }
    }

    fn make_service() -> ListingService<InMemoryListingRepo> {
        ListingService::new(InMemoryListingRepo::default())
    }

    fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    async fn create_agent(svc: &ListingService<InMemoryListingRepo>) -> Listing {
        svc.create(
            EntityKind::Agent,
            fields([
                ("name", Value::from("Sara Haddad")),
                ("email", Value::from("sara@example.com")),
            ]),
        )
        .await
        .unwrap()
    }

    async fn create_property(
        svc: &ListingService<InMemoryListingRepo>,
        agent: ListingId,
        title: &str,
        price: i64,
    ) -> Listing {
        svc.create(
            EntityKind::Property,
            fields([
                ("title", Value::from(title)),
                ("price", Value::Int(price)),
                ("agent_id", Value::from(agent)),
            ]),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn should_return_only_properties_above_min_price() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        create_property(&svc, agent, "Studio", 1_000_000).await;
        let two = create_property(&svc, agent, "Townhouse", 2_000_000).await;
        let three = create_property(&svc, agent, "Villa", 3_000_000).await;

        let request =
            ListRequest::from_params(EntityKind::Property.schema(), [("minPrice", "1500000")])
                .unwrap();
        let page = svc.list(EntityKind::Property, &request).await.unwrap();

        assert_eq!(page.total, 2);
        let mut ids: Vec<ListingId> = page.items.iter().map(|l| l.id).collect();
        ids.sort();
        let mut expected = vec![two.id, three.id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn should_only_return_listings_matching_every_filter() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let other_agent = create_agent(&svc).await.id;
        let target = create_property(&svc, agent, "Marina Loft", 2_000_000).await;
        create_property(&svc, other_agent, "Marina View", 2_000_000).await;
        create_property(&svc, agent, "Desert Home", 2_000_000).await;

        let request = ListRequest::default()
            .filter("title", Filter::Like("marina".to_string()))
            .filter("agent_id", Filter::Eq(Value::from(agent)));
        let page = svc.list(EntityKind::Property, &request).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, target.id);
    }

    #[tokio::test]
    async fn should_return_empty_items_with_total_when_offset_past_end() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        for price in [1, 2, 3] {
            create_property(&svc, agent, "Flat", price).await;
        }

        for offset in [3, 4, 1000] {
            let request = ListRequest::default().offset(offset).limit(10);
            let page = svc.list(EntityKind::Property, &request).await.unwrap();
            assert!(page.items.is_empty());
            assert_eq!(page.total, 3);
            assert_eq!(page.offset, offset);
        }
    }

    #[tokio::test]
    async fn should_page_without_repeats_or_gaps_when_sort_key_ties() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let mut all = Vec::new();
        for _ in 0..5 {
            all.push(create_property(&svc, agent, "Same Price", 1_000_000).await.id);
        }

        let mut seen = Vec::new();
        for offset in [0, 2, 4] {
            let request = ListRequest::default()
                .sort(Sort::by_field("price", Direction::Asc))
                .limit(2)
                .offset(offset);
            let page = svc.list(EntityKind::Property, &request).await.unwrap();
            assert_eq!(page.total, 5);
            seen.extend(page.items.iter().map(|l| l.id));
        }

        assert_eq!(seen.len(), 5);
        all.sort();
        let mut sorted_seen = seen.clone();
        sorted_seen.sort();
        assert_eq!(sorted_seen, all);
        assert_eq!(seen, all, "ties must be broken by ascending id");
    }

    #[tokio::test]
    async fn should_clamp_limit_to_ceiling() {
        let svc = make_service().with_max_limit(2);
        let agent = create_agent(&svc).await.id;
        for price in [1, 2, 3] {
            create_property(&svc, agent, "Flat", price).await;
        }

        let request = ListRequest::default().limit(500);
        let page = svc.list(EntityKind::Property, &request).await.unwrap();
        assert_eq!(page.limit, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn should_roundtrip_create_and_get() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let created = create_property(&svc, agent, "Modern Villa!!  By the Sea", 2_500_000).await;

        let fetched = svc
            .get(EntityKind::Property, created.id, &[] as &[&str])
            .await
            .unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.field("title"), Some(&Value::from("Modern Villa!!  By the Sea")));
        assert_eq!(fetched.field("price"), Some(&Value::Int(2_500_000)));
        assert_eq!(
            fetched.field("slug"),
            Some(&Value::from("modern-villa-by-the-sea"))
        );
    }

    #[tokio::test]
    async fn should_return_identical_results_for_repeated_get() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let created = create_property(&svc, agent, "Penthouse", 9_000_000).await;

        let first = svc.get(EntityKind::Property, created.id, &["agent"]).await.unwrap();
        let second = svc.get(EntityKind::Property, created.id, &["agent"]).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn should_return_not_found_when_kind_differs() {
        let svc = make_service();
        let agent = create_agent(&svc).await;

        let result = svc
            .get(EntityKind::Property, agent.id, &[] as &[&str])
            .await;
        assert!(matches!(result, Err(PropdeskError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_reject_create_when_required_field_missing() {
        let svc = make_service();
        let result = svc
            .create(
                EntityKind::Property,
                fields([("title", Value::from("No Price"))]),
            )
            .await;
        assert!(matches!(
            result,
            Err(PropdeskError::Validation(ValidationError::MissingField { .. }))
        ));
    }

    #[tokio::test]
    async fn should_reject_create_when_price_is_not_numeric() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let result = svc
            .create(
                EntityKind::Property,
                fields([
                    ("title", Value::from("Villa")),
                    ("price", Value::from("call us")),
                    ("agent_id", Value::from(agent)),
                ]),
            )
            .await;
        assert!(matches!(
            result,
            Err(PropdeskError::Validation(ValidationError::InvalidValue { .. }))
        ));
    }

    #[tokio::test]
    async fn should_only_bump_updated_at_on_empty_update() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let created = create_property(&svc, agent, "Duplex", 4_000_000).await;

        let updated = svc
            .update(EntityKind::Property, created.id, Fields::new())
            .await
            .unwrap();

        assert_eq!(updated.fields, created.fields);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn should_merge_partial_update() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let created = create_property(&svc, agent, "Duplex", 4_000_000).await;

        let updated = svc
            .update(
                EntityKind::Property,
                created.id,
                fields([("status", Value::from("sold"))]),
            )
            .await
            .unwrap();

        assert_eq!(updated.field("status"), Some(&Value::from("sold")));
        assert_eq!(updated.field("price"), created.field("price"));
        let fetched = svc
            .get(EntityKind::Property, created.id, &[] as &[&str])
            .await
            .unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn should_reject_unknown_field_on_update() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let created = create_property(&svc, agent, "Duplex", 4_000_000).await;

        let result = svc
            .update(
                EntityKind::Property,
                created.id,
                fields([("owner_notes", Value::from("private"))]),
            )
            .await;
        assert!(matches!(
            result,
            Err(PropdeskError::Validation(ValidationError::UnknownField { .. }))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_listing() {
        let svc = make_service();
        let result = svc
            .update(EntityKind::Property, ListingId::new(), Fields::new())
            .await;
        assert!(matches!(result, Err(PropdeskError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_delete_and_then_report_not_found() {
        let svc = make_service();
        let agent = create_agent(&svc).await.id;
        let created = create_property(&svc, agent, "Duplex", 4_000_000).await;

        svc.delete(EntityKind::Property, created.id).await.unwrap();

        let result = svc
            .get(EntityKind::Property, created.id, &[] as &[&str])
            .await;
        assert!(matches!(result, Err(PropdeskError::NotFound(_))));
        let result = svc.delete(EntityKind::Property, created.id).await;
        assert!(matches!(result, Err(PropdeskError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_expand_agent_and_nested_profile() {
        let svc = make_service();
        let profile = svc
            .create(
                EntityKind::Profile,
                fields([
                    ("full_name", Value::from("Sara Haddad")),
                    ("email", Value::from("sara@example.com")),
                ]),
            )
            .await
            .unwrap();
        let agent = svc
            .create(
                EntityKind::Agent,
                fields([
                    ("name", Value::from("Sara Haddad")),
                    ("email", Value::from("sara@example.com")),
                    ("profile_id", Value::from(profile.id)),
                ]),
            )
            .await
            .unwrap();
        create_property(&svc, agent.id, "Canal View", 3_000_000).await;

        let request = ListRequest::default().expand("agent.profile");
        let page = svc.list(EntityKind::Property, &request).await.unwrap();

        let expanded_agent = page.items[0].expanded["agent"].as_ref().unwrap();
        assert_eq!(expanded_agent.id, agent.id);
        let expanded_profile = expanded_agent.expanded["profile"].as_ref().unwrap();
        assert_eq!(expanded_profile.id, profile.id);
    }

    #[tokio::test]
    async fn should_expand_dangling_reference_to_none() {
        let svc = make_service();
        let created = create_property(&svc, ListingId::new(), "Orphan", 1).await;

        let fetched = svc
            .get(EntityKind::Property, created.id, &["agent"])
            .await
            .unwrap();
        assert_eq!(fetched.expanded.get("agent"), Some(&None));
    }

    #[tokio::test]
    async fn should_reject_unknown_expansion() {
        let svc = make_service();
        let request = ListRequest::default().expand("owner");
        let result = svc.list(EntityKind::Property, &request).await;
        assert!(matches!(
            result,
            Err(PropdeskError::Validation(ValidationError::UnknownExpansion { .. }))
        ));
    }

    #[tokio::test]
    async fn should_conceal_storage_errors_behind_correlation_id() {
        let svc = ListingService::new(BrokenRepo);

        let result = svc.list(EntityKind::Property, &ListRequest::default()).await;
        let Err(PropdeskError::Backend(correlation_id)) = result else {
            panic!("expected backend error");
        };
        let message = PropdeskError::Backend(correlation_id).to_string();
        assert!(!message.contains("listings"));

        let result = svc.delete(EntityKind::Property, ListingId::new()).await;
        assert!(matches!(result, Err(PropdeskError::Backend(_))));
    }

    #[tokio::test]
    async fn should_validate_before_touching_storage() {
        let svc = ListingService::new(BrokenRepo);
        let request = ListRequest::default().limit(0);
        let result = svc.list(EntityKind::Property, &request).await;
        assert!(matches!(
            result,
            Err(PropdeskError::Validation(ValidationError::ZeroLimit))
        ));
    }
}
